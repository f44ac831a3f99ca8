use kgram_logical::{ExtensionTable, FunctionDefinition};
use kgram_model::{NamedNode, Term};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A reference-counted pointer to an [ExtensionRegistry].
pub type ExtensionRegistryRef = Arc<ExtensionRegistry>;

/// Resolves calls of extension functions to their definition.
///
/// A provider may choose a definition based on the evaluated arguments of the call, e.g., to
/// support overloading by arity.
pub trait ExtensionProvider: Debug + Send + Sync {
    /// Returns the definition that handles a call of `name` with `args`.
    fn definition(&self, name: &NamedNode, args: &[Term]) -> Option<Arc<FunctionDefinition>>;
}

impl ExtensionProvider for ExtensionTable {
    fn definition(&self, name: &NamedNode, args: &[Term]) -> Option<Arc<FunctionDefinition>> {
        self.get(name)
            .filter(|definition| definition.arity() == args.len())
            .map(Arc::clone)
    }
}

impl ExtensionProvider for Arc<FunctionDefinition> {
    fn definition(&self, name: &NamedNode, args: &[Term]) -> Option<Arc<FunctionDefinition>> {
        (self.name() == name && self.arity() == args.len()).then(|| Arc::clone(self))
    }
}

/// The extension functions that are available to every query.
///
/// The registry is built once and is immutable afterwards. Use [ExtensionRegistry::builder] to
/// create one.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    providers: FxHashMap<NamedNode, Arc<dyn ExtensionProvider>>,
}

impl ExtensionRegistry {
    pub fn builder() -> ExtensionRegistryBuilder {
        ExtensionRegistryBuilder::default()
    }

    /// Returns the definition of the provider registered for `name`.
    pub fn resolve(&self, name: &NamedNode, args: &[Term]) -> Option<Arc<FunctionDefinition>> {
        self.providers.get(name)?.definition(name, args)
    }

    pub fn contains(&self, name: &NamedNode) -> bool {
        self.providers.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Builds an [ExtensionRegistry].
#[derive(Debug, Default)]
pub struct ExtensionRegistryBuilder {
    providers: FxHashMap<NamedNode, Arc<dyn ExtensionProvider>>,
}

impl ExtensionRegistryBuilder {
    /// Registers `provider` for `name`, replacing a previous registration.
    #[must_use]
    pub fn register(mut self, name: NamedNode, provider: Arc<dyn ExtensionProvider>) -> Self {
        self.providers.insert(name, provider);
        self
    }

    /// Registers a single definition under its own name.
    #[must_use]
    pub fn define(self, definition: FunctionDefinition) -> Self {
        let name = definition.name().clone();
        self.register(name, Arc::new(Arc::new(definition)))
    }

    pub fn build(self) -> ExtensionRegistry {
        ExtensionRegistry {
            providers: self.providers,
        }
    }
}
