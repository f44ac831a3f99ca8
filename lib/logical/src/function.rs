use crate::Expr;
use kgram_model::{NamedNode, Variable};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// The definition of an extension function: its parameters and its body.
///
/// Calling the function binds the arguments to the parameters as local variables while the body
/// is evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDefinition {
    name: NamedNode,
    parameters: Vec<Variable>,
    body: Expr,
}

impl FunctionDefinition {
    pub fn new(name: NamedNode, parameters: Vec<Variable>, body: Expr) -> Self {
        Self {
            name,
            parameters,
            body,
        }
    }

    pub fn name(&self) -> &NamedNode {
        &self.name
    }

    pub fn parameters(&self) -> &[Variable] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }
}

/// The functions defined by a query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtensionTable {
    definitions: FxHashMap<NamedNode, Arc<FunctionDefinition>>,
}

impl ExtensionTable {
    /// Adds a definition, replacing a previous definition with the same name.
    pub fn define(&mut self, definition: FunctionDefinition) {
        self.definitions
            .insert(definition.name().clone(), Arc::new(definition));
    }

    pub fn get(&self, name: &NamedNode) -> Option<&Arc<FunctionDefinition>> {
        self.definitions.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
