use crate::error::QueryError;
use crate::mapping::Mapping;
use kgram_logical::{PatternNode, Query};
use kgram_model::{Node, Variable};
use std::ops::{Deref, DerefMut};

/// The evaluation context of an expression.
///
/// Besides the bindings of the query variables, an environment holds a stack of local bindings
/// that shadow the query variables (e.g., `LET` variables and function parameters). Local
/// bindings are strictly paired: every [Environment::set] is undone by an [Environment::unset]
/// of the same variable. Use a [LocalScope] to enforce this.
pub trait Environment {
    /// The query that is evaluated.
    fn query(&self) -> &Query;

    /// Returns the value of `variable`. Local bindings shadow the query bindings.
    fn get(&self, variable: &Variable) -> Option<&Node>;

    /// The pattern node of the enclosing `GRAPH` clause.
    fn graph_node(&self) -> Option<&PatternNode>;

    /// Pushes a local binding.
    fn set(&mut self, variable: &Variable, value: Node);

    /// Pops the latest local binding of `variable`.
    fn unset(&mut self, variable: &Variable);

    /// The local bindings, the oldest first.
    fn locals(&self) -> &[(Variable, Node)];

    /// The solutions of the group while evaluating aggregates.
    fn group(&self) -> Option<&[Mapping]> {
        None
    }

    /// A snapshot of the query bindings, without local bindings.
    fn to_mapping(&self) -> Mapping;
}

fn local<'a>(locals: &'a [(Variable, Node)], variable: &Variable) -> Option<&'a Node> {
    locals
        .iter()
        .rev()
        .find(|(local, _)| local == variable)
        .map(|(_, value)| value)
}

fn pop_local(locals: &mut Vec<(Variable, Node)>, variable: &Variable) {
    if let Some(index) = locals.iter().rposition(|(local, _)| local == variable) {
        locals.remove(index);
    }
}

/// The outcome of binding a query variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// The variable was unbound and is now bound.
    New,
    /// The variable already had an equal value.
    Existing,
    /// The variable already had a different value.
    Conflict,
}

/// The mutable state of the join engine.
#[derive(Debug)]
pub struct Memory<'query> {
    query: &'query Query,
    nodes: Vec<Option<Node>>,
    locals: Vec<(Variable, Node)>,
    graph_node: Option<PatternNode>,
}

impl<'query> Memory<'query> {
    pub fn new(query: &'query Query) -> Self {
        Self {
            query,
            nodes: vec![None; query.variables().len()],
            locals: Vec::new(),
            graph_node: None,
        }
    }

    /// Restores a snapshot taken with [Environment::to_mapping] and [Environment::locals].
    pub fn from_snapshot(
        query: &'query Query,
        mapping: &Mapping,
        locals: Vec<(Variable, Node)>,
        graph_node: Option<PatternNode>,
    ) -> Self {
        let mut nodes = mapping.nodes().to_vec();
        nodes.resize(query.variables().len(), None);
        Self {
            query,
            nodes,
            locals,
            graph_node,
        }
    }

    /// Binds a query variable unless it is bound to a different value.
    pub fn bind(&mut self, variable: &Variable, value: &Node) -> Result<Binding, QueryError> {
        let slot = self.slot(variable)?;
        Ok(match &self.nodes[slot] {
            None => {
                self.nodes[slot] = Some(value.clone());
                Binding::New
            }
            Some(current) if current == value => Binding::Existing,
            Some(_) => Binding::Conflict,
        })
    }

    /// Unbinds query variables bound by [Memory::bind].
    pub fn unbind(&mut self, variables: &[Variable]) {
        for variable in variables {
            if let Some(slot) = self.query.slot(variable) {
                self.nodes[slot] = None;
            }
        }
    }

    /// Returns the value of a query variable, ignoring local bindings.
    pub fn binding(&self, variable: &Variable) -> Option<&Node> {
        self.nodes[self.query.slot(variable)?].as_ref()
    }

    /// Replaces the pattern node of the enclosing `GRAPH` clause, returning the previous one.
    pub fn replace_graph_node(&mut self, graph_node: Option<PatternNode>) -> Option<PatternNode> {
        std::mem::replace(&mut self.graph_node, graph_node)
    }

    fn slot(&self, variable: &Variable) -> Result<usize, QueryError> {
        self.query
            .slot(variable)
            .ok_or_else(|| QueryError::UnknownVariable(variable.clone()))
    }
}

impl Environment for Memory<'_> {
    fn query(&self) -> &Query {
        self.query
    }

    fn get(&self, variable: &Variable) -> Option<&Node> {
        local(&self.locals, variable).or_else(|| self.binding(variable))
    }

    fn graph_node(&self) -> Option<&PatternNode> {
        self.graph_node.as_ref()
    }

    fn set(&mut self, variable: &Variable, value: Node) {
        self.locals.push((variable.clone(), value));
    }

    fn unset(&mut self, variable: &Variable) {
        pop_local(&mut self.locals, variable);
    }

    fn locals(&self) -> &[(Variable, Node)] {
        &self.locals
    }

    fn to_mapping(&self) -> Mapping {
        Mapping::new(self.nodes.clone())
    }
}

/// A read-only environment over a finished solution, optionally with the group it represents.
#[derive(Debug)]
pub struct MappingEnvironment<'a> {
    query: &'a Query,
    mapping: &'a Mapping,
    locals: Vec<(Variable, Node)>,
    group: Option<&'a [Mapping]>,
}

impl<'a> MappingEnvironment<'a> {
    pub fn new(query: &'a Query, mapping: &'a Mapping) -> Self {
        Self {
            query,
            mapping,
            locals: Vec::new(),
            group: None,
        }
    }

    /// An environment in which aggregates are computed over `group`.
    pub fn grouped(query: &'a Query, mapping: &'a Mapping, group: &'a [Mapping]) -> Self {
        Self {
            group: Some(group),
            ..Self::new(query, mapping)
        }
    }
}

impl Environment for MappingEnvironment<'_> {
    fn query(&self) -> &Query {
        self.query
    }

    fn get(&self, variable: &Variable) -> Option<&Node> {
        local(&self.locals, variable)
            .or_else(|| self.mapping.get(self.query.slot(variable)?))
    }

    fn graph_node(&self) -> Option<&PatternNode> {
        None
    }

    fn set(&mut self, variable: &Variable, value: Node) {
        self.locals.push((variable.clone(), value));
    }

    fn unset(&mut self, variable: &Variable) {
        pop_local(&mut self.locals, variable);
    }

    fn locals(&self) -> &[(Variable, Node)] {
        &self.locals
    }

    fn group(&self) -> Option<&[Mapping]> {
        self.group
    }

    fn to_mapping(&self) -> Mapping {
        self.mapping.clone()
    }
}

/// Binds local variables for the lifetime of the guard.
///
/// Dropping the guard unsets the bindings in reverse order, also on early returns.
pub struct LocalScope<'env> {
    env: &'env mut dyn Environment,
    bound: Vec<Variable>,
}

impl<'env> LocalScope<'env> {
    pub fn new(env: &'env mut dyn Environment) -> Self {
        Self {
            env,
            bound: Vec::new(),
        }
    }

    pub fn bind(&mut self, variable: &Variable, value: Node) {
        self.env.set(variable, value);
        self.bound.push(variable.clone());
    }
}

impl<'env> Deref for LocalScope<'env> {
    type Target = dyn Environment + 'env;

    fn deref(&self) -> &Self::Target {
        &*self.env
    }
}

impl DerefMut for LocalScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.env
    }
}

impl Drop for LocalScope<'_> {
    fn drop(&mut self) {
        for variable in self.bound.iter().rev() {
            self.env.unset(variable);
        }
    }
}
