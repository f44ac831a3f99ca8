use crate::{ExtensionTable, Expr, FunctionDefinition, GraphPattern, PatternId};
use kgram_model::{Term, Variable};
use rustc_hash::FxHashMap;

/// A computed projection `(expr AS ?variable)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectExpression {
    pub variable: Variable,
    pub expr: Expr,
}

impl SelectExpression {
    pub fn is_aggregate(&self) -> bool {
        self.expr.is_aggregate()
    }
}

/// A key of an `ORDER BY` clause.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderKey {
    pub expr: Expr,
    pub descending: bool,
}

impl OrderKey {
    pub fn ascending(expr: Expr) -> Self {
        Self {
            expr,
            descending: false,
        }
    }

    pub fn descending(expr: Expr) -> Self {
        Self {
            expr,
            descending: true,
        }
    }
}

/// Returns the variable if the key is a plain variable.
pub fn key_variable(expr: &Expr) -> Option<&Variable> {
    match expr {
        Expr::Variable(variable) => Some(variable),
        _ => None,
    }
}

/// A query ready for evaluation.
///
/// All variables of the query are declared in order of their first appearance and each variable
/// owns a slot. Solutions store their bindings in this order.
#[derive(Clone, Debug)]
pub struct Query {
    variables: Vec<Variable>,
    slots: FxHashMap<Variable, usize>,
    body: GraphPattern,
    projection: Vec<Variable>,
    select_expressions: Vec<SelectExpression>,
    group_by: Vec<Expr>,
    having: Vec<Expr>,
    order_by: Vec<OrderKey>,
    distinct: bool,
    offset: usize,
    limit: Option<usize>,
    from: Vec<Term>,
    from_named: Vec<Term>,
    patterns: Vec<GraphPattern>,
    functions: ExtensionTable,
}

impl Query {
    pub fn builder(body: GraphPattern) -> QueryBuilder {
        QueryBuilder::new(body)
    }

    /// All variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The slot of a variable.
    pub fn slot(&self, variable: &Variable) -> Option<usize> {
        self.slots.get(variable).copied()
    }

    pub fn body(&self) -> &GraphPattern {
        &self.body
    }

    /// The projected variables.
    pub fn projection(&self) -> &[Variable] {
        &self.projection
    }

    pub fn select_expressions(&self) -> &[SelectExpression] {
        &self.select_expressions
    }

    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn having(&self) -> &[Expr] {
        &self.having
    }

    pub fn order_by(&self) -> &[OrderKey] {
        &self.order_by
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The graphs of a `FROM` clause.
    pub fn from(&self) -> &[Term] {
        &self.from
    }

    /// The graphs of a `FROM NAMED` clause.
    pub fn from_named(&self) -> &[Term] {
        &self.from_named
    }

    /// Returns a registered sub-pattern.
    pub fn pattern(&self, id: PatternId) -> Option<&GraphPattern> {
        self.patterns.get(id.index())
    }

    /// The functions defined by this query.
    pub fn functions(&self) -> &ExtensionTable {
        &self.functions
    }

    /// Returns whether the solutions of the query are grouped.
    pub fn is_aggregate(&self) -> bool {
        !self.group_by.is_empty()
            || !self.having.is_empty()
            || self
                .select_expressions
                .iter()
                .any(SelectExpression::is_aggregate)
            || self.order_by.iter().any(|key| key.expr.is_aggregate())
    }
}

/// Builds a [Query] and declares its variables.
#[derive(Debug)]
pub struct QueryBuilder {
    body: GraphPattern,
    projection: Option<Vec<Variable>>,
    select_expressions: Vec<SelectExpression>,
    group_by: Vec<Expr>,
    having: Vec<Expr>,
    order_by: Vec<OrderKey>,
    distinct: bool,
    offset: usize,
    limit: Option<usize>,
    from: Vec<Term>,
    from_named: Vec<Term>,
    patterns: Vec<GraphPattern>,
    functions: ExtensionTable,
}

impl QueryBuilder {
    fn new(body: GraphPattern) -> Self {
        Self {
            body,
            projection: None,
            select_expressions: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            distinct: false,
            offset: 0,
            limit: None,
            from: Vec::new(),
            from_named: Vec::new(),
            patterns: Vec::new(),
            functions: ExtensionTable::default(),
        }
    }

    /// Replaces the body of the query.
    #[must_use]
    pub fn body(mut self, body: GraphPattern) -> Self {
        self.body = body;
        self
    }

    /// Sets the projected variables. Without a projection, all variables are projected.
    #[must_use]
    pub fn project(mut self, variables: Vec<Variable>) -> Self {
        self.projection = Some(variables);
        self
    }

    #[must_use]
    pub fn select_expression(mut self, variable: Variable, expr: Expr) -> Self {
        self.select_expressions
            .push(SelectExpression { variable, expr });
        self
    }

    #[must_use]
    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    #[must_use]
    pub fn having(mut self, expr: Expr) -> Self {
        self.having.push(expr);
        self
    }

    #[must_use]
    pub fn order_by(mut self, key: OrderKey) -> Self {
        self.order_by.push(key);
        self
    }

    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn from(mut self, graphs: Vec<Term>) -> Self {
        self.from = graphs;
        self
    }

    #[must_use]
    pub fn from_named(mut self, graphs: Vec<Term>) -> Self {
        self.from_named = graphs;
        self
    }

    #[must_use]
    pub fn define_function(mut self, definition: FunctionDefinition) -> Self {
        self.functions.define(definition);
        self
    }

    /// Registers a sub-pattern and returns its id.
    pub fn register_pattern(&mut self, pattern: GraphPattern) -> PatternId {
        self.patterns.push(pattern);
        PatternId::new(self.patterns.len() - 1)
    }

    pub fn build(self) -> Query {
        let mut variables = Vec::new();
        let mut slots = FxHashMap::default();
        let mut declare = |variable: &Variable| {
            if !slots.contains_key(variable) {
                slots.insert(variable.clone(), variables.len());
                variables.push(variable.clone());
            }
        };

        self.body.for_each_variable(&mut declare);
        for pattern in &self.patterns {
            pattern.for_each_variable(&mut declare);
        }
        for select in &self.select_expressions {
            select.expr.for_each_variable(&mut declare);
            declare(&select.variable);
        }
        for expr in self.group_by.iter().chain(&self.having) {
            expr.for_each_variable(&mut declare);
        }
        for key in &self.order_by {
            key.expr.for_each_variable(&mut declare);
        }
        if let Some(projection) = &self.projection {
            projection.iter().for_each(&mut declare);
        }

        let projection = self.projection.unwrap_or_else(|| variables.clone());
        Query {
            variables,
            slots,
            body: self.body,
            projection,
            select_expressions: self.select_expressions,
            group_by: self.group_by,
            having: self.having,
            order_by: self.order_by,
            distinct: self.distinct,
            offset: self.offset,
            limit: self.limit,
            from: self.from,
            from_named: self.from_named,
            patterns: self.patterns,
            functions: self.functions,
        }
    }
}
