use crate::Expr;
use kgram_model::{NamedNode, Position, Term, Variable};
use std::fmt::{Display, Formatter};

/// A node of a query pattern: either a variable or a constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternNode {
    Variable(Variable),
    Constant(Term),
}

impl PatternNode {
    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            PatternNode::Variable(variable) => Some(variable),
            PatternNode::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Term> {
        match self {
            PatternNode::Variable(_) => None,
            PatternNode::Constant(term) => Some(term),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, PatternNode::Constant(_))
    }
}

impl From<Variable> for PatternNode {
    fn from(value: Variable) -> Self {
        PatternNode::Variable(value)
    }
}

impl From<Term> for PatternNode {
    fn from(value: Term) -> Self {
        PatternNode::Constant(value)
    }
}

impl From<NamedNode> for PatternNode {
    fn from(value: NamedNode) -> Self {
        PatternNode::Constant(value.into())
    }
}

impl Display for PatternNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternNode::Variable(variable) => Display::fmt(variable, f),
            PatternNode::Constant(term) => Display::fmt(term, f),
        }
    }
}

/// A triple pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgePattern {
    pub subject: PatternNode,
    pub predicate: PatternNode,
    pub object: PatternNode,
}

impl EdgePattern {
    pub fn new(
        subject: impl Into<PatternNode>,
        predicate: impl Into<PatternNode>,
        object: impl Into<PatternNode>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Returns the pattern node at `position`. Edge patterns have no graph or list slot.
    pub fn node(&self, position: Position) -> Option<&PatternNode> {
        match position {
            Position::Subject => Some(&self.subject),
            Position::Object => Some(&self.object),
            Position::Graph | Position::List => None,
        }
    }
}

impl Display for EdgePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// A property path expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathExpr {
    Predicate(NamedNode),
    /// `^path`
    Reverse(Box<PathExpr>),
    Sequence(Box<PathExpr>, Box<PathExpr>),
    Alternative(Box<PathExpr>, Box<PathExpr>),
    ZeroOrMore(Box<PathExpr>),
    OneOrMore(Box<PathExpr>),
    ZeroOrOne(Box<PathExpr>),
    /// `!(p1|p2)`
    Negated(Vec<NamedNode>),
}

impl PathExpr {
    /// Returns whether the path matches exactly one edge, possibly traversed backwards.
    pub fn is_step(&self) -> bool {
        match self {
            PathExpr::Predicate(_) | PathExpr::Negated(_) => true,
            PathExpr::Reverse(inner) => inner.is_step(),
            _ => false,
        }
    }

    /// Returns the path that matches the same pairs with subject and object swapped.
    #[must_use]
    pub fn reverse(&self) -> PathExpr {
        match self {
            PathExpr::Predicate(_) | PathExpr::Negated(_) => {
                PathExpr::Reverse(Box::new(self.clone()))
            }
            PathExpr::Reverse(inner) => inner.as_ref().clone(),
            PathExpr::Sequence(lhs, rhs) => {
                PathExpr::Sequence(Box::new(rhs.reverse()), Box::new(lhs.reverse()))
            }
            PathExpr::Alternative(lhs, rhs) => {
                PathExpr::Alternative(Box::new(lhs.reverse()), Box::new(rhs.reverse()))
            }
            PathExpr::ZeroOrMore(inner) => PathExpr::ZeroOrMore(Box::new(inner.reverse())),
            PathExpr::OneOrMore(inner) => PathExpr::OneOrMore(Box::new(inner.reverse())),
            PathExpr::ZeroOrOne(inner) => PathExpr::ZeroOrOne(Box::new(inner.reverse())),
        }
    }
}

/// A property path pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathPattern {
    pub subject: PatternNode,
    pub path: PathExpr,
    pub object: PatternNode,
}

impl PathPattern {
    pub fn node(&self, position: Position) -> Option<&PatternNode> {
        match position {
            Position::Subject => Some(&self.subject),
            Position::Object => Some(&self.object),
            Position::Graph | Position::List => None,
        }
    }
}

/// Identifies a sub-pattern registered in a query, e.g., the pattern of an `EXISTS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatternId(usize);

impl PatternId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// The body of a query.
///
/// Filters and binds are elements of a sequence and are evaluated when the evaluation reaches
/// them.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphPattern {
    Edge(EdgePattern),
    Path(PathPattern),
    /// A sequence of patterns that are joined in order.
    And(Vec<GraphPattern>),
    Optional {
        left: Box<GraphPattern>,
        right: Box<GraphPattern>,
        filter: Option<Expr>,
    },
    Union(Box<GraphPattern>, Box<GraphPattern>),
    Minus(Box<GraphPattern>, Box<GraphPattern>),
    Filter(Expr),
    Bind {
        variable: Variable,
        expr: Expr,
    },
    Graph {
        name: PatternNode,
        inner: Box<GraphPattern>,
    },
    Values {
        variables: Vec<Variable>,
        rows: Vec<Vec<Option<Term>>>,
    },
}

impl GraphPattern {
    /// The pattern that has exactly one empty solution.
    pub fn empty() -> Self {
        GraphPattern::And(Vec::new())
    }

    /// Calls `f` for every variable that occurs in the pattern, in order of appearance.
    ///
    /// Sub-patterns referenced by `EXISTS` are not visited.
    pub fn for_each_variable(&self, f: &mut impl FnMut(&Variable)) {
        match self {
            GraphPattern::Edge(edge) => {
                visit(&edge.subject, f);
                visit(&edge.predicate, f);
                visit(&edge.object, f);
            }
            GraphPattern::Path(path) => {
                visit(&path.subject, f);
                visit(&path.object, f);
            }
            GraphPattern::And(items) => items.iter().for_each(|item| item.for_each_variable(f)),
            GraphPattern::Optional {
                left,
                right,
                filter,
            } => {
                left.for_each_variable(f);
                right.for_each_variable(f);
                if let Some(filter) = filter {
                    filter.for_each_variable(f);
                }
            }
            GraphPattern::Union(lhs, rhs) | GraphPattern::Minus(lhs, rhs) => {
                lhs.for_each_variable(f);
                rhs.for_each_variable(f);
            }
            GraphPattern::Filter(expr) => expr.for_each_variable(f),
            GraphPattern::Bind { variable, expr } => {
                expr.for_each_variable(f);
                f(variable);
            }
            GraphPattern::Graph { name, inner } => {
                visit(name, f);
                inner.for_each_variable(f);
            }
            GraphPattern::Values { variables, .. } => variables.iter().for_each(|v| f(v)),
        }
    }
}

fn visit(node: &PatternNode, f: &mut impl FnMut(&Variable)) {
    if let PatternNode::Variable(variable) = node {
        f(variable);
    }
}
