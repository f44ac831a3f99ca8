use crate::{FunctionDefinition, PatternId};
use kgram_model::{NamedNode, Term, Variable};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, OnceLock};

/// An expression of a filter, a computed value or an aggregate.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Constant(Term),
    Variable(Variable),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    /// `lhs IN (list)`
    In(Box<Expr>, Vec<Expr>),
    Bound(Variable),
    Coalesce(Vec<Expr>),
    If(Box<Expr>, Box<Expr>, Option<Box<Expr>>),
    /// Binds the variable to the value of the first expression while evaluating the second.
    Let(Variable, Box<Expr>, Box<Expr>),
    /// Refers to a sub-pattern registered in the query.
    Exists(PatternId),
    Aggregate(Aggregate),
    Function(FunctionCall),
    /// Introspection of the evaluation state, selected by an optional target.
    System(Option<Term>),
}

impl Expr {
    pub fn constant(term: impl Into<Term>) -> Self {
        Expr::Constant(term.into())
    }

    pub fn variable(variable: &Variable) -> Self {
        Expr::Variable(variable.clone())
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn negation(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Function(FunctionCall::new(function, args))
    }

    /// Returns whether the expression contains an aggregate.
    pub fn is_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate(_) => true,
            Expr::Constant(_)
            | Expr::Variable(_)
            | Expr::Bound(_)
            | Expr::Exists(_)
            | Expr::System(_) => false,
            Expr::And(args) | Expr::Or(args) | Expr::Coalesce(args) => {
                args.iter().any(Expr::is_aggregate)
            }
            Expr::Function(call) => call.args.iter().any(Expr::is_aggregate),
            Expr::Not(inner) | Expr::Unary(_, inner) => inner.is_aggregate(),
            Expr::Binary(_, lhs, rhs) | Expr::Let(_, lhs, rhs) => {
                lhs.is_aggregate() || rhs.is_aggregate()
            }
            Expr::In(lhs, list) => lhs.is_aggregate() || list.iter().any(Expr::is_aggregate),
            Expr::If(cond, then, otherwise) => {
                cond.is_aggregate()
                    || then.is_aggregate()
                    || otherwise.as_ref().is_some_and(|e| e.is_aggregate())
            }
        }
    }

    /// Calls `f` for every variable that the expression reads.
    pub fn for_each_variable(&self, f: &mut impl FnMut(&Variable)) {
        match self {
            Expr::Variable(v) | Expr::Bound(v) => f(v),
            Expr::Constant(_) | Expr::Exists(_) | Expr::System(_) => {}
            Expr::And(args) | Expr::Or(args) | Expr::Coalesce(args) => {
                args.iter().for_each(|a| a.for_each_variable(f));
            }
            Expr::Function(call) => call.args.iter().for_each(|a| a.for_each_variable(f)),
            Expr::Not(inner) | Expr::Unary(_, inner) => inner.for_each_variable(f),
            Expr::Binary(_, lhs, rhs) => {
                lhs.for_each_variable(f);
                rhs.for_each_variable(f);
            }
            // The let variable is local to the body.
            Expr::Let(_, value, body) => {
                value.for_each_variable(f);
                body.for_each_variable(f);
            }
            Expr::In(lhs, list) => {
                lhs.for_each_variable(f);
                list.iter().for_each(|a| a.for_each_variable(f));
            }
            Expr::If(cond, then, otherwise) => {
                cond.for_each_variable(f);
                then.for_each_variable(f);
                if let Some(otherwise) = otherwise {
                    otherwise.for_each_variable(f);
                }
            }
            Expr::Aggregate(aggregate) => {
                if let Some(argument) = &aggregate.argument {
                    argument.for_each_variable(f);
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Equal,
    SameTerm,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BinaryOp::Equal => "=",
            BinaryOp::SameTerm => "sameTerm",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// The built-in functions whose value semantics are provided by the value proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Str,
    Lang,
    LangMatches,
    Datatype,
    Iri,
    StrLen,
    SubStr,
    UCase,
    LCase,
    StrStarts,
    StrEnds,
    Contains,
    Concat,
    Regex,
    Abs,
    Ceil,
    Floor,
    Round,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    StrDt,
    StrLang,
}

impl BuiltinFunction {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinFunction::Str => "STR",
            BuiltinFunction::Lang => "LANG",
            BuiltinFunction::LangMatches => "LANGMATCHES",
            BuiltinFunction::Datatype => "DATATYPE",
            BuiltinFunction::Iri => "IRI",
            BuiltinFunction::StrLen => "STRLEN",
            BuiltinFunction::SubStr => "SUBSTR",
            BuiltinFunction::UCase => "UCASE",
            BuiltinFunction::LCase => "LCASE",
            BuiltinFunction::StrStarts => "STRSTARTS",
            BuiltinFunction::StrEnds => "STRENDS",
            BuiltinFunction::Contains => "CONTAINS",
            BuiltinFunction::Concat => "CONCAT",
            BuiltinFunction::Regex => "REGEX",
            BuiltinFunction::Abs => "ABS",
            BuiltinFunction::Ceil => "CEIL",
            BuiltinFunction::Floor => "FLOOR",
            BuiltinFunction::Round => "ROUND",
            BuiltinFunction::IsIri => "isIRI",
            BuiltinFunction::IsBlank => "isBLANK",
            BuiltinFunction::IsLiteral => "isLITERAL",
            BuiltinFunction::IsNumeric => "isNUMERIC",
            BuiltinFunction::StrDt => "STRDT",
            BuiltinFunction::StrLang => "STRLANG",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    Builtin(BuiltinFunction),
    /// A function defined by the query or by an extension provider.
    Extension(NamedNode),
}

/// A function call.
///
/// Extension calls remember the definition they were resolved to on their first evaluation.
#[derive(Clone, Debug)]
pub struct FunctionCall {
    function: Function,
    args: Vec<Expr>,
    definition: OnceLock<Arc<FunctionDefinition>>,
}

impl FunctionCall {
    pub fn new(function: Function, args: Vec<Expr>) -> Self {
        Self {
            function,
            args,
            definition: OnceLock::new(),
        }
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// The definition cached by a previous evaluation.
    pub fn cached_definition(&self) -> Option<&Arc<FunctionDefinition>> {
        self.definition.get()
    }

    /// Caches the definition of this call. The first cached definition wins.
    pub fn cache_definition(&self, definition: Arc<FunctionDefinition>) -> &Arc<FunctionDefinition> {
        self.definition.get_or_init(|| definition)
    }
}

impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function && self.args == other.args
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    /// `None` for `COUNT(*)`.
    pub argument: Option<Box<Expr>>,
    pub distinct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat { separator: String },
    /// The boolean conjunction of the effective boolean values of the group.
    And,
}
