use std::fmt::{Display, Formatter};

/// A slot of an edge.
///
/// Index lookups and path reversal key off this convention: the subject is slot 0, the object
/// is slot 1 and the named graph and path lists use reserved sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Subject,
    Object,
    Graph,
    List,
}

impl Position {
    /// The order in which the producer tries the indexes of a graph.
    pub const INDEX_ORDER: [Position; 3] = [Position::Subject, Position::Object, Position::Graph];

    /// Swaps the subject and the object. Sentinel positions are returned as is.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Position::Subject => Position::Object,
            Position::Object => Position::Subject,
            other => other,
        }
    }

    /// The numeric slot of this position.
    pub fn index(self) -> isize {
        match self {
            Position::Subject => 0,
            Position::Object => 1,
            Position::Graph => -1,
            Position::List => -2,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Subject => f.write_str("subject"),
            Position::Object => f.write_str("object"),
            Position::Graph => f.write_str("graph"),
            Position::List => f.write_str("list"),
        }
    }
}
