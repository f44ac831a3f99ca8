mod expression_rewriter;
mod graph_pattern_rewriter;
mod query_rewriter;

pub use query_rewriter::QueryRewriter;

use expression_rewriter::ExpressionRewriter;
use graph_pattern_rewriter::GraphPatternRewriter;
