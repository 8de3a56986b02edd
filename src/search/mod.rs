//! The query read path: weighting, aggregation, snippet assembly.

pub mod fulltext;
pub mod result_set;
pub mod snippet;
pub mod weights;

pub use fulltext::FulltextResult;
pub use result_set::{DebugEntry, ResultSet, ResultSetConfig};
pub use snippet::SnippetBuilder;
pub use weights::{WeightKind, WeightMap};
