//! The write path: turning indexables into persistent index state.

pub mod indexable;
pub mod indexer;

pub use indexable::{Document, Indexable};
pub use indexer::{Indexer, IndexerConfig};
