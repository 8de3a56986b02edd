//! # Sedge
//!
//! An embeddable full-text search engine for HTML-like documents.
//!
//! Sedge ingests documents ("indexables"), extracts clean text and
//! structural metadata, builds a persistent inverted index backed by a
//! relational store, and answers multi-word queries with ranked document
//! identifiers plus contextual, highlighted snippets.
//!
//! ## Features
//!
//! - Inverted index persisted in SQLite with a prefixable five-table schema
//! - Field-aware positions (title, keyword, content) in a packed wire format
//! - Compound-word decomposition: hyphenated tokens also match on their
//!   components
//! - Document-frequency abundance reduction and neighbour-pair ranking
//! - Snippet selection with principled fallback and query-stem highlighting
//! - Reentrant transactions and automatic schema recovery
//!
//! ## Example
//!
//! ```
//! use sedge::config::SearchConfig;
//! use sedge::engine::{SearchEngine, SearchRequest};
//! use sedge::index::Document;
//! use sedge::storage::{StorageConfig, StorageFactory};
//!
//! # fn main() -> sedge::error::Result<()> {
//! let storage = StorageFactory::create(StorageConfig::in_memory())?;
//! let engine = SearchEngine::new(storage, SearchConfig::default());
//!
//! engine.index(
//!     &Document::new("doc1")
//!         .title("Hello World")
//!         .content("<p>hello world hello</p>"),
//! )?;
//!
//! let results = engine.search(&SearchRequest::new("hello"))?;
//! assert_eq!(results.hits.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod id;
pub mod index;
pub mod position;
pub mod search;
pub mod storage;

pub use config::SearchConfig;
pub use engine::{SearchEngine, SearchHit, SearchRequest, SearchResults};
pub use error::{Result, SedgeError};
pub use id::ExternalId;
pub use index::{Document, Indexable};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
