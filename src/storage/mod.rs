//! Storage abstraction for the inverted index.
//!
//! This module defines the dialect-neutral repository contract
//! ([`IndexStorage`]) over the five persisted tables (TOC, words, fulltext
//! positions, metadata, snippet sources), the DTOs crossing that boundary,
//! and a factory for concrete backends keyed on driver name.
//!
//! # Failure semantics
//!
//! Backends classify their native errors into two kinds:
//! [`EmptyIndex`](crate::error::SedgeError::EmptyIndex) when the schema is
//! missing or stale (unknown table / unknown column conditions), and
//! [`Unknown`](crate::error::SedgeError::Unknown) for everything else. The
//! write path recovers from *EmptyIndex* by erasing and retrying once when
//! auto-erase is enabled.
//!
//! # Transactions
//!
//! Transactions are reentrant through a nesting counter: only the outermost
//! `start_transaction`/`commit_transaction` pair reaches the backend, so a
//! caller that opened its own transaction before invoking indexing
//! suppresses the inner commit/rollback. `erase` and `drop_schema` are not
//! transactional.

pub mod schema;
pub mod sqlite;

pub use schema::TableNames;
pub use sqlite::SqliteStorage;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{Result, SedgeError};
use crate::extract::sentence_map::{SentenceFormat, SnippetSource};
use crate::id::ExternalId;
use crate::position::{FieldPositions, PositionKey};

/// Longest persisted word key, in characters. Longer surface forms are
/// truncated; uniqueness is on the truncated form.
pub const MAX_WORD_KEY_CHARS: usize = 255;

/// Truncate a word to its persisted key form.
pub fn truncate_word_key(word: &str) -> &str {
    match word.char_indices().nth(MAX_WORD_KEY_CHARS) {
        Some((byte_index, _)) => &word[..byte_index],
        None => word,
    }
}

/// Per-document descriptor owned by the TOC table.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Document title.
    pub title: String,

    /// Document URL.
    pub url: String,

    /// Stable content hash used for change detection.
    pub hash: String,

    /// Host-supplied ranking multiplier; 1.0 is neutral.
    pub relevance_ratio: f64,

    /// Optional document date.
    pub date: Option<NaiveDate>,

    /// Domain-opaque metadata the host chose to persist.
    pub metadata: Option<serde_json::Value>,
}

impl TocEntry {
    /// Create an entry with the given title, url and hash; the relevance
    /// ratio defaults to 1.0.
    pub fn new<T, U, H>(title: T, url: U, hash: H) -> Self
    where
        T: Into<String>,
        U: Into<String>,
        H: Into<String>,
    {
        TocEntry {
            title: title.into(),
            url: url.into(),
            hash: hash.into(),
            relevance_ratio: 1.0,
            date: None,
            metadata: None,
        }
    }
}

/// A TOC entry joined with its lazily-created metadata row.
#[derive(Debug, Clone)]
pub struct TocRecord {
    /// The id the entry is addressable by.
    pub external_id: ExternalId,

    /// The TOC row.
    pub entry: TocEntry,

    /// Word count from the metadata row, when indexed.
    pub word_count: Option<i64>,

    /// Image collection from the metadata row.
    pub images: crate::extract::ImgCollection,
}

/// Positions of one query word in one document, with the per-document
/// figures ranking needs.
#[derive(Debug, Clone)]
pub struct PositionBag {
    /// The document the positions belong to.
    pub external_id: ExternalId,

    /// Integer positions split by field. Synthetic compound positions have
    /// been truncated to their parent integer.
    pub positions: FieldPositions,

    /// Content word count of the document.
    pub word_count: i64,

    /// Host-supplied ranking multiplier.
    pub relevance_ratio: f64,
}

/// All position bags for one query word.
#[derive(Debug, Clone)]
pub struct WordHits {
    /// The query word (in its stemmed, truncated key form).
    pub word: String,

    /// One bag per document containing the word.
    pub bags: Vec<PositionBag>,
}

/// The read-path result of [`IndexStorage::fulltext_result_by_words`]:
/// per query word, the documents it occurs in, in query order.
#[derive(Debug, Clone, Default)]
pub struct FulltextIndexContent {
    /// Hits per supplied word, in the order the words were supplied.
    pub words: Vec<WordHits>,
}

/// One document's snippet request: the matched content positions to anchor
/// snippet rows on. An empty position list still participates in the
/// fallback row selection.
#[derive(Debug, Clone)]
pub struct SnippetRequest {
    /// Document to fetch snippets for.
    pub external_id: ExternalId,

    /// Matched content positions, unioned across query words.
    pub positions: Vec<i32>,
}

/// The batched snippet query for all displayed results.
#[derive(Debug, Clone, Default)]
pub struct SnippetQuery {
    /// Requests in display order.
    pub requests: Vec<SnippetRequest>,
}

/// One snippet row returned by the storage, re-attached to its external id.
#[derive(Debug, Clone)]
pub struct SnippetRow {
    /// Document the row belongs to.
    pub external_id: ExternalId,

    /// Position of the first word in the fragment.
    pub min_word_pos: i32,

    /// Position of the last word in the fragment.
    pub max_word_pos: i32,

    /// The fragment text.
    pub text: String,

    /// Encoding of `text`.
    pub format: SentenceFormat,
}

/// The dialect-neutral storage repository contract.
///
/// Implementations persist and query the engine's data model
/// transactionally and are shared between the read and write paths; callers
/// must serialise writes per external id.
pub trait IndexStorage: Send + Sync + std::fmt::Debug {
    /// Upsert a TOC row. After return,
    /// [`get_toc_by_external_id`](Self::get_toc_by_external_id) resolves
    /// for the id.
    fn add_entry_to_toc(&self, entry: &TocEntry, external_id: &ExternalId) -> Result<()>;

    /// Exact TOC lookup.
    fn get_toc_by_external_id(&self, external_id: &ExternalId) -> Result<Option<TocEntry>>;

    /// Batch TOC lookup with metadata. Output order is not guaranteed;
    /// callers re-order by external id.
    fn get_toc_by_external_ids(&self, external_ids: &[ExternalId]) -> Result<Vec<TocRecord>>;

    /// Delete fulltext, metadata and snippet rows for a document.
    /// Idempotent; absence is not an error.
    fn remove_from_index(&self, external_id: &ExternalId) -> Result<()>;

    /// Delete the TOC row for a document. Idempotent.
    fn remove_from_toc(&self, external_id: &ExternalId) -> Result<()>;

    /// Persist the stemmed words of a document. Each slice maps position
    /// keys to stems for one field. All positions of one stem across the
    /// three fields coexist in a single packed row.
    fn add_to_fulltext_index(
        &self,
        title_words: &[(PositionKey, String)],
        keywords: &[(PositionKey, String)],
        content_words: &[(PositionKey, String)],
        external_id: &ExternalId,
    ) -> Result<()>;

    /// Persist the metadata row for a document.
    fn add_metadata(
        &self,
        external_id: &ExternalId,
        word_count: i64,
        images: &crate::extract::ImgCollection,
    ) -> Result<()>;

    /// Persist snippet sources for a document.
    fn add_snippets(&self, external_id: &ExternalId, sources: &[SnippetSource]) -> Result<()>;

    /// For each supplied word, all position bags of documents containing
    /// it, optionally restricted to one instance.
    fn fulltext_result_by_words(
        &self,
        words: &[String],
        instance_id: Option<u32>,
    ) -> Result<FulltextIndexContent>;

    /// Run the snippet row query: matched-sentence rows unioned with the
    /// first two rows per requested document, ordered by
    /// `(document, max_word_pos)`.
    fn get_snippets(&self, query: &SnippetQuery) -> Result<Vec<SnippetRow>>;

    /// Number of TOC rows, optionally restricted to one instance.
    fn get_toc_size(&self, instance_id: Option<u32>) -> Result<u64>;

    /// Whether a word's document frequency exceeds the configured
    /// threshold. Consulted by the indexer (to drop content positions) and
    /// the query planner (to drop query terms).
    fn is_excluded_word(&self, word: &str) -> bool;

    /// Drop and recreate the schema, then refresh the excluded-word set.
    /// Not transactional.
    fn erase(&self) -> Result<()>;

    /// Drop the schema without recreating it. Not transactional.
    fn drop_schema(&self) -> Result<()>;

    /// Open a transaction, or join the already-open one.
    fn start_transaction(&self) -> Result<()>;

    /// Commit the outermost transaction; inner calls are no-ops.
    fn commit_transaction(&self) -> Result<()>;

    /// Roll back the outermost transaction; inner calls are no-ops.
    fn rollback_transaction(&self) -> Result<()>;

    /// Whether this backend supports transactions at all.
    fn is_transactional(&self) -> bool {
        true
    }

    /// Whether this backend supports [`erase`](Self::erase).
    fn supports_erase(&self) -> bool {
        true
    }
}

/// Configuration for storage backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend driver name; currently `"sqlite"`.
    pub driver: String,

    /// Database path for file-backed drivers; `None` selects an in-memory
    /// database.
    pub path: Option<PathBuf>,

    /// Prefix prepended to every table name; empty by default.
    pub table_prefix: String,

    /// Document-frequency bound above which a word is excluded from
    /// content indexing and query planning.
    pub excluded_word_threshold: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            driver: "sqlite".to_string(),
            path: None,
            table_prefix: String::new(),
            excluded_word_threshold: 1000,
        }
    }
}

impl StorageConfig {
    /// In-memory SQLite configuration.
    pub fn in_memory() -> Self {
        StorageConfig::default()
    }

    /// File-backed SQLite configuration.
    pub fn at_path<P: Into<PathBuf>>(path: P) -> Self {
        StorageConfig {
            path: Some(path.into()),
            ..StorageConfig::default()
        }
    }
}

/// A factory for creating storage instances keyed on driver name.
pub struct StorageFactory;

impl StorageFactory {
    /// Create a storage instance for the configured driver.
    pub fn create(config: StorageConfig) -> Result<Arc<dyn IndexStorage>> {
        match config.driver.as_str() {
            "sqlite" => Ok(Arc::new(SqliteStorage::open(config)?)),
            other => Err(SedgeError::invalid_argument(format!(
                "unknown storage driver: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_word_key() {
        let short = "word";
        assert_eq!(truncate_word_key(short), "word");

        let long = "a".repeat(300);
        assert_eq!(truncate_word_key(&long).chars().count(), 255);

        // Multibyte truncation stays on a char boundary.
        let wide = "é".repeat(300);
        let truncated = truncate_word_key(&wide);
        assert_eq!(truncated.chars().count(), 255);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_toc_entry_defaults() {
        let entry = TocEntry::new("Title", "http://x", "abc");
        assert_eq!(entry.relevance_ratio, 1.0);
        assert!(entry.date.is_none());
        assert!(entry.metadata.is_none());
    }

    #[test]
    fn test_factory_rejects_unknown_driver() {
        let config = StorageConfig {
            driver: "mssql".to_string(),
            ..StorageConfig::default()
        };
        assert!(StorageFactory::create(config).is_err());
    }

    #[test]
    fn test_factory_creates_sqlite() {
        let storage = StorageFactory::create(StorageConfig::in_memory()).unwrap();
        assert!(storage.is_transactional());
        assert!(storage.supports_erase());
    }
}
