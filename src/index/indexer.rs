//! The indexer: orchestrates hash diffing, extraction, stemming and
//! persistence for one document at a time.

use std::sync::Arc;

use crate::analysis::stemmer::Stemmer;
use crate::analysis::{analyze_field, stems_with_components};
use crate::error::Result;
use crate::extract::ExtractorChain;
use crate::id::ExternalId;
use crate::index::indexable::Indexable;
use crate::storage::{IndexStorage, TocEntry};

/// Indexer behaviour switches.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Erase and retry once when a write hits a missing or stale schema.
    pub auto_erase: bool,

    /// Tokens longer than this many characters are dropped.
    pub max_word_length: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            auto_erase: true,
            max_word_length: 64,
        }
    }
}

/// Writes the persistent index state for indexables.
pub struct Indexer {
    storage: Arc<dyn IndexStorage>,
    stemmer: Arc<dyn Stemmer>,
    extractor: ExtractorChain,
    config: IndexerConfig,
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("storage", &self.storage)
            .field("stemmer", &self.stemmer.name())
            .field("extractor", &self.extractor)
            .field("config", &self.config)
            .finish()
    }
}

impl Indexer {
    /// Create an indexer over the given collaborators.
    pub fn new(
        storage: Arc<dyn IndexStorage>,
        stemmer: Arc<dyn Stemmer>,
        extractor: ExtractorChain,
        config: IndexerConfig,
    ) -> Self {
        Indexer {
            storage,
            stemmer,
            extractor,
            config,
        }
    }

    /// Index one document, retrying once through an erase when the schema
    /// is missing and auto-erase is enabled.
    pub fn index(&self, document: &dyn Indexable) -> Result<()> {
        match self.do_index(document) {
            Err(err)
                if err.is_empty_index()
                    && self.config.auto_erase
                    && self.storage.supports_erase() =>
            {
                log::warn!(
                    "index schema missing while indexing {}; erasing and retrying: {err}",
                    document.external_id()
                );
                self.storage.erase()?;
                self.do_index(document)
            }
            other => other,
        }
    }

    /// Remove one document from index and TOC.
    pub fn remove(&self, external_id: &ExternalId) -> Result<()> {
        self.transactional(|| {
            self.storage.remove_from_index(external_id)?;
            self.storage.remove_from_toc(external_id)
        })
    }

    fn do_index(&self, document: &dyn Indexable) -> Result<()> {
        self.transactional(|| self.write_document(document))
    }

    /// Run a write under a transaction when the storage is transactional;
    /// roll back on any error.
    fn transactional<F: FnOnce() -> Result<()>>(&self, write: F) -> Result<()> {
        if !self.storage.is_transactional() {
            return write();
        }
        self.storage.start_transaction()?;
        match write() {
            Ok(()) => self.storage.commit_transaction(),
            Err(err) => {
                if let Err(rollback_err) = self.storage.rollback_transaction() {
                    log::warn!("rollback after failed write also failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }

    fn write_document(&self, document: &dyn Indexable) -> Result<()> {
        let external_id = document.external_id();
        let previous = self.storage.get_toc_by_external_id(&external_id)?;

        let entry = TocEntry {
            title: document.title().to_string(),
            url: document.url().to_string(),
            hash: document.content_hash(),
            relevance_ratio: document.relevance_ratio(),
            date: document.date(),
            metadata: document.metadata(),
        };
        self.storage.add_entry_to_toc(&entry, &external_id)?;

        // Same hash: the fulltext rows already reflect this content.
        if previous.is_some_and(|prev| prev.hash == entry.hash) {
            log::debug!("unchanged hash for {external_id}, skipping reindex");
            return Ok(());
        }

        self.storage.remove_from_index(&external_id)?;

        let extraction = self.extractor.extract(document.content())?;
        for warning in &extraction.warnings {
            log::warn!("extraction warning for {external_id}: {warning}");
        }

        let collection = extraction
            .content
            .sentence_map
            .to_sentence_collection(self.config.max_word_length);

        let title_tokens = positioned(analyze_field(document.title(), self.config.max_word_length));
        let keyword_tokens = positioned(analyze_field(
            document.keywords(),
            self.config.max_word_length,
        ));
        let content_tokens: Vec<(i32, String)> = collection
            .words
            .into_iter()
            .filter(|(_, word)| !self.storage.is_excluded_word(word))
            .collect();

        let word_count = (title_tokens.len() + content_tokens.len()) as i64;
        self.storage
            .add_metadata(&external_id, word_count, &extraction.content.images)?;
        self.storage
            .add_snippets(&external_id, &collection.snippet_sources)?;

        let title_stems = stems_with_components(&title_tokens, self.stemmer.as_ref());
        let keyword_stems = stems_with_components(&keyword_tokens, self.stemmer.as_ref());
        let content_stems = stems_with_components(&content_tokens, self.stemmer.as_ref());
        self.storage.add_to_fulltext_index(
            &title_stems,
            &keyword_stems,
            &content_stems,
            &external_id,
        )?;

        log::debug!(
            "indexed {external_id}: {word_count} words, {} snippet sources",
            collection.snippet_sources.len()
        );
        Ok(())
    }
}

/// Tag tokens with their 0-based positions.
fn positioned(tokens: Vec<String>) -> Vec<(i32, String)> {
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, token)| (i as i32, token))
        .collect()
}
