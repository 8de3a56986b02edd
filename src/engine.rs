//! The engine facade: one object wiring the write and read paths.
//!
//! Write path: `Indexable → Extractor → SentenceMap → Stemmer → Storage`.
//! Read path: `Query → Stemmer → Storage → FulltextResult → ResultSet →
//! TOC + snippets → hits`.

use std::sync::Arc;

use crate::analysis::stemmer::{PorterStemmer, Stemmer};
use crate::analysis::analyze_field;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::extract::ExtractorChain;
use crate::id::ExternalId;
use crate::index::{Indexable, Indexer, IndexerConfig};
use crate::search::result_set::{ResultSet, ResultSetConfig};
use crate::search::snippet::SnippetBuilder;
use crate::search::FulltextResult;
use crate::storage::IndexStorage;

/// One search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// The multi-word query.
    pub query: String,

    /// Maximum number of hits to return.
    pub limit: usize,

    /// Number of leading hits to skip.
    pub offset: usize,

    /// Restrict matching to one instance.
    pub instance_id: Option<u32>,

    /// Capture per-contribution debug entries on the result set.
    pub debug: bool,
}

impl SearchRequest {
    /// A request for the first page of results for `query`.
    pub fn new<S: Into<String>>(query: S) -> Self {
        SearchRequest {
            query: query.into(),
            limit: 10,
            offset: 0,
            instance_id: None,
            debug: false,
        }
    }

    /// Set the paging window.
    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Restrict to an instance.
    pub fn instance(mut self, instance_id: u32) -> Self {
        self.instance_id = Some(instance_id);
        self
    }
}

/// One displayed search hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched document.
    pub external_id: ExternalId,

    /// Aggregate relevance score.
    pub score: f64,

    /// Title from the TOC.
    pub title: String,

    /// URL from the TOC.
    pub url: String,

    /// Highlighted snippet text; empty when the document stored no snippet
    /// sources.
    pub snippet: String,
}

/// The answer to a [`SearchRequest`].
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    /// The requested page of hits, best first.
    pub hits: Vec<SearchHit>,

    /// Number of matched documents before paging.
    pub total: usize,
}

/// An embeddable full-text search engine over one storage handle.
pub struct SearchEngine {
    storage: Arc<dyn IndexStorage>,
    stemmer: Arc<dyn Stemmer>,
    indexer: Indexer,
    config: SearchConfig,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("storage", &self.storage)
            .field("stemmer", &self.stemmer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl SearchEngine {
    /// Create an engine with the default stemmer and extractor chain.
    pub fn new(storage: Arc<dyn IndexStorage>, config: SearchConfig) -> Self {
        Self::with_stemmer(storage, config, Arc::new(PorterStemmer::new()))
    }

    /// Create an engine with a custom stemmer.
    pub fn with_stemmer(
        storage: Arc<dyn IndexStorage>,
        config: SearchConfig,
        stemmer: Arc<dyn Stemmer>,
    ) -> Self {
        let indexer = Indexer::new(
            storage.clone(),
            stemmer.clone(),
            ExtractorChain::new(),
            IndexerConfig {
                auto_erase: config.auto_erase,
                max_word_length: config.max_word_length,
            },
        );
        SearchEngine {
            storage,
            stemmer,
            indexer,
            config,
        }
    }

    /// Index one document.
    pub fn index(&self, document: &dyn Indexable) -> Result<()> {
        self.indexer.index(document)
    }

    /// Remove one document from index and TOC.
    pub fn remove(&self, external_id: &ExternalId) -> Result<()> {
        self.indexer.remove(external_id)
    }

    /// Number of documents in the TOC.
    pub fn document_count(&self, instance_id: Option<u32>) -> Result<u64> {
        self.storage.get_toc_size(instance_id)
    }

    /// Answer a query with ranked, paged, snippeted hits.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let (results, _) = self.search_with_result_set(request)?;
        Ok(results)
    }

    /// Like [`search`](Self::search), also returning the frozen result set
    /// with its profile points and debug entries.
    pub fn search_with_result_set(
        &self,
        request: &SearchRequest,
    ) -> Result<(SearchResults, ResultSet)> {
        let mut result_set = ResultSet::new(ResultSetConfig {
            limit: request.limit,
            offset: request.offset,
            debug: request.debug,
        });

        let query_words = self.query_stems(&request.query);
        if query_words.is_empty() {
            result_set.freeze()?;
            return Ok((SearchResults::default(), result_set));
        }
        let stems: Vec<String> = query_words.iter().map(|(_, stem)| stem.clone()).collect();

        let content = self
            .storage
            .fulltext_result_by_words(&stems, request.instance_id)?;
        let toc_size = self.storage.get_toc_size(request.instance_id)?;
        result_set.add_profile_point("fulltext");

        FulltextResult::new(content, query_words, toc_size).fill_result_set(&mut result_set)?;
        result_set.freeze()?;
        result_set.add_profile_point("sorted");

        let page: Vec<ExternalId> = result_set.sorted_external_ids()?.to_vec();
        let records = self.storage.get_toc_by_external_ids(&page)?;
        for record in records {
            result_set.attach_toc(record)?;
        }
        result_set.add_profile_point("toc");

        let snippet_builder = SnippetBuilder::new(&self.config, self.stemmer.as_ref())?;
        snippet_builder.build(&mut result_set, self.storage.as_ref(), &stems)?;
        result_set.add_profile_point("snippets");

        let mut hits = Vec::with_capacity(page.len());
        for external_id in &page {
            let (title, url) = result_set
                .toc(external_id)
                .map(|record| (record.entry.title.clone(), record.entry.url.clone()))
                .unwrap_or_default();
            hits.push(SearchHit {
                external_id: external_id.clone(),
                score: result_set.score(external_id)?,
                title,
                url,
                snippet: result_set.snippet(external_id).unwrap_or_default().to_string(),
            });
        }

        let results = SearchResults {
            hits,
            total: result_set.total_matched(),
        };
        Ok((results, result_set))
    }

    /// Tokenize and stem the query the same way indexed fields are, keep
    /// the first position of each distinct stem, and drop stems the
    /// storage excludes.
    fn query_stems(&self, query: &str) -> Vec<(i32, String)> {
        let mut stems: Vec<(i32, String)> = Vec::new();
        for (position, token) in analyze_field(query, self.config.max_word_length)
            .into_iter()
            .enumerate()
        {
            let stem = self.stemmer.stem_word(&token, false);
            if self.storage.is_excluded_word(&stem) {
                continue;
            }
            if stems.iter().any(|(_, existing)| *existing == stem) {
                continue;
            }
            stems.push((position as i32, stem));
        }
        stems
    }

    /// The storage handle the engine runs over.
    pub fn storage(&self) -> &Arc<dyn IndexStorage> {
        &self.storage
    }
}
