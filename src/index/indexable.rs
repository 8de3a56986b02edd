//! The indexable contract and the owned document implementation.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::id::ExternalId;

/// Anything the engine can index: an external id plus the document fields
/// and a stable content hash for change detection.
pub trait Indexable {
    /// The id the document is addressable by.
    fn external_id(&self) -> ExternalId;

    /// Document title.
    fn title(&self) -> &str;

    /// Host-supplied keywords, tokenized like the title.
    fn keywords(&self) -> &str;

    /// Document URL.
    fn url(&self) -> &str;

    /// Raw document text handed to the extractor.
    fn content(&self) -> &str;

    /// Stable hash of the indexed fields. Equal hashes make reindexing a
    /// no-op on fulltext rows.
    fn content_hash(&self) -> String;

    /// Host-supplied ranking multiplier; 1.0 is neutral.
    fn relevance_ratio(&self) -> f64 {
        1.0
    }

    /// Optional document date.
    fn date(&self) -> Option<NaiveDate> {
        None
    }

    /// Domain-opaque metadata to persist on the TOC row.
    fn metadata(&self) -> Option<serde_json::Value> {
        None
    }
}

/// An owned indexable with builder-style construction, for hosts that do
/// not implement [`Indexable`] themselves.
///
/// # Examples
///
/// ```
/// use sedge::index::Document;
///
/// let doc = Document::new("doc1")
///     .title("Hello World")
///     .url("https://example.com/1")
///     .content("<p>hello world hello</p>");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    external_id: ExternalId,
    title: String,
    keywords: String,
    url: String,
    content: String,
    relevance_ratio: f64,
    date: Option<NaiveDate>,
    metadata: Option<serde_json::Value>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            external_id: ExternalId::default(),
            title: String::new(),
            keywords: String::new(),
            url: String::new(),
            content: String::new(),
            relevance_ratio: 1.0,
            date: None,
            metadata: None,
        }
    }
}

impl Document {
    /// Create a document with the given external id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Document {
            external_id: ExternalId::new(id),
            ..Document::default()
        }
    }

    /// Scope the document to an instance.
    pub fn instance(mut self, instance_id: u32) -> Self {
        self.external_id.instance_id = Some(instance_id);
        self
    }

    /// Set the title.
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    /// Set the keywords.
    pub fn keywords<S: Into<String>>(mut self, keywords: S) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// Set the URL.
    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = url.into();
        self
    }

    /// Set the raw content.
    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    /// Set the ranking multiplier.
    pub fn relevance_ratio(mut self, ratio: f64) -> Self {
        self.relevance_ratio = ratio;
        self
    }

    /// Set the document date.
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Attach opaque metadata.
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl Indexable for Document {
    fn external_id(&self) -> ExternalId {
        self.external_id.clone()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn keywords(&self) -> &str {
        &self.keywords
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [&self.title, &self.keywords, &self.content] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }

    fn relevance_ratio(&self) -> f64 {
        self.relevance_ratio
    }

    fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn metadata(&self) -> Option<serde_json::Value> {
        self.metadata.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        let doc = Document::new("a").title("T").content("body");
        assert_eq!(doc.content_hash(), doc.content_hash());
    }

    #[test]
    fn test_hash_tracks_indexed_fields() {
        let base = Document::new("a").title("T").content("body");
        let changed_content = Document::new("a").title("T").content("other");
        let changed_title = Document::new("a").title("U").content("body");
        // The URL is display data; it does not participate in the hash.
        let changed_url = Document::new("a").title("T").content("body").url("http://x");

        assert_ne!(base.content_hash(), changed_content.content_hash());
        assert_ne!(base.content_hash(), changed_title.content_hash());
        assert_eq!(base.content_hash(), changed_url.content_hash());
    }

    #[test]
    fn test_field_separator_avoids_ambiguity() {
        let ab = Document::new("a").title("ab").content("c");
        let a_bc = Document::new("a").title("a").content("bc");
        assert_ne!(ab.content_hash(), a_bc.content_hash());
    }

    #[test]
    fn test_builder_sets_instance() {
        let doc = Document::new("a").instance(3);
        assert_eq!(doc.external_id().instance_id, Some(3));
    }
}
