//! Content extraction: raw document text → sentence map + images + warnings.
//!
//! Extraction is a chain of strategies. Each [`Extractor`] declares whether
//! it supports a given input; the [`ExtractorChain`] walks its strategies in
//! order and runs the first one that does. The default chain tries HTML
//! first and falls back to plain text, which supports everything.

pub mod sentence_map;

pub mod html;
pub mod plain;

pub use html::HtmlExtractor;
pub use plain::PlainTextExtractor;
pub use sentence_map::{SentenceCollection, SentenceFormat, SentenceMap, SnippetSource};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SedgeError};

/// A reference to an image found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image source URL.
    pub url: String,

    /// Alternative text, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Ordered collection of images extracted from one document.
pub type ImgCollection = Vec<ImageRef>;

/// Extracted content plus its structural metadata.
#[derive(Debug, Clone, Default)]
pub struct ContentWithMetadata {
    /// Per-paragraph text with format tags.
    pub sentence_map: SentenceMap,

    /// Images found in the document, in document order.
    pub images: ImgCollection,
}

/// The outcome of running an extractor over raw text.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// The cleaned content.
    pub content: ContentWithMetadata,

    /// Non-fatal problems encountered while extracting.
    pub warnings: Vec<String>,
}

/// Trait for extraction strategies.
pub trait Extractor: Send + Sync {
    /// Whether this strategy can handle the given input.
    fn supports(&self, text: &str) -> bool;

    /// Extract content from raw document text.
    fn extract(&self, text: &str) -> Result<ExtractionResult>;

    /// Get the name of this extractor.
    fn name(&self) -> &'static str;
}

/// A chain of extraction strategies tried in order.
pub struct ExtractorChain {
    strategies: Vec<Box<dyn Extractor>>,
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("ExtractorChain")
            .field("strategies", &names)
            .finish()
    }
}

impl ExtractorChain {
    /// Create the default chain: HTML, then plain text.
    pub fn new() -> Self {
        ExtractorChain {
            strategies: vec![
                Box::new(HtmlExtractor::new()),
                Box::new(PlainTextExtractor::new()),
            ],
        }
    }

    /// Create a chain from custom strategies.
    pub fn with_strategies(strategies: Vec<Box<dyn Extractor>>) -> Self {
        ExtractorChain { strategies }
    }

    /// Run the first supporting strategy over the input.
    pub fn extract(&self, text: &str) -> Result<ExtractionResult> {
        for strategy in &self.strategies {
            if strategy.supports(text) {
                return strategy.extract(text);
            }
        }
        Err(SedgeError::invalid_argument(
            "no extraction strategy supports the input",
        ))
    }
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new()
    }
}
