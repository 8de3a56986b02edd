//! Plain-text extraction strategy.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::extract::sentence_map::{SentenceFormat, SentenceMap};
use crate::extract::{ContentWithMetadata, ExtractionResult, Extractor};

fn paragraph_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n").unwrap())
}

/// Extraction strategy for plain text: paragraphs are separated by blank
/// lines. Supports any input, so it terminates the default chain.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    /// Create a new plain-text extractor.
    pub fn new() -> Self {
        PlainTextExtractor
    }
}

impl Extractor for PlainTextExtractor {
    fn supports(&self, _text: &str) -> bool {
        true
    }

    fn extract(&self, text: &str) -> Result<ExtractionResult> {
        let mut sentence_map = SentenceMap::new();
        for paragraph in paragraph_break_regex().split(text) {
            let trimmed = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
            if trimmed.is_empty() {
                continue;
            }
            sentence_map.push(None, trimmed, SentenceFormat::Plain);
        }

        let mut warnings = Vec::new();
        if sentence_map.is_empty() {
            warnings.push("document yielded no text content".to_string());
        }

        Ok(ExtractionResult {
            content: ContentWithMetadata {
                sentence_map,
                images: Vec::new(),
            },
            warnings,
        })
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}
