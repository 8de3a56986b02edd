//! The sentence map: per-paragraph text with word-position ranges.
//!
//! Extraction produces a [`SentenceMap`], the ordered set of cleaned
//! paragraphs. [`SentenceMap::to_sentence_collection`] flattens it into the
//! ordered word list with absolute positions (the indexer's content words)
//! and the [`SnippetSource`] records persisted for snippet assembly.

use crate::analysis;

/// How a stored snippet text is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentenceFormat {
    /// Plain text.
    #[default]
    Plain,
    /// Engine-internal markup.
    Internal,
    /// Raw HTML.
    Html,
}

impl SentenceFormat {
    /// The persisted format id.
    pub fn format_id(&self) -> i64 {
        match self {
            SentenceFormat::Plain => 0,
            SentenceFormat::Internal => 1,
            SentenceFormat::Html => 2,
        }
    }

    /// Rebuild a format from its persisted id; unknown ids fall back to plain.
    pub fn from_format_id(id: i64) -> Self {
        match id {
            1 => SentenceFormat::Internal,
            2 => SentenceFormat::Html,
            _ => SentenceFormat::Plain,
        }
    }
}

/// One paragraph-sized entry of the sentence map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Ordinal of the paragraph in the document.
    pub paragraph_index: usize,

    /// Optional link target associated with the paragraph.
    pub url: Option<String>,

    /// Cleaned paragraph text.
    pub text: String,

    /// Encoding of `text`.
    pub format: SentenceFormat,
}

/// Ordered set of cleaned paragraphs produced by extraction.
#[derive(Debug, Clone, Default)]
pub struct SentenceMap {
    sentences: Vec<Sentence>,
}

/// A stored text fragment with the position range of the words it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetSource {
    /// Absolute position of the first word in the fragment.
    pub min_word_pos: i32,

    /// Absolute position of the last word in the fragment.
    pub max_word_pos: i32,

    /// The fragment text.
    pub text: String,

    /// Encoding of `text`.
    pub format: SentenceFormat,
}

/// The flattened view of a sentence map: positioned words plus snippet
/// sources.
#[derive(Debug, Clone, Default)]
pub struct SentenceCollection {
    /// Ordered content words with absolute positions.
    pub words: Vec<(i32, String)>,

    /// Snippet sources in document order.
    pub snippet_sources: Vec<SnippetSource>,
}

impl SentenceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        SentenceMap::default()
    }

    /// Append a paragraph.
    pub fn push(&mut self, url: Option<String>, text: String, format: SentenceFormat) {
        let paragraph_index = self.sentences.len();
        self.sentences.push(Sentence {
            paragraph_index,
            url,
            text,
            format,
        });
    }

    /// Number of paragraphs.
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// True when the map holds no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Iterate over paragraphs in order.
    pub fn iter(&self) -> impl Iterator<Item = &Sentence> {
        self.sentences.iter()
    }

    /// Flatten into the ordered word list and snippet sources.
    ///
    /// Word positions are absolute across the whole document. Paragraphs
    /// that tokenize to nothing yield no snippet source; there is no
    /// position range to attach them to.
    pub fn to_sentence_collection(&self, max_word_len: usize) -> SentenceCollection {
        let mut collection = SentenceCollection::default();
        let mut position: i32 = 0;

        for sentence in &self.sentences {
            let tokens = analysis::analyze_field(&sentence.text, max_word_len);
            if tokens.is_empty() {
                continue;
            }
            let min_word_pos = position;
            for token in tokens {
                collection.words.push((position, token));
                position += 1;
            }
            collection.snippet_sources.push(SnippetSource {
                min_word_pos,
                max_word_pos: position - 1,
                text: sentence.text.clone(),
                format: sentence.format,
            });
        }

        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id_round_trip() {
        for format in [
            SentenceFormat::Plain,
            SentenceFormat::Internal,
            SentenceFormat::Html,
        ] {
            assert_eq!(SentenceFormat::from_format_id(format.format_id()), format);
        }
        assert_eq!(SentenceFormat::from_format_id(99), SentenceFormat::Plain);
    }

    #[test]
    fn test_flatten_assigns_absolute_positions() {
        let mut map = SentenceMap::new();
        map.push(None, "hello world".to_string(), SentenceFormat::Plain);
        map.push(None, "second paragraph here".to_string(), SentenceFormat::Plain);

        let collection = map.to_sentence_collection(64);

        assert_eq!(
            collection.words,
            vec![
                (0, "hello".to_string()),
                (1, "world".to_string()),
                (2, "second".to_string()),
                (3, "paragraph".to_string()),
                (4, "here".to_string()),
            ]
        );
        assert_eq!(collection.snippet_sources.len(), 2);
        assert_eq!(collection.snippet_sources[0].min_word_pos, 0);
        assert_eq!(collection.snippet_sources[0].max_word_pos, 1);
        assert_eq!(collection.snippet_sources[1].min_word_pos, 2);
        assert_eq!(collection.snippet_sources[1].max_word_pos, 4);
    }

    #[test]
    fn test_empty_paragraphs_yield_no_source() {
        let mut map = SentenceMap::new();
        map.push(None, "---".to_string(), SentenceFormat::Plain);
        map.push(None, "real words".to_string(), SentenceFormat::Plain);

        let collection = map.to_sentence_collection(64);

        assert_eq!(collection.words.len(), 2);
        assert_eq!(collection.snippet_sources.len(), 1);
        assert_eq!(collection.snippet_sources[0].text, "real words");
    }

    #[test]
    fn test_source_keeps_original_text() {
        let mut map = SentenceMap::new();
        map.push(None, "Hello, World!".to_string(), SentenceFormat::Plain);

        let collection = map.to_sentence_collection(64);

        // Snippet text is the display form, not the normalized form.
        assert_eq!(collection.snippet_sources[0].text, "Hello, World!");
    }
}
