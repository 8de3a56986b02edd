//! Host-facing engine configuration.

/// Configuration a host wires into the engine.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Template wrapping a highlighted word in snippet text; `{word}` is
    /// replaced with the matched text.
    pub highlight_template: String,

    /// Separator between snippet fragments of one result.
    pub snippet_line_separator: String,

    /// Regexes matching word-like runs in snippet text; matches whose stem
    /// equals a query stem are highlighted.
    pub highlight_mask_regexes: Vec<String>,

    /// Erase and retry once when indexing hits a missing or stale schema.
    pub auto_erase: bool,

    /// Tokens longer than this many characters are dropped at indexing and
    /// query time.
    pub max_word_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            highlight_template: "<b>{word}</b>".to_string(),
            snippet_line_separator: " ... ".to_string(),
            highlight_mask_regexes: vec![
                r"[\p{L}\p{N}]+(?:[.,\-][\p{L}\p{N}]+)*".to_string(),
            ],
            auto_erase: true,
            max_word_length: 64,
        }
    }
}
