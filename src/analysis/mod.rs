//! Text analysis: field normalization, tokenization, stemming and
//! compound-word decomposition.
//!
//! The pipeline is deliberately small. Title and keyword fields run through
//! [`normalize_field`] + [`tokenize_field`]; content text arrives already
//! cleaned from the extractor and is tokenized the same way, paragraph by
//! paragraph. Stems are produced by a pluggable [`stemmer::Stemmer`] and
//! augmented with component stems by [`compound::stems_with_components`].

pub mod compound;
pub mod stemmer;

pub use compound::stems_with_components;
pub use stemmer::{IdentityStemmer, PorterStemmer, Stemmer};

use std::sync::OnceLock;

use regex::Regex;

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&[a-zA-Z]{2,10};|&#[0-9]{1,7};|&#x[0-9a-fA-F]{1,6};").unwrap())
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.,\-]*\s+[.,\-]*").unwrap())
}

/// Normalize a title or keyword field for tokenization.
///
/// Lowercases, strips HTML entities, replaces every character that is not a
/// letter, digit, `.`, `,` or `-` with a space (letters of all scripts are
/// preserved), and appends a trailing space so the tokenizer strips trailing
/// punctuation.
pub fn normalize_field(text: &str) -> String {
    let text = entity_regex().replace_all(text, " ");
    let mut normalized = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        if c.is_alphanumeric() || matches!(c, '.' | ',' | '-') {
            normalized.extend(c.to_lowercase());
        } else {
            normalized.push(' ');
        }
    }
    normalized.push(' ');
    normalized
}

/// Split a normalized field into word tokens.
///
/// Separators are runs of whitespace with optional adjacent `.`, `,`, `-`
/// punctuation, so inner punctuation survives (`well-known`, `u.s`) while
/// punctuation next to whitespace is stripped. Tokens longer than `max_len`
/// characters are dropped; tokens consisting only of punctuation are dropped.
pub fn tokenize_field(normalized: &str, max_len: usize) -> Vec<String> {
    separator_regex()
        .split(normalized)
        .filter(|token| !token.is_empty())
        .filter(|token| !token.chars().all(|c| matches!(c, '.' | ',' | '-')))
        .filter(|token| token.chars().count() <= max_len)
        .map(|token| token.to_string())
        .collect()
}

/// Normalize and tokenize a raw title or keyword field in one step.
pub fn analyze_field(text: &str, max_len: usize) -> Vec<String> {
    tokenize_field(&normalize_field(text), max_len)
}
