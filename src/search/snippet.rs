//! Snippet assembly and highlighting.
//!
//! For each displayed result the builder unions the matched content
//! positions across query words, asks the storage for snippet rows (matched
//! sentences plus the two-row fallback per document), highlights query-stem
//! matches and attaches the joined text to the result set.
//!
//! Errors the frozen result set raises against this pipeline stage
//! (*Immutable*, *UnknownId*) indicate a programming mistake, not a
//! recoverable condition; they are wrapped as *Logic*.

use regex::Regex;

use ahash::AHashSet;

use crate::analysis::stemmer::Stemmer;
use crate::config::SearchConfig;
use crate::error::{Result, SedgeError};
use crate::search::result_set::ResultSet;
use crate::storage::{IndexStorage, SnippetQuery, SnippetRequest};

/// Assembles display snippets for a frozen result set.
pub struct SnippetBuilder<'a> {
    config: &'a SearchConfig,
    stemmer: &'a dyn Stemmer,
    masks: Vec<Regex>,
}

impl<'a> std::fmt::Debug for SnippetBuilder<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetBuilder")
            .field("config", &self.config)
            .field("stemmer", &self.stemmer.name())
            .field("masks", &self.masks)
            .finish()
    }
}

impl<'a> SnippetBuilder<'a> {
    /// Create a builder over the host configuration.
    pub fn new(config: &'a SearchConfig, stemmer: &'a dyn Stemmer) -> Result<Self> {
        let masks = config
            .highlight_mask_regexes
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    SedgeError::invalid_argument(format!(
                        "bad highlight mask regex {pattern:?}: {e}"
                    ))
                })
            })
            .collect::<Result<Vec<Regex>>>()?;
        Ok(SnippetBuilder {
            config,
            stemmer,
            masks,
        })
    }

    /// Fetch, highlight and attach snippets for every displayed result.
    pub fn build(
        &self,
        result_set: &mut ResultSet,
        storage: &dyn IndexStorage,
        query_stems: &[String],
    ) -> Result<()> {
        let external_ids = wrap_logic(result_set.sorted_external_ids())?.to_vec();
        if external_ids.is_empty() {
            return Ok(());
        }

        let mut query = SnippetQuery::default();
        for external_id in &external_ids {
            let by_word = wrap_logic(result_set.found_word_positions_by_external_id(external_id))?;
            let mut positions: Vec<i32> = by_word.values().flatten().copied().collect();
            positions.sort_unstable();
            positions.dedup();
            query.requests.push(SnippetRequest {
                external_id: external_id.clone(),
                positions,
            });
        }

        let rows = storage.get_snippets(&query)?;

        let stems: AHashSet<&str> = query_stems.iter().map(String::as_str).collect();
        for external_id in &external_ids {
            let fragments: Vec<String> = rows
                .iter()
                .filter(|row| row.external_id == *external_id)
                .map(|row| self.highlight(&row.text, &stems))
                .collect();
            if fragments.is_empty() {
                continue;
            }
            let snippet = fragments.join(&self.config.snippet_line_separator);
            wrap_logic(result_set.attach_snippet(external_id, snippet))?;
        }
        Ok(())
    }

    /// Wrap every word-like run whose stem is a query stem in the highlight
    /// template.
    fn highlight(&self, text: &str, query_stems: &AHashSet<&str>) -> String {
        let mut highlighted = text.to_string();
        for mask in &self.masks {
            highlighted = mask
                .replace_all(&highlighted, |caps: &regex::Captures<'_>| {
                    let matched = &caps[0];
                    if query_stems.contains(self.stemmer.stem_word(matched, false).as_str()) {
                        self.config.highlight_template.replace("{word}", matched)
                    } else {
                        matched.to_string()
                    }
                })
                .into_owned();
        }
        highlighted
    }
}

/// Frozen-set misuse in this stage is an invariant violation.
fn wrap_logic<T>(result: Result<T>) -> Result<T> {
    result.map_err(|err| match err {
        SedgeError::Immutable(msg) | SedgeError::UnknownId(msg) => {
            SedgeError::logic(format!("snippet assembly against result set: {msg}"))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stemmer::{IdentityStemmer, PorterStemmer};

    fn builder_config() -> SearchConfig {
        SearchConfig::default()
    }

    #[test]
    fn test_highlight_whole_words() {
        let config = builder_config();
        let stemmer = IdentityStemmer::new();
        let builder = SnippetBuilder::new(&config, &stemmer).unwrap();
        let stems: AHashSet<&str> = ["world"].into_iter().collect();

        assert_eq!(
            builder.highlight("hello world", &stems),
            "hello <b>world</b>"
        );
    }

    #[test]
    fn test_highlight_matches_by_stem() {
        let config = builder_config();
        let stemmer = PorterStemmer::new();
        let builder = SnippetBuilder::new(&config, &stemmer).unwrap();
        // The query stem for "running" is "run".
        let stems: AHashSet<&str> = ["run"].into_iter().collect();

        assert_eq!(
            builder.highlight("keep running daily", &stems),
            "keep <b>running</b> daily"
        );
    }

    #[test]
    fn test_highlight_skips_trailing_punctuation() {
        let config = builder_config();
        let stemmer = IdentityStemmer::new();
        let builder = SnippetBuilder::new(&config, &stemmer).unwrap();
        let stems: AHashSet<&str> = ["world"].into_iter().collect();

        assert_eq!(
            builder.highlight("Hello world.", &stems),
            "Hello <b>world</b>."
        );
    }

    #[test]
    fn test_highlight_compound_words() {
        let config = builder_config();
        let stemmer = IdentityStemmer::new();
        let builder = SnippetBuilder::new(&config, &stemmer).unwrap();
        let stems: AHashSet<&str> = ["well-known"].into_iter().collect();

        assert_eq!(
            builder.highlight("a well-known fact", &stems),
            "a <b>well-known</b> fact"
        );
    }

    #[test]
    fn test_custom_template() {
        let config = SearchConfig {
            highlight_template: "<em class=\"hit\">{word}</em>".to_string(),
            ..SearchConfig::default()
        };
        let stemmer = IdentityStemmer::new();
        let builder = SnippetBuilder::new(&config, &stemmer).unwrap();
        let stems: AHashSet<&str> = ["x"].into_iter().collect();

        assert_eq!(
            builder.highlight("x marks", &stems),
            "<em class=\"hit\">x</em> marks"
        );
    }

    #[test]
    fn test_bad_mask_regex_is_invalid_argument() {
        let config = SearchConfig {
            highlight_mask_regexes: vec!["(".to_string()],
            ..SearchConfig::default()
        };
        let stemmer = IdentityStemmer::new();
        let err = SnippetBuilder::new(&config, &stemmer).unwrap_err();
        assert!(matches!(err, SedgeError::InvalidArgument(_)));
    }

    #[test]
    fn test_wrap_logic_rewraps_result_set_errors() {
        let wrapped = wrap_logic::<()>(Err(SedgeError::immutable("boom"))).unwrap_err();
        assert!(matches!(wrapped, SedgeError::Logic(_)));

        let wrapped = wrap_logic::<()>(Err(SedgeError::unknown_id("ghost"))).unwrap_err();
        assert!(matches!(wrapped, SedgeError::Logic(_)));

        let passthrough = wrap_logic::<()>(Err(SedgeError::empty_index("x"))).unwrap_err();
        assert!(passthrough.is_empty_index());
    }
}
