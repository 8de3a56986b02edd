//! HTML extraction strategy.
//!
//! Splits markup into paragraphs at block-level boundaries, strips tags and
//! entities, and harvests `<img>` references. Malformed markup is not an
//! error; problems surface as warnings on the extraction result.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::extract::sentence_map::{SentenceFormat, SentenceMap};
use crate::extract::{ContentWithMetadata, ExtractionResult, Extractor, ImageRef};

fn tag_probe_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[a-zA-Z!/]").unwrap())
}

fn dropped_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->").unwrap()
    })
}

fn img_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?is)<img\b[^>]*>"#).unwrap())
}

fn attr_regex(attr: &'static str, holder: &'static OnceLock<Regex>) -> &'static Regex {
    holder.get_or_init(|| {
        Regex::new(&format!(r#"(?is)\b{attr}\s*=\s*["']([^"']*)["']"#)).unwrap()
    })
}

fn src_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    attr_regex("src", &RE)
}

fn alt_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    attr_regex("alt", &RE)
}

fn href_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    attr_regex("href", &RE)
}

fn block_boundary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)</?(?:p|div|section|article|header|footer|aside|main|table|tr|ul|ol|li|blockquote|pre|h[1-6])\b[^>]*>|<br\s*/?>|<hr\s*/?>",
        )
        .unwrap()
    })
}

fn any_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

fn numeric_entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#(x?)([0-9a-fA-F]{1,7});").unwrap())
}

/// Decode the common named entities and all numeric character references.
fn decode_entities(text: &str) -> String {
    let text = numeric_entity_regex().replace_all(text, |caps: &regex::Captures<'_>| {
        let radix = if caps[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&caps[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Extraction strategy for HTML-like documents.
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// Create a new HTML extractor.
    pub fn new() -> Self {
        HtmlExtractor
    }

    fn collect_images(&self, text: &str) -> Vec<ImageRef> {
        img_regex()
            .find_iter(text)
            .filter_map(|m| {
                let tag = m.as_str();
                let url = src_attr_regex().captures(tag)?.get(1)?.as_str().to_string();
                let alt = alt_attr_regex()
                    .captures(tag)
                    .and_then(|c| c.get(1))
                    .map(|m| decode_entities(m.as_str()))
                    .filter(|alt| !alt.is_empty());
                Some(ImageRef { url, alt })
            })
            .collect()
    }
}

impl Extractor for HtmlExtractor {
    fn supports(&self, text: &str) -> bool {
        tag_probe_regex().is_match(text)
    }

    fn extract(&self, text: &str) -> Result<ExtractionResult> {
        let mut warnings = Vec::new();

        let open_angles = text.matches('<').count();
        let close_angles = text.matches('>').count();
        if open_angles != close_angles {
            warnings.push(format!(
                "unbalanced markup: {open_angles} '<' vs {close_angles} '>'"
            ));
        }

        let cleaned = dropped_block_regex().replace_all(text, " ");
        let images = self.collect_images(&cleaned);

        let mut sentence_map = SentenceMap::new();
        for paragraph in block_boundary_regex().split(&cleaned) {
            let url = href_attr_regex()
                .captures(paragraph)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            let stripped = any_tag_regex().replace_all(paragraph, " ");
            let decoded = decode_entities(&stripped);
            let trimmed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
            if trimmed.is_empty() {
                continue;
            }
            sentence_map.push(url, trimmed, SentenceFormat::Plain);
        }

        if sentence_map.is_empty() {
            warnings.push("document yielded no text content".to_string());
        }

        Ok(ExtractionResult {
            content: ContentWithMetadata {
                sentence_map,
                images,
            },
            warnings,
        })
    }

    fn name(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_markup_only() {
        let extractor = HtmlExtractor::new();
        assert!(extractor.supports("<p>hi</p>"));
        assert!(extractor.supports("text with <!-- comment -->"));
        assert!(!extractor.supports("3 < 4 and 5 > 4"));
        assert!(!extractor.supports("plain text"));
    }

    #[test]
    fn test_paragraph_split() {
        let extractor = HtmlExtractor::new();
        let result = extractor
            .extract("<h1>Title Here</h1><p>First paragraph.</p><p>Second one.</p>")
            .unwrap();

        let texts: Vec<&str> = result
            .content
            .sentence_map
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Title Here", "First paragraph.", "Second one."]);
    }

    #[test]
    fn test_inline_tags_do_not_split() {
        let extractor = HtmlExtractor::new();
        let result = extractor
            .extract("<p>some <b>bold</b> and <a href=\"/x\">linked</a> words</p>")
            .unwrap();

        assert_eq!(result.content.sentence_map.len(), 1);
        let sentence = result.content.sentence_map.iter().next().unwrap();
        assert_eq!(sentence.text, "some bold and linked words");
        assert_eq!(sentence.url.as_deref(), Some("/x"));
    }

    #[test]
    fn test_script_and_style_dropped() {
        let extractor = HtmlExtractor::new();
        let result = extractor
            .extract("<p>keep</p><script>var x = 'drop';</script><style>p{}</style>")
            .unwrap();

        let texts: Vec<&str> = result
            .content
            .sentence_map
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(texts, vec!["keep"]);
    }

    #[test]
    fn test_entities_decoded() {
        let extractor = HtmlExtractor::new();
        let result = extractor
            .extract("<p>fish &amp; chips &#233;clair</p>")
            .unwrap();

        let sentence = result.content.sentence_map.iter().next().unwrap();
        assert_eq!(sentence.text, "fish & chips éclair");
    }

    #[test]
    fn test_images_collected() {
        let extractor = HtmlExtractor::new();
        let result = extractor
            .extract("<p>x</p><img src=\"a.png\" alt=\"A picture\"><img src='b.png'>")
            .unwrap();

        assert_eq!(
            result.content.images,
            vec![
                ImageRef {
                    url: "a.png".to_string(),
                    alt: Some("A picture".to_string()),
                },
                ImageRef {
                    url: "b.png".to_string(),
                    alt: None,
                },
            ]
        );
    }

    #[test]
    fn test_unbalanced_markup_warns() {
        let extractor = HtmlExtractor::new();
        let result = extractor.extract("<p>broken <b").unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("unbalanced")));
    }
}
