//! Frontmatter/body extraction.
//!
//! A document carries at most one metadata block, delimited by two lines whose
//! trimmed content is exactly `---`:
//!
//! ```text
//! ---
//! title: "Signals and Noise"
//! contentType: article
//! tags: [media, theory]
//! ---
//! Body text starts here.
//! ```
//!
//! Anything before the first delimiter is ignored. When the delimiter does not
//! occur exactly twice the whole text is body and [`Extracted::warning`] says
//! why. Extraction never fails: a block the primary [`MetadataParser`] rejects
//! is handed to the fallback parser, and the body is returned regardless.

use editorial_shared::{EditorialError, FrontmatterStrategy, Metadata, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// The delimiter line, compared after trimming.
pub const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Parser strategies
// ---------------------------------------------------------------------------

/// Turns the text between the delimiters into a key-value mapping.
pub trait MetadataParser: Send + Sync {
    /// Short name used in warnings and logs.
    fn name(&self) -> &'static str;

    /// Parse a metadata block. An empty block yields an empty mapping.
    fn parse(&self, block: &str) -> Result<Metadata>;
}

/// Full YAML via `serde_yaml`. Rejects blocks that are not a string-keyed mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlParser;

impl MetadataParser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, block: &str) -> Result<Metadata> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(block)
            .map_err(|e| EditorialError::parse(format!("invalid YAML: {e}")))?;

        match yaml {
            serde_yaml::Value::Null => Ok(Metadata::new()),
            serde_yaml::Value::Mapping(_) => match serde_json::to_value(&yaml) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) => Err(EditorialError::parse("YAML mapping did not convert to an object")),
                Err(e) => Err(EditorialError::parse(format!(
                    "YAML mapping is not JSON-compatible: {e}"
                ))),
            },
            other => Err(EditorialError::parse(format!(
                "frontmatter must be a mapping, found {}",
                yaml_kind(&other)
            ))),
        }
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Line-by-line `key: value` splitting. Values are strings with one layer of
/// matching surrounding quotes removed; lines without a colon are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyValueParser;

impl MetadataParser for KeyValueParser {
    fn name(&self) -> &'static str {
        "key-value"
    }

    fn parse(&self, block: &str) -> Result<Metadata> {
        let mut map = Metadata::new();
        for line in block.trim().lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            map.insert(key.to_string(), Value::String(strip_quotes(value.trim()).to_string()));
        }
        Ok(map)
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Result of splitting a document into metadata and body.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    /// Parsed metadata; empty when no block was found or nothing parsed.
    pub metadata: Metadata,
    /// Trimmed body text. Always populated.
    pub body: String,
    /// Why the metadata may be incomplete. Not an error.
    pub warning: Option<String>,
    /// Whether exactly two delimiter lines were found.
    pub delimited: bool,
}

/// Splits documents using a primary parser and an optional fallback.
pub struct FrontmatterExtractor {
    primary: Box<dyn MetadataParser>,
    fallback: Option<Box<dyn MetadataParser>>,
}

impl std::fmt::Debug for FrontmatterExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontmatterExtractor")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl Default for FrontmatterExtractor {
    fn default() -> Self {
        Self::from_strategy(FrontmatterStrategy::Yaml)
    }
}

impl FrontmatterExtractor {
    pub fn new(
        primary: Box<dyn MetadataParser>,
        fallback: Option<Box<dyn MetadataParser>>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Build the parser chain selected in configuration.
    pub fn from_strategy(strategy: FrontmatterStrategy) -> Self {
        match strategy {
            FrontmatterStrategy::Yaml => {
                Self::new(Box::new(YamlParser), Some(Box::new(KeyValueParser)))
            }
            FrontmatterStrategy::KeyValue => Self::new(Box::new(KeyValueParser), None),
        }
    }

    /// Name of the primary parser.
    pub fn primary_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Split `text` into metadata and body.
    pub fn extract(&self, text: &str) -> Extracted {
        let Some((block, body)) = split_block(text) else {
            let count = count_delimiters(text);
            debug!(delimiters = count, "no frontmatter block");
            return Extracted {
                metadata: Metadata::new(),
                body: text.trim().to_string(),
                warning: Some(format!(
                    "no frontmatter block: found {count} '{DELIMITER}' line(s), expected exactly 2"
                )),
                delimited: false,
            };
        };

        let body = body.trim().to_string();
        let (metadata, warning) = self.parse_block(block);

        Extracted {
            metadata,
            body,
            warning,
            delimited: true,
        }
    }

    fn parse_block(&self, block: &str) -> (Metadata, Option<String>) {
        let primary_err = match self.primary.parse(block) {
            Ok(map) => return (map, None),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            warn!(parser = self.primary.name(), error = %primary_err, "frontmatter parse failed");
            return (
                Metadata::new(),
                Some(format!("{} frontmatter unreadable: {primary_err}", self.primary.name())),
            );
        };

        match fallback.parse(block) {
            Ok(map) => {
                warn!(
                    parser = self.primary.name(),
                    fallback = fallback.name(),
                    fields = map.len(),
                    error = %primary_err,
                    "frontmatter recovered with fallback parser"
                );
                let note = format!(
                    "{} frontmatter unreadable ({primary_err}); recovered {} field(s) with {} fallback",
                    self.primary.name(),
                    map.len(),
                    fallback.name()
                );
                (map, Some(note))
            }
            Err(fallback_err) => (
                Metadata::new(),
                Some(format!(
                    "{} frontmatter unreadable ({primary_err}); {} fallback failed too ({fallback_err})",
                    self.primary.name(),
                    fallback.name()
                )),
            ),
        }
    }
}

/// Convenience wrapper using the default YAML → key-value chain.
pub fn extract(text: &str) -> Extracted {
    FrontmatterExtractor::default().extract(text)
}

/// Locate `(block, body)` when exactly two delimiter lines exist.
fn split_block(text: &str) -> Option<(&str, &str)> {
    let mut positions = Vec::with_capacity(2);
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim() == DELIMITER {
            positions.push((offset, offset + line.len()));
            if positions.len() > 2 {
                return None;
            }
        }
        offset += line.len();
    }

    match positions.as_slice() {
        [(_, first_end), (second_start, second_end)] => {
            Some((&text[*first_end..*second_start], &text[*second_end..]))
        }
        _ => None,
    }
}

fn count_delimiters(text: &str) -> usize {
    text.lines().filter(|line| line.trim() == DELIMITER).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_yaml_block_and_body() {
        let text = "---\ntitle: \"Signals\"\ncontentType: video\ntags:\n  - media\n  - theory\n---\n\nBody paragraph.\n";
        let result = extract(text);

        assert!(result.delimited);
        assert!(result.warning.is_none());
        assert_eq!(result.metadata["title"], json!("Signals"));
        assert_eq!(result.metadata["tags"], json!(["media", "theory"]));
        assert_eq!(result.body, "Body paragraph.");
    }

    #[test]
    fn text_before_first_delimiter_is_ignored() {
        let text = "preamble line\n---\ntitle: T\n---\nBody";
        let result = extract(text);
        assert_eq!(result.metadata["title"], json!("T"));
        assert_eq!(result.body, "Body");
        assert!(!result.body.contains("preamble"));
    }

    #[test]
    fn no_delimiters_means_whole_text_is_body() {
        let text = "\n  # Just Markdown\n\nSome text.\n\n";
        let result = extract(text);

        assert!(!result.delimited);
        assert!(result.metadata.is_empty());
        assert_eq!(result.body, text.trim());
        assert!(result.warning.as_deref().unwrap().contains("found 0"));
    }

    #[test]
    fn single_delimiter_means_whole_text_is_body() {
        let text = "---\ntitle: Unclosed\nBody";
        let result = extract(text);
        assert!(result.metadata.is_empty());
        assert_eq!(result.body, text.trim());
        assert!(result.warning.as_deref().unwrap().contains("found 1"));
    }

    #[test]
    fn three_delimiters_means_whole_text_is_body() {
        let text = "---\ntitle: T\n---\nIntro\n---\nAfter a rule";
        let result = extract(text);
        assert!(!result.delimited);
        assert!(result.metadata.is_empty());
        assert_eq!(result.body, text);
    }

    #[test]
    fn delimiter_lines_tolerate_surrounding_whitespace() {
        let text = "---  \ntitle: Spaced\n  ---\nBody";
        let result = extract(text);
        assert_eq!(result.metadata["title"], json!("Spaced"));
        assert_eq!(result.body, "Body");
    }

    #[test]
    fn invalid_yaml_falls_back_to_key_value() {
        let text = "---\ntitle: 'Broken: [yaml\nauthor: \"Ada\"\n---\nStill here.";
        let result = extract(text);

        assert!(result.delimited);
        let warning = result.warning.expect("fallback warning");
        assert!(warning.contains("key-value fallback"), "{warning}");
        assert_eq!(result.metadata["author"], json!("Ada"));
        assert_eq!(result.body, "Still here.");
    }

    #[test]
    fn non_mapping_yaml_falls_back() {
        let text = "---\n- just\n- a list\n---\nBody";
        let result = extract(text);
        assert!(result.metadata.is_empty());
        assert!(result.warning.is_some());
        assert_eq!(result.body, "Body");
    }

    #[test]
    fn empty_block_is_empty_mapping() {
        let result = extract("---\n---\nBody only");
        assert!(result.delimited);
        assert!(result.metadata.is_empty());
        assert!(result.warning.is_none());
        assert_eq!(result.body, "Body only");
    }

    #[test]
    fn key_value_parser_strips_matching_quotes() {
        let map = KeyValueParser
            .parse("title: \"Quoted\"\nsub: 'single'\nodd: \"mismatch'\nurl: https://x.test/a\nnocolon")
            .unwrap();
        assert_eq!(map["title"], json!("Quoted"));
        assert_eq!(map["sub"], json!("single"));
        assert_eq!(map["odd"], json!("\"mismatch'"));
        assert_eq!(map["url"], json!("https://x.test/a"));
        assert!(!map.contains_key("nocolon"));
    }

    #[test]
    fn key_value_strategy_has_no_yaml() {
        let extractor = FrontmatterExtractor::from_strategy(FrontmatterStrategy::KeyValue);
        assert_eq!(extractor.primary_name(), "key-value");
        let result = extractor.extract("---\ntags: [a, b]\n---\nBody");
        assert_eq!(result.metadata["tags"], json!("[a, b]"));
        assert!(result.warning.is_none());
    }

    #[test]
    fn body_is_non_empty_when_present() {
        let result = extract("---\ntitle: x\n---\n\n\nContent exists\n");
        assert!(!result.body.is_empty());
    }
}
