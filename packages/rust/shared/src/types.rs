//! Core domain types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed article metadata: an ordered JSON object map.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding the Markdown body for non-article posts.
pub const BODY_FIELD: &str = "description_markdown_body";

/// Metadata key that disables AI suggestions for an article.
pub const OVERRIDE_FIELD: &str = "jules_override_ai_suggestions";

/// Metadata key under which suggestions are merged.
pub const SUGGESTIONS_FIELD: &str = "ai_suggestions";

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// The `contentType` declared in an article's frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Video,
    Audio,
    Interactive,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Interactive => "interactive",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AssetKind
// ---------------------------------------------------------------------------

/// Asset families, named after their folder under the asset roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Images,
    Audio,
    Documents,
}

impl AssetKind {
    /// Folder name under `processed_assets/` and the live asset root.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Audio => "audio",
            Self::Documents => "documents",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder())
    }
}

// ---------------------------------------------------------------------------
// ProcessStatus + ScriptReport
// ---------------------------------------------------------------------------

/// Outcome of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Success,
    SuccessWithWarnings,
    Failure,
}

impl ProcessStatus {
    /// `Success` when `warnings` is empty, `SuccessWithWarnings` otherwise.
    pub fn from_warnings<T>(warnings: &[T]) -> Self {
        if warnings.is_empty() {
            Self::Success
        } else {
            Self::SuccessWithWarnings
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}

/// The single JSON object every CLI stage prints on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptReport {
    pub status: ProcessStatus,
    /// The key file written or modified by the stage, if any.
    pub modified_file: Option<String>,
    /// Human-readable summary of what happened.
    pub summary: String,
    pub errors: Vec<String>,
    /// Stage-specific payload (logs, suggestions, metadata summaries).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl ScriptReport {
    /// A failure report with a single error and no payload.
    pub fn failure(summary: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: ProcessStatus::Failure,
            modified_file: None,
            summary: summary.into(),
            errors: vec![error.into()],
            details: Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata helpers
// ---------------------------------------------------------------------------

/// Loose truthiness: null, false, 0, "" and empty containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Whether `key` is present in `metadata` with a truthy value.
pub fn has_value(metadata: &Metadata, key: &str) -> bool {
    metadata.get(key).is_some_and(is_truthy)
}

/// A non-blank string field.
pub fn non_empty_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Final path component of a `/`- or `\`-separated path string.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_type_serializes_lowercase() {
        let json = serde_json::to_string(&ContentType::Interactive).unwrap();
        assert_eq!(json, "\"interactive\"");
        let parsed: ContentType = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(parsed, ContentType::Video);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ProcessStatus::SuccessWithWarnings).unwrap();
        assert_eq!(json, "\"success_with_warnings\"");
        assert_eq!(ProcessStatus::from_warnings::<String>(&[]), ProcessStatus::Success);
        assert_eq!(
            ProcessStatus::from_warnings(&["x".to_string()]),
            ProcessStatus::SuccessWithWarnings
        );
    }

    #[test]
    fn failure_report_omits_null_details() {
        let report = ScriptReport::failure("Failed.", "input missing");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["errors"][0], "input missing");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn truthiness_matches_expectations() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(["a"])));
        assert!(is_truthy(&json!(true)));
    }

    #[test]
    fn file_name_of_handles_separators() {
        assert_eq!(file_name_of("images/header.png"), "header.png");
        assert_eq!(file_name_of("/a/b/c.mp3"), "c.mp3");
        assert_eq!(file_name_of("plain.pdf"), "plain.pdf");
        assert_eq!(file_name_of("dir\\win.txt"), "win.txt");
    }
}
