//! Validators for non-article posts (video, audio, interactive).
//!
//! Each content type is described by a [`PostProfile`]; a single
//! [`process_post`] drives all of them.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};
use url::Url;

use editorial_markdown::FrontmatterExtractor;
use editorial_shared::{
    BODY_FIELD, ContentType, Metadata, ProcessStatus, ScriptReport, file_name_of, has_value,
    non_empty_str,
};

use crate::io::{read_text, write_json_pretty};

/// Field and folder layout of one post type.
#[derive(Debug, Clone, Copy)]
pub struct PostProfile {
    pub content_type: ContentType,
    /// At least one of these must be present.
    pub locators: &'static [&'static str],
    /// Single-path asset fields rewritten to the asset folder.
    pub asset_fields: &'static [&'static str],
    /// Asset fields whose absolute URLs are kept unchanged.
    pub url_passthrough: &'static [&'static str],
    /// A list of asset paths rewritten under `required/`.
    pub list_field: Option<&'static str>,
    /// Folder under `/assets/`.
    pub folder: &'static str,
}

impl PostProfile {
    pub const VIDEO: Self = Self {
        content_type: ContentType::Video,
        locators: &["video_url", "embed_code"],
        asset_fields: &["thumbnail_image_path", "transcript_path", "header_image_path"],
        url_passthrough: &[],
        list_field: None,
        folder: "videos",
    };

    pub const AUDIO: Self = Self {
        content_type: ContentType::Audio,
        locators: &["audio_url"],
        asset_fields: &[
            "episode_artwork_path",
            "shownotes_path",
            "header_image_path",
            "audio_file_path",
        ],
        url_passthrough: &[],
        list_field: None,
        folder: "audio",
    };

    pub const INTERACTIVE: Self = Self {
        content_type: ContentType::Interactive,
        locators: &["live_url", "bootstrap_script_path"],
        asset_fields: &[
            "thumbnail_image_path",
            "instructions_path",
            "bootstrap_script_path",
            "header_image_path",
        ],
        url_passthrough: &["bootstrap_script_path"],
        list_field: Some("required_assets_paths"),
        folder: "interactive",
    };

    /// Profile for a post content type. Articles have none.
    pub fn for_type(content_type: ContentType) -> Option<Self> {
        match content_type {
            ContentType::Video => Some(Self::VIDEO),
            ContentType::Audio => Some(Self::AUDIO),
            ContentType::Interactive => Some(Self::INTERACTIVE),
            ContentType::Article => None,
        }
    }

    fn asset_path(&self, id: &str, original: &str) -> String {
        format!("/assets/{}/{id}/{}", self.folder, file_name_of(original))
    }

    fn required_asset_path(&self, id: &str, original: &str) -> String {
        format!("/assets/{}/{id}/required/{}", self.folder, file_name_of(original))
    }
}

/// Outcome of processing one post file.
#[derive(Debug, Clone, Serialize)]
pub struct PostResult {
    pub status: ProcessStatus,
    pub id: String,
    pub output_file: Option<PathBuf>,
    pub errors: Vec<String>,
    /// The processed metadata without the Markdown body.
    pub metadata_summary: Metadata,
}

impl PostResult {
    fn failed(id: String, errors: Vec<String>, metadata: &Metadata) -> Self {
        Self {
            status: ProcessStatus::Failure,
            id,
            output_file: None,
            errors,
            metadata_summary: summarize(metadata),
        }
    }

    pub fn into_report(self, profile: &PostProfile) -> ScriptReport {
        let kind = profile.content_type;
        let mut summary = match self.status {
            ProcessStatus::Success => format!("Successfully processed {kind} post '{}'.", self.id),
            ProcessStatus::SuccessWithWarnings => {
                format!("Processed {kind} post '{}' with warnings.", self.id)
            }
            ProcessStatus::Failure => format!("Failed to process {kind} post '{}'.", self.id),
        };
        if let Some(path) = &self.output_file {
            summary.push_str(&format!(" Metadata saved to {}.", path.display()));
        }

        ScriptReport {
            status: self.status,
            modified_file: self.output_file.map(|p| p.display().to_string()),
            summary,
            errors: self.errors,
            details: json!({
                "article_id": self.id,
                "processed_metadata_summary": self.metadata_summary,
            }),
        }
    }
}

fn summarize(metadata: &Metadata) -> Metadata {
    metadata
        .iter()
        .filter(|(k, _)| k.as_str() != BODY_FIELD)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Whether `value` is an absolute `http(s)` URL.
pub fn is_web_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Id derived from a file stem: lowercased, spaces replaced by `_`.
pub fn id_from_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_").to_lowercase())
        .unwrap_or_default()
}

/// Validate one post file and write `<id>_metadata.json` on success.
#[instrument(skip(extractor), fields(kind = %profile.content_type, input = %input.display()))]
pub fn process_post(
    input: &Path,
    output_dir: &Path,
    profile: &PostProfile,
    extractor: &FrontmatterExtractor,
) -> PostResult {
    let mut id = id_from_stem(input);
    let mut errors: Vec<String> = Vec::new();

    let text = match read_text(input) {
        Ok(t) => t,
        Err(e) => {
            errors.push(format!("Input file not readable: {e}"));
            return PostResult::failed(id, errors, &Metadata::new());
        }
    };

    let extracted = extractor.extract(&text);
    if let Some(warning) = extracted.warning {
        errors.push(warning);
    }
    let mut metadata = extracted.metadata;

    match non_empty_str(&metadata, "id") {
        Some(given) => id = given.to_string(),
        None => {
            metadata.insert("id".into(), Value::String(id.clone()));
        }
    }

    if !extracted.body.is_empty() {
        metadata.insert(BODY_FIELD.into(), Value::String(extracted.body));
    }

    let expected = profile.content_type.as_str();
    if metadata.get("contentType").and_then(Value::as_str) != Some(expected) {
        let found = metadata.get("contentType").cloned().unwrap_or(Value::Null);
        errors.push(format!("contentType is not '{expected}' or is missing. Found: {found}"));
        return PostResult::failed(id, errors, &metadata);
    }

    let mut fatal = false;
    if !has_value(&metadata, "title") {
        errors.push("Mandatory field 'title' is missing.".into());
        fatal = true;
    }
    if !profile.locators.iter().any(|f| has_value(&metadata, f)) {
        errors.push(format!(
            "One of {} must be provided for a {expected} post.",
            profile
                .locators
                .iter()
                .map(|f| format!("'{f}'"))
                .collect::<Vec<_>>()
                .join(" or ")
        ));
        fatal = true;
    }

    rewrite_asset_fields(&mut metadata, profile, &id, &mut errors);
    if let Some(field) = profile.list_field {
        rewrite_list_field(&mut metadata, profile, field, &id, &mut errors);
    }

    if fatal {
        errors.push("Critical fields are missing, setting status to failure.".into());
        return PostResult::failed(id, errors, &metadata);
    }

    let output_file = output_dir.join(format!("{id}_metadata.json"));
    if let Err(e) = write_json_pretty(&output_file, &Value::Object(metadata.clone())) {
        errors.push(format!("Failed to write metadata: {e}"));
        return PostResult::failed(id, errors, &metadata);
    }

    let status = ProcessStatus::from_warnings(&errors);
    info!(%id, ?status, output = %output_file.display(), "post processed");

    PostResult {
        status,
        id,
        output_file: Some(output_file),
        errors,
        metadata_summary: summarize(&metadata),
    }
}

fn rewrite_asset_fields(
    metadata: &mut Metadata,
    profile: &PostProfile,
    id: &str,
    errors: &mut Vec<String>,
) {
    for &field in profile.asset_fields {
        let original = match metadata.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(other) if editorial_shared::is_truthy(other) => {
                warn!(field, "asset field is not a string");
                errors.push(format!("Asset field '{field}' is not a path string; left unchanged."));
                continue;
            }
            _ => {
                metadata.insert(field.to_string(), Value::Null);
                continue;
            }
        };

        let rewritten = if profile.url_passthrough.contains(&field) && is_web_url(&original) {
            original.clone()
        } else {
            profile.asset_path(id, &original)
        };
        metadata.insert(format!("{field}_original"), Value::String(original));
        metadata.insert(field.to_string(), Value::String(rewritten));
    }
}

fn rewrite_list_field(
    metadata: &mut Metadata,
    profile: &PostProfile,
    field: &str,
    id: &str,
    errors: &mut Vec<String>,
) {
    let items = match metadata.get(field) {
        None => {
            metadata.insert(field.to_string(), Value::Array(Vec::new()));
            return;
        }
        Some(Value::Array(items)) => items.clone(),
        Some(_) => {
            errors.push(format!("'{field}' is not a list; left unchanged."));
            return;
        }
    };

    let mut originals = Vec::new();
    let mut rewritten = Vec::new();
    for item in items {
        let path = match &item {
            Value::String(s) => s.clone(),
            Value::Object(obj) => match obj.get("path").and_then(Value::as_str) {
                Some(p) => p.to_string(),
                None => {
                    errors.push(format!("Invalid item in {field}: {item}"));
                    continue;
                }
            },
            _ => {
                errors.push(format!("Invalid item in {field}: {item}"));
                continue;
            }
        };

        let new_path = if is_web_url(&path) {
            path
        } else {
            profile.required_asset_path(id, &path)
        };
        let new_item = match &item {
            Value::Object(obj) => {
                let mut obj = obj.clone();
                obj.insert("path".into(), Value::String(new_path));
                Value::Object(obj)
            }
            _ => Value::String(new_path),
        };
        originals.push(item);
        rewritten.push(new_item);
    }

    metadata.insert(format!("{field}_original"), Value::Array(originals));
    metadata.insert(field.to_string(), Value::Array(rewritten));
}
