//! Finalization: fold accepted suggestions into the metadata and publish
//! staged assets to the live asset root.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use editorial_shared::{
    AssetKind, Metadata, ProcessStatus, Result, SUGGESTIONS_FIELD, ScriptReport, file_name_of,
};

use crate::assets::PROCESSED_PREFIX;
use crate::io::{copy_file, read_json_object, write_json_pretty};

/// An original excerpt shorter than this is replaced by the suggestion.
const PLACEHOLDER_EXCERPT_LEN: usize = 20;

/// Asset fields published at finalization: (field, kind, is_list).
pub const ASSET_FIELDS: &[(&str, AssetKind, bool)] = &[
    ("header_image_path", AssetKind::Images, false),
    ("thumbnail_image_path", AssetKind::Images, false),
    ("figure_image_path", AssetKind::Images, false),
    ("inline_images", AssetKind::Images, true),
    ("gallery_images", AssetKind::Images, true),
    ("audio_clip_path", AssetKind::Audio, false),
    ("podcast_episode_path", AssetKind::Audio, false),
    ("background_tracks", AssetKind::Audio, true),
    ("linked_document_pdf", AssetKind::Documents, false),
];

#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    /// `<staging_root>/<batch>`.
    pub staging_dir: PathBuf,
    pub base: String,
    /// Disk root of the processed-assets tree.
    pub processed_root: PathBuf,
    /// Disk root assets are published to.
    pub live_root: PathBuf,
    /// URL prefix of published assets, e.g. `/assets`.
    pub live_prefix: String,
}

impl FinalizeRequest {
    pub fn metadata_path(&self) -> PathBuf {
        self.staging_dir.join(format!("{}_metadata.json", self.base))
    }

    pub fn output_path(&self) -> PathBuf {
        self.staging_dir
            .join(format!("{}_final_for_router.json", self.base))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovedAsset {
    pub field: String,
    pub staged_path: String,
    pub live_disk_path: String,
    pub live_router_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetError {
    pub field: String,
    pub path: String,
    pub error: String,
}

/// Apply `ai_suggestions` to the editable fields. Returns the fields changed.
/// The suggestions themselves stay in place.
pub fn merge_ai_suggestions(metadata: &mut Metadata) -> Vec<&'static str> {
    let Some(Value::Object(suggestions)) = metadata.get(SUGGESTIONS_FIELD).cloned() else {
        return Vec::new();
    };
    let mut changed = Vec::new();

    if let Some(excerpt) = suggestions
        .get("suggested_excerpt")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        let original_len = metadata
            .get("excerpt")
            .and_then(Value::as_str)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        if original_len < PLACEHOLDER_EXCERPT_LEN {
            metadata.insert("excerpt".into(), json!(excerpt));
            changed.push("excerpt");
        }
    }

    let category = match suggestions.get("suggested_categories") {
        Some(Value::Array(items)) => items.first().cloned(),
        Some(Value::String(s)) if !s.is_empty() => Some(json!(s)),
        _ => None,
    };
    if let Some(category) = category {
        metadata.insert("category".into(), category);
        changed.push("category");
    }

    if let Some(Value::Array(tags)) = suggestions.get("suggested_tags") {
        if !tags.is_empty() {
            metadata.insert("tags".into(), Value::Array(tags.clone()));
            changed.push("tags");
        }
    }

    changed
}

/// Copy staged assets of this article to the live root and rewrite their paths.
pub fn publish_assets(
    metadata: &mut Metadata,
    req: &FinalizeRequest,
) -> (Vec<MovedAsset>, Vec<AssetError>) {
    let mut moved = Vec::new();
    let mut errors = Vec::new();

    for &(field, kind, is_list) in ASSET_FIELDS {
        let items = match (metadata.get(field), is_list) {
            (Some(Value::Array(items)), true) => items.clone(),
            (Some(Value::String(s)), false) if !s.trim().is_empty() => vec![json!(s)],
            _ => continue,
        };

        let prefix = format!("{PROCESSED_PREFIX}/{}/{}/", kind.folder(), req.base);
        let mut updated = Vec::with_capacity(items.len());
        for item in items {
            let Some(staged) = item.as_str().filter(|s| s.starts_with(&prefix)) else {
                updated.push(item);
                continue;
            };

            let file_name = file_name_of(staged);
            let source = req
                .processed_root
                .join(staged.trim_start_matches(PROCESSED_PREFIX).trim_start_matches('/'));
            let destination = req.live_root.join(kind.folder()).join(&req.base).join(file_name);
            let router_path = format!(
                "{}/{}/{}/{file_name}",
                req.live_prefix.trim_end_matches('/'),
                kind.folder(),
                req.base
            );

            match copy_file(&source, &destination) {
                Ok(()) => {
                    moved.push(MovedAsset {
                        field: field.to_string(),
                        staged_path: staged.to_string(),
                        live_disk_path: destination.display().to_string(),
                        live_router_path: router_path.clone(),
                    });
                    updated.push(json!(router_path));
                }
                Err(e) => {
                    warn!(field, staged, error = %e, "asset not published");
                    errors.push(AssetError {
                        field: field.to_string(),
                        path: staged.to_string(),
                        error: format!("Failed to copy to live location: {e}"),
                    });
                    updated.push(item.clone());
                }
            }
        }

        let value = if is_list {
            Value::Array(updated)
        } else {
            updated.into_iter().next().unwrap_or(Value::Null)
        };
        metadata.insert(field.to_string(), value);
    }

    (moved, errors)
}

/// `finalize` stage: merge suggestions, publish assets, and write
/// `<base>_final_for_router.json`.
#[instrument(skip_all, fields(base = %req.base))]
pub fn finalize_file(req: &FinalizeRequest) -> Result<ScriptReport> {
    let metadata_path = req.metadata_path();
    let mut metadata = match read_json_object(&metadata_path) {
        Ok(m) => m,
        Err(e) => {
            return Ok(ScriptReport::failure(
                format!("Failed to load metadata for {}.", req.base),
                format!("Error loading metadata: {e}"),
            ));
        }
    };

    let merged = merge_ai_suggestions(&mut metadata);
    let (moved, asset_errors) = publish_assets(&mut metadata, req);
    metadata.insert("finalized_at".into(), json!(Utc::now().to_rfc3339()));

    let output = req.output_path();
    write_json_pretty(&output, &Value::Object(metadata))?;
    info!(merged = ?merged, moved = moved.len(), errors = asset_errors.len(), "article finalized");

    let mut summary = format!(
        "Finalized data and assets for '{}'. Output: {}_final_for_router.json.",
        req.base, req.base
    );
    if !asset_errors.is_empty() {
        summary.push_str(&format!(" Encountered {} asset moving errors.", asset_errors.len()));
    }

    let errors: Vec<String> = asset_errors
        .iter()
        .map(|e| format!("{} ({}): {}", e.field, e.path, e.error))
        .collect();

    Ok(ScriptReport {
        status: ProcessStatus::from_warnings(&errors),
        modified_file: Some(output.display().to_string()),
        summary,
        errors,
        details: json!({
            "merged_fields": merged,
            "moved_assets_log": moved,
            "asset_errors": asset_errors,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(root: &std::path::Path) -> FinalizeRequest {
        FinalizeRequest {
            staging_dir: root.join("staging/batch1"),
            base: "essay".into(),
            processed_root: root.join("processed_assets"),
            live_root: root.join("live"),
            live_prefix: "/assets/".into(),
        }
    }

    fn meta(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn merges_suggestions_by_rule() {
        let mut metadata = meta(json!({
            "excerpt": "short",
            "category": "Old",
            "tags": ["x"],
            SUGGESTIONS_FIELD: {
                "suggested_excerpt": "A generated excerpt.",
                "suggested_categories": ["media theory", "glitch"],
                "suggested_tags": ["a", "b"],
            },
        }));
        let changed = merge_ai_suggestions(&mut metadata);
        assert_eq!(changed, vec!["excerpt", "category", "tags"]);
        assert_eq!(metadata["excerpt"], json!("A generated excerpt."));
        assert_eq!(metadata["category"], json!("media theory"));
        assert_eq!(metadata["tags"], json!(["a", "b"]));
        assert!(metadata.contains_key(SUGGESTIONS_FIELD));
    }

    #[test]
    fn keeps_real_excerpt() {
        let mut metadata = meta(json!({
            "excerpt": "This excerpt is long enough to keep.",
            SUGGESTIONS_FIELD: { "suggested_excerpt": "Other." },
        }));
        assert!(merge_ai_suggestions(&mut metadata).is_empty());
        assert_eq!(metadata["excerpt"], json!("This excerpt is long enough to keep."));
    }

    #[test]
    fn publishes_only_processed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let staged_dir = req.processed_root.join("images/essay");
        std::fs::create_dir_all(&staged_dir).unwrap();
        std::fs::write(staged_dir.join("header.png"), b"png").unwrap();

        let mut metadata = meta(json!({
            "header_image_path": "/content_pipeline/processed_assets/images/essay/header.png",
            "gallery_images": [
                "https://cdn.test/remote.png",
                "/content_pipeline/processed_assets/images/essay/missing.png",
                "/content_pipeline/processed_assets/images/other/header.png",
            ],
        }));
        let (moved, errors) = publish_assets(&mut metadata, &req);

        assert_eq!(moved.len(), 1);
        assert!(req.live_root.join("images/essay/header.png").is_file());
        assert_eq!(metadata["header_image_path"], json!("/assets/images/essay/header.png"));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "gallery_images");
        assert_eq!(
            metadata["gallery_images"],
            json!([
                "https://cdn.test/remote.png",
                "/content_pipeline/processed_assets/images/essay/missing.png",
                "/content_pipeline/processed_assets/images/other/header.png",
            ])
        );
    }

    #[test]
    fn finalize_writes_router_file() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        std::fs::create_dir_all(&req.staging_dir).unwrap();
        std::fs::write(
            req.metadata_path(),
            json!({ "id": "essay", "title": "Essay", SUGGESTIONS_FIELD: { "suggested_tags": ["t"] } })
                .to_string(),
        )
        .unwrap();

        let report = finalize_file(&req).unwrap();
        assert_eq!(report.status, ProcessStatus::Success);

        let written = read_json_object(&req.output_path()).unwrap();
        assert_eq!(written["tags"], json!(["t"]));
        let stamp = written["finalized_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn finalize_without_metadata_fails() {
        let dir = tempfile::tempdir().unwrap();
        let report = finalize_file(&request(dir.path())).unwrap();
        assert!(report.status.is_failure());
    }
}
