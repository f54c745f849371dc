//! Asset staging: copy referenced files into the processed-assets tree and
//! point the metadata at the staged copies.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use editorial_shared::{AssetKind, Metadata, ProcessStatus, Result, ScriptReport, file_name_of};

use crate::io::{copy_file, read_json_object, read_text, write_json_pretty};

/// Metadata path prefix of staged assets.
pub const PROCESSED_PREFIX: &str = "/content_pipeline/processed_assets";

/// Metadata path of a staged asset.
pub fn staged_path(kind: AssetKind, base: &str, file_name: &str) -> String {
    format!("{PROCESSED_PREFIX}/{}/{base}/{file_name}", kind.folder())
}

/// Inputs for one staging run.
#[derive(Debug, Clone)]
pub struct StageRequest {
    /// `<staging>/<batch>/<base>_metadata.json`.
    pub metadata_path: PathBuf,
    /// Directory relative asset paths are resolved against.
    pub incoming_dir: PathBuf,
    /// Disk root of the processed-assets tree.
    pub processed_root: PathBuf,
    pub base: String,
    pub kind: AssetKind,
    /// Fields whose files are copied.
    pub copy_fields: Vec<String>,
    /// Fields whose text files are embedded (documents only).
    pub embed_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Copied,
    Embedded,
    Error,
    ErrorReading,
    SkippedInvalidPath,
}

/// One line of the per-asset log.
#[derive(Debug, Clone, Serialize)]
pub struct AssetLogEntry {
    pub field: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged_at: Option<String>,
    pub status: AssetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StageOutcome {
    pub log: Vec<AssetLogEntry>,
    pub errors: Vec<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub embedded: usize,
    pub metadata_updated: bool,
}

/// Copy and embed the requested fields, updating `metadata` in place.
pub fn stage_metadata(metadata: &mut Metadata, req: &StageRequest) -> StageOutcome {
    let mut outcome = StageOutcome::default();

    for field in &req.copy_fields {
        stage_copy_field(metadata, req, field, &mut outcome);
    }

    if !req.embed_fields.is_empty() && req.kind != AssetKind::Documents {
        warn!(kind = %req.kind, "embed fields only apply to documents");
        outcome
            .errors
            .push(format!("Embed fields are only supported for documents, not {}.", req.kind));
    } else {
        for field in &req.embed_fields {
            stage_embed_field(metadata, req, field, &mut outcome);
        }
    }

    outcome
}

fn stage_copy_field(metadata: &mut Metadata, req: &StageRequest, field: &str, out: &mut StageOutcome) {
    let (paths, is_list) = match metadata.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => (vec![Value::String(s.clone())], false),
        Some(Value::Array(items)) if !items.is_empty() => (items.clone(), true),
        _ => return,
    };

    let mut new_items = Vec::with_capacity(paths.len());
    let mut changed = false;

    for item in paths {
        let relative = match item.as_str() {
            Some(s) if !s.trim().is_empty() && !s.starts_with(PROCESSED_PREFIX) => s.to_string(),
            _ => {
                new_items.push(item);
                continue;
            }
        };

        let clean = relative.trim_start_matches('/');
        let source = req.incoming_dir.join(clean);
        let file_name = file_name_of(clean).to_string();
        let destination = req
            .processed_root
            .join(req.kind.folder())
            .join(&req.base)
            .join(&file_name);
        let staged = staged_path(req.kind, &req.base, &file_name);

        match copy_file(&source, &destination) {
            Ok(()) => {
                debug!(field, source = %source.display(), "asset staged");
                out.succeeded += 1;
                out.log.push(AssetLogEntry {
                    field: field.to_string(),
                    source: source.display().to_string(),
                    staged_at: Some(staged.clone()),
                    status: AssetStatus::Copied,
                    error: None,
                });
                new_items.push(Value::String(staged));
                changed = true;
            }
            Err(e) => {
                warn!(field, source = %source.display(), error = %e, "asset copy failed");
                out.failed += 1;
                out.errors.push(format!(
                    "Error copying '{}' to '{}': {e}",
                    source.display(),
                    destination.display()
                ));
                out.log.push(AssetLogEntry {
                    field: field.to_string(),
                    source: source.display().to_string(),
                    staged_at: None,
                    status: AssetStatus::Error,
                    error: Some(e.to_string()),
                });
                new_items.push(Value::String(relative));
            }
        }
    }

    if changed {
        let value = if is_list {
            Value::Array(new_items)
        } else {
            new_items.into_iter().next().unwrap_or(Value::Null)
        };
        metadata.insert(field.to_string(), value);
        out.metadata_updated = true;
    }
}

fn stage_embed_field(metadata: &mut Metadata, req: &StageRequest, field: &str, out: &mut StageOutcome) {
    let status_field = format!("{field}_status");
    let relative = match metadata.get(field) {
        None | Some(Value::Null) => return,
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(_) => {
            metadata.insert(status_field, json!(AssetStatus::SkippedInvalidPath));
            out.metadata_updated = true;
            out.log.push(AssetLogEntry {
                field: field.to_string(),
                source: String::new(),
                staged_at: None,
                status: AssetStatus::SkippedInvalidPath,
                error: None,
            });
            return;
        }
    };

    let source = req.incoming_dir.join(relative.trim_start_matches('/'));
    match read_text(&source) {
        Ok(content) => {
            metadata.insert(format!("{field}_content"), Value::String(content));
            metadata.insert(status_field, json!("processed"));
            out.embedded += 1;
            out.log.push(AssetLogEntry {
                field: field.to_string(),
                source: source.display().to_string(),
                staged_at: Some(format!("{field}_content")),
                status: AssetStatus::Embedded,
                error: None,
            });
        }
        Err(e) => {
            metadata.insert(status_field, json!(AssetStatus::ErrorReading));
            out.failed += 1;
            out.errors.push(format!("Error reading '{}': {e}", source.display()));
            out.log.push(AssetLogEntry {
                field: field.to_string(),
                source: source.display().to_string(),
                staged_at: None,
                status: AssetStatus::ErrorReading,
                error: Some(e.to_string()),
            });
        }
    }
    out.metadata_updated = true;
}

/// `stage-assets` stage: load the staging metadata, stage the fields, and
/// rewrite the metadata when anything changed.
#[instrument(skip_all, fields(base = %req.base, kind = %req.kind))]
pub fn stage_assets_file(req: &StageRequest) -> Result<ScriptReport> {
    let mut metadata = match read_json_object(&req.metadata_path) {
        Ok(m) => m,
        Err(e) => {
            return Ok(ScriptReport::failure(
                format!("Error processing assets for '{}': metadata not loaded.", req.base),
                e.to_string(),
            ));
        }
    };

    let outcome = stage_metadata(&mut metadata, req);

    let mut modified_file = None;
    if outcome.metadata_updated {
        write_json_pretty(&req.metadata_path, &Value::Object(metadata.clone()))?;
        modified_file = Some(req.metadata_path.display().to_string());
    }

    let title = metadata
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&req.base);
    let kind = req.kind;
    let summary = match (outcome.succeeded + outcome.embedded, outcome.failed) {
        (0, 0) => format!("No {kind} assets found or processed for article '{title}'."),
        (ok, 0) => format!("Successfully processed all {ok} {kind} asset(s) for article '{title}'."),
        (0, bad) => format!("Failed to process {bad} {kind} asset(s) for article '{title}'. Check logs."),
        (ok, bad) => format!(
            "Processed {kind} assets for article '{title}': {ok} succeeded, {bad} failed. Check logs."
        ),
    };
    info!(succeeded = outcome.succeeded, failed = outcome.failed, "assets staged");

    Ok(ScriptReport {
        status: ProcessStatus::from_warnings(&outcome.errors),
        modified_file,
        summary,
        errors: outcome.errors.clone(),
        details: json!({
            "log": outcome.log,
            "succeeded": outcome.succeeded,
            "failed": outcome.failed,
            "embedded": outcome.embedded,
        }),
    })
}
