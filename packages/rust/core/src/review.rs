//! Review package assembly inside a staging batch directory.
//!
//! ```text
//! <staging>/<batch>/
//!   00_PROCESSING_SUMMARY.md
//!   01_processed_content/<base>.html
//!   04_asset_manifest.json
//!   05_source_files_copy/<base>.md
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use editorial_shared::{
    EditorialError, Metadata, ProcessStatus, Result, SUGGESTIONS_FIELD, ScriptReport, has_value,
};

use crate::assets::PROCESSED_PREFIX;
use crate::io::{copy_file, read_json_object, write_json_pretty, write_text};

pub const CONTENT_DIR: &str = "01_processed_content";
pub const SOURCE_COPY_DIR: &str = "05_source_files_copy";
pub const MANIFEST_FILE: &str = "04_asset_manifest.json";
pub const SUMMARY_FILE: &str = "00_PROCESSING_SUMMARY.md";
pub const THEME_SUGGESTIONS_FILE: &str = "theme_suggestions.json";

/// Asset classes recognised by field name: (class, suffixes or exact names).
const ASSET_PATTERNS: &[(&str, &[&str])] = &[
    ("image", &["_image_path", "inline_images", "gallery_images"]),
    ("audio", &["_audio_path", "_clip_path", "podcast_episode_path", "background_tracks"]),
    ("pdf", &["_pdf", "_document_pdf"]),
    ("txt_embedded", &["_text_path"]),
];

/// Classify a metadata field by its name.
pub fn asset_class(field: &str) -> Option<&'static str> {
    ASSET_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| field.ends_with(p)))
        .map(|(class, _)| *class)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub metadata_field: String,
    pub value: String,
    pub status: String,
    pub asset_type: &'static str,
}

/// One manifest entry per asset path (or embedded text) referenced by the metadata.
pub fn build_manifest(metadata: &Metadata) -> Vec<ManifestEntry> {
    let mut manifest = Vec::new();

    for (field, value) in metadata {
        if field.ends_with("_status") || field.ends_with("_content") || field.ends_with("_original") {
            continue;
        }
        let Some(class) = asset_class(field) else {
            continue;
        };

        if class == "txt_embedded" {
            let status = metadata
                .get(&format!("{field}_status"))
                .and_then(Value::as_str)
                .unwrap_or("unknown_status");
            manifest.push(ManifestEntry {
                metadata_field: field.clone(),
                value: value.as_str().unwrap_or_default().to_string(),
                status: status.to_string(),
                asset_type: class,
            });
            continue;
        }

        let paths: Vec<&str> = match value {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => continue,
        };
        for path in paths {
            let status = if path.is_empty() {
                "empty_path"
            } else if path.starts_with(PROCESSED_PREFIX) {
                "processed"
            } else if matches!(
                metadata.get(&format!("{field}_status")).and_then(Value::as_str),
                Some("error_reading" | "error_copying")
            ) {
                "error"
            } else {
                "unprocessed"
            };
            manifest.push(ManifestEntry {
                metadata_field: field.clone(),
                value: path.to_string(),
                status: status.to_string(),
                asset_type: class,
            });
        }
    }

    manifest
}

#[derive(Debug, Clone)]
pub struct ReviewRequest {
    /// `<staging_root>/<batch>`.
    pub staging_dir: PathBuf,
    /// `<incoming_root>/<batch>`, holding the source Markdown.
    pub incoming_dir: PathBuf,
    pub batch: String,
    pub base: String,
}

fn render_summary(
    req: &ReviewRequest,
    metadata: &Metadata,
    manifest: &[ManifestEntry],
    has_theme: bool,
    errors: &[String],
) -> String {
    let title = metadata
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&req.base);
    let mut out = String::new();

    let _ = writeln!(out, "# Processing Summary: {title}\n");
    let _ = writeln!(out, "- **Batch Name:** {}", req.batch);
    let _ = writeln!(out, "- **Article Base Filename:** {}", req.base);
    let _ = writeln!(
        out,
        "- **Processing Date:** {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "## Primary Content:");
    let _ = writeln!(
        out,
        "- 1 Markdown file processed into: `{CONTENT_DIR}/{}.html`\n",
        req.base
    );

    let _ = writeln!(out, "## Asset Processing:");
    let _ = writeln!(out, "- Total asset entries found/processed: {}", manifest.len());
    let errors_total = manifest.iter().filter(|e| e.status == "error").count();
    if errors_total > 0 {
        let _ = writeln!(out, "- **Asset Errors Detected:** {errors_total}");
    }
    let mut by_class: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new();
    for entry in manifest {
        let counts = by_class.entry(entry.asset_type).or_default();
        counts.0 += 1;
        match entry.status.as_str() {
            "processed" => counts.1 += 1,
            "error" | "error_reading" => counts.2 += 1,
            _ => {}
        }
    }
    for (class, (total, ok, bad)) in &by_class {
        let mut line = format!("  - {class} assets: {total}");
        if *ok > 0 {
            let _ = write!(line, " ({ok} processed/ok)");
        }
        if *bad > 0 {
            let _ = write!(line, " ({bad} errors)");
        }
        let _ = writeln!(out, "{line}");
    }

    let _ = writeln!(out, "\n## AI Suggestions:");
    if has_value(metadata, SUGGESTIONS_FIELD) {
        let _ = writeln!(out, "- Metadata suggestions (excerpt, tags, categories) are present in `_metadata.json`.");
    } else {
        let _ = writeln!(out, "- No metadata suggestions found in `_metadata.json`.");
    }
    if has_theme {
        let _ = writeln!(out, "- Visual theme suggestions are present in `{THEME_SUGGESTIONS_FILE}`.");
    } else {
        let _ = writeln!(out, "- No visual theme suggestions found.");
    }

    let _ = writeln!(out, "\n## General Errors during Assembly:");
    if errors.is_empty() {
        let _ = writeln!(out, "- No general errors during package assembly.");
    } else {
        for err in errors {
            let _ = writeln!(out, "- {err}");
        }
    }
    out
}

/// Ensure `<base>.html` lives in the content folder. Returns a log line.
fn place_html(req: &ReviewRequest) -> std::result::Result<String, String> {
    let loose = req.staging_dir.join(format!("{}.html", req.base));
    let placed = packaged_html(&req.staging_dir, &req.base);

    if loose.is_file() {
        let result = std::fs::create_dir_all(placed.parent().unwrap_or(&req.staging_dir))
            .and_then(|()| std::fs::rename(&loose, &placed));
        match result {
            Ok(()) => Ok(format!("{CONTENT_DIR}/{}.html (moved)", req.base)),
            Err(e) => Err(format!("Error moving HTML file: {}", EditorialError::io(&loose, e))),
        }
    } else if placed.is_file() {
        Ok(format!("{CONTENT_DIR}/{}.html (verified)", req.base))
    } else {
        Err(format!(
            "Processed HTML file not found at {} or {}",
            loose.display(),
            placed.display()
        ))
    }
}

/// `review-package` stage.
#[instrument(skip_all, fields(batch = %req.batch, base = %req.base))]
pub fn assemble_review_package(req: &ReviewRequest) -> Result<ScriptReport> {
    let mut files: Vec<String> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    match place_html(req) {
        Ok(line) => files.push(line),
        Err(e) => errors.push(e),
    }

    let metadata_path = req.staging_dir.join(format!("{}_metadata.json", req.base));
    let metadata = match read_json_object(&metadata_path) {
        Ok(m) => m,
        Err(e) => {
            errors.push(format!("Metadata not loaded: {e}"));
            return Ok(ScriptReport {
                status: ProcessStatus::Failure,
                modified_file: None,
                summary: format!("Failed to assemble review package for '{}'.", req.base),
                errors,
                details: json!({ "files": files }),
            });
        }
    };
    files.push(format!("{}_metadata.json (verified)", req.base));

    let theme_path = req.staging_dir.join(THEME_SUGGESTIONS_FILE);
    let has_theme = match theme_path.exists().then(|| read_json_object(&theme_path)) {
        Some(Ok(theme)) => !theme.is_empty(),
        Some(Err(e)) => {
            errors.push(format!("Error loading theme suggestions: {e}"));
            false
        }
        None => false,
    };

    let manifest = build_manifest(&metadata);
    match write_json_pretty(&req.staging_dir.join(MANIFEST_FILE), &manifest) {
        Ok(()) => files.push(format!("{MANIFEST_FILE} (created)")),
        Err(e) => errors.push(format!("Error writing asset manifest: {e}")),
    }

    let source = req.incoming_dir.join(format!("{}.md", req.base));
    let copy = req.staging_dir.join(SOURCE_COPY_DIR).join(format!("{}.md", req.base));
    match copy_file(&source, &copy) {
        Ok(()) => files.push(format!("{SOURCE_COPY_DIR}/{}.md (copied)", req.base)),
        Err(e) => {
            warn!(error = %e, "source copy skipped");
            errors.push(format!("Non-critical: source Markdown not copied: {e}"));
        }
    }

    let summary_md = render_summary(req, &metadata, &manifest, has_theme, &errors);
    let summary_path = req.staging_dir.join(SUMMARY_FILE);
    write_text(&summary_path, &summary_md)?;
    files.push(format!("{SUMMARY_FILE} (created)"));

    info!(files = files.len(), errors = errors.len(), "review package assembled");

    Ok(ScriptReport {
        status: ProcessStatus::from_warnings(&errors),
        modified_file: Some(summary_path.display().to_string()),
        summary: format!(
            "Review package for '{}' assembled in {}.",
            req.base,
            req.staging_dir.display()
        ),
        errors,
        details: json!({ "files": files, "asset_entries": manifest.len() }),
    })
}

/// Path of the processed HTML inside a package.
pub fn packaged_html(staging_dir: &Path, base: &str) -> PathBuf {
    staging_dir.join(CONTENT_DIR).join(format!("{base}.html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn classifies_fields_by_suffix() {
        assert_eq!(asset_class("header_image_path"), Some("image"));
        assert_eq!(asset_class("gallery_images"), Some("image"));
        assert_eq!(asset_class("intro_clip_path"), Some("audio"));
        assert_eq!(asset_class("linked_document_pdf"), Some("pdf"));
        assert_eq!(asset_class("supplementary_text_path"), Some("txt_embedded"));
        assert_eq!(asset_class("title"), None);
    }

    #[test]
    fn manifest_reports_statuses() {
        let metadata = meta(json!({
            "title": "T",
            "header_image_path": "/content_pipeline/processed_assets/images/e/h.png",
            "gallery_images": ["img/raw.png", ""],
            "notes_text_path": "notes.txt",
            "notes_text_path_status": "processed",
            "notes_text_path_content": "text",
        }));
        let manifest = build_manifest(&metadata);
        let statuses: Vec<_> = manifest
            .iter()
            .map(|e| (e.metadata_field.as_str(), e.status.as_str()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("gallery_images", "unprocessed"),
                ("gallery_images", "empty_path"),
                ("header_image_path", "processed"),
                ("notes_text_path", "processed"),
            ]
        );
    }

    fn setup() -> (tempfile::TempDir, ReviewRequest) {
        let dir = tempfile::tempdir().unwrap();
        let req = ReviewRequest {
            staging_dir: dir.path().join("staging/b1"),
            incoming_dir: dir.path().join("incoming/b1"),
            batch: "b1".into(),
            base: "essay".into(),
        };
        std::fs::create_dir_all(&req.staging_dir).unwrap();
        std::fs::create_dir_all(&req.incoming_dir).unwrap();
        (dir, req)
    }

    #[test]
    fn assembles_full_package() {
        let (_dir, req) = setup();
        std::fs::write(req.staging_dir.join("essay.html"), "<p>x</p>").unwrap();
        std::fs::write(
            req.staging_dir.join("essay_metadata.json"),
            r#"{"title": "Essay", "header_image_path": "img/h.png"}"#,
        )
        .unwrap();
        std::fs::write(req.incoming_dir.join("essay.md"), "# Essay").unwrap();

        let report = assemble_review_package(&req).unwrap();
        assert_eq!(report.status, ProcessStatus::Success, "{:?}", report.errors);
        assert!(packaged_html(&req.staging_dir, "essay").is_file());
        assert!(!req.staging_dir.join("essay.html").exists());
        assert!(req.staging_dir.join(MANIFEST_FILE).is_file());
        assert!(req.staging_dir.join(SOURCE_COPY_DIR).join("essay.md").is_file());

        let summary = std::fs::read_to_string(req.staging_dir.join(SUMMARY_FILE)).unwrap();
        assert!(summary.starts_with("# Processing Summary: Essay"));
        assert!(summary.contains("image assets: 1"));
    }

    #[test]
    fn missing_source_is_non_critical() {
        let (_dir, req) = setup();
        std::fs::create_dir_all(req.staging_dir.join(CONTENT_DIR)).unwrap();
        std::fs::write(packaged_html(&req.staging_dir, "essay"), "<p>x</p>").unwrap();
        std::fs::write(req.staging_dir.join("essay_metadata.json"), "{}").unwrap();

        let report = assemble_review_package(&req).unwrap();
        assert_eq!(report.status, ProcessStatus::SuccessWithWarnings);
        assert!(report.errors[0].starts_with("Non-critical"));
    }

    #[test]
    fn missing_metadata_fails() {
        let (_dir, req) = setup();
        let report = assemble_review_package(&req).unwrap();
        assert!(report.status.is_failure());
    }
}
