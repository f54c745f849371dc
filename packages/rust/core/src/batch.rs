//! Batch Markdown processing: incoming `*.md` → staged metadata JSON + HTML.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use editorial_markdown::{FrontmatterExtractor, MarkdownRenderer};
use editorial_shared::{EditorialError, ProcessStatus, Result, ScriptReport};

use crate::io::{read_text, write_json_pretty, write_text};

#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// `<incoming_root>/<batch>`.
    pub incoming_dir: PathBuf,
    /// `<staging_root>/<batch>`.
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    /// Outputs written, but frontmatter was only partially understood.
    Warning,
    Error,
}

/// One row of the processed-files log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileLogEntry {
    pub source: String,
    pub metadata_out: Option<String>,
    pub html_out: Option<String>,
    pub status: FileStatus,
    pub body_sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub entry: FileLogEntry,
    pub errors: Vec<String>,
    pub message: String,
}

/// Progress callbacks for batch runs.
pub trait ProgressReporter: Send + Sync {
    /// Called once the file list is known.
    fn started(&self, total: usize);
    /// Called as each file completes, in completion order.
    fn file_done(&self, source: &str, current: usize, total: usize);
    fn finished(&self, report: &ScriptReport);
}

/// No-op reporter for tests and non-interactive runs.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn started(&self, _total: usize) {}
    fn file_done(&self, _source: &str, _current: usize, _total: usize) {}
    fn finished(&self, _report: &ScriptReport) {}
}

/// `*.md` files directly inside `dir`, sorted by file name.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| EditorialError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EditorialError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn body_hash(body: &str) -> String {
    format!("{:x}", Sha256::digest(body.as_bytes()))
}

/// Process a single Markdown file. Never fails; problems land in the outcome.
pub fn process_file(
    source: &Path,
    staging_dir: &Path,
    extractor: &FrontmatterExtractor,
    renderer: &dyn MarkdownRenderer,
) -> FileOutcome {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let text = match read_text(source) {
        Ok(t) => t,
        Err(e) => {
            return FileOutcome {
                entry: FileLogEntry {
                    source: file_name.clone(),
                    metadata_out: None,
                    html_out: None,
                    status: FileStatus::Error,
                    body_sha256: None,
                },
                errors: vec![format!("Failed to process file {file_name}: {e}")],
                message: format!("Critical error processing {file_name}. See error log."),
            };
        }
    };

    let extracted = extractor.extract(&text);
    let html = renderer.render(&extracted.body);

    let metadata_name = format!("{base}_metadata.json");
    let html_name = format!("{base}.html");
    let mut errors = Vec::new();
    let mut status = FileStatus::Success;

    if let Some(warning) = &extracted.warning {
        errors.push(format!("Frontmatter parsing issue for {file_name}: {warning}"));
        status = FileStatus::Warning;
    }
    if let Err(e) = write_json_pretty(&staging_dir.join(&metadata_name), &extracted.metadata) {
        errors.push(format!("Error writing metadata for {file_name}: {e}"));
        status = FileStatus::Error;
    }
    if let Err(e) = write_text(&staging_dir.join(&html_name), &html) {
        errors.push(format!("Error writing HTML for {file_name}: {e}"));
        status = FileStatus::Error;
    }

    let message = if errors.is_empty() {
        format!("Processed {file_name}. Staged metadata and HTML.")
    } else {
        format!(
            "Issues processing {file_name}. Details: {}",
            errors.join("; ")
        )
    };
    debug!(source = %file_name, ?status, renderer = renderer.name(), "file processed");

    FileOutcome {
        entry: FileLogEntry {
            source: file_name.clone(),
            metadata_out: Some(metadata_name),
            html_out: Some(html_name),
            status,
            body_sha256: Some(body_hash(&extracted.body)),
        },
        errors,
        message,
    }
}

fn worker_failed(err: tokio::task::JoinError) -> EditorialError {
    EditorialError::task(format!("batch worker failed: {err}"))
}

/// `process-markdown` stage. Files run on the blocking pool, one task each.
#[instrument(skip_all, fields(batch = %req.incoming_dir.display()))]
pub async fn process_batch(
    req: &BatchRequest,
    extractor: Arc<FrontmatterExtractor>,
    renderer: Arc<dyn MarkdownRenderer>,
    progress: &dyn ProgressReporter,
) -> Result<ScriptReport> {
    if !req.incoming_dir.is_dir() {
        let report = ScriptReport::failure(
            "Markdown batch not processed.",
            format!(
                "Incoming batch directory not found: {}",
                req.incoming_dir.display()
            ),
        );
        progress.finished(&report);
        return Ok(report);
    }
    std::fs::create_dir_all(&req.staging_dir)
        .map_err(|e| EditorialError::io(&req.staging_dir, e))?;

    let files = markdown_files(&req.incoming_dir)?;
    let total = files.len();
    progress.started(total);
    info!(files = total, "processing markdown batch");

    let mut join_set = JoinSet::new();
    for (index, path) in files.into_iter().enumerate() {
        let extractor = Arc::clone(&extractor);
        let renderer = Arc::clone(&renderer);
        let staging_dir = req.staging_dir.clone();
        join_set.spawn_blocking(move || {
            (index, process_file(&path, &staging_dir, &extractor, renderer.as_ref()))
        });
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = join_set.join_next().await {
        let (index, outcome) = joined.map_err(worker_failed)?;
        progress.file_done(&outcome.entry.source, outcomes.len() + 1, total);
        outcomes.push((index, outcome));
    }
    outcomes.sort_by_key(|(index, _)| *index);

    let mut log = Vec::with_capacity(total);
    let mut errors = Vec::new();
    let mut messages = Vec::with_capacity(total);
    for (_, outcome) in outcomes {
        errors.extend(outcome.errors);
        messages.push(outcome.message);
        log.push(outcome.entry);
    }

    let failed = log.iter().filter(|e| e.status == FileStatus::Error).count();
    let status = if total > 0 && failed == total {
        ProcessStatus::Failure
    } else {
        ProcessStatus::from_warnings(&errors)
    };
    if failed > 0 {
        warn!(failed, total, "some markdown files failed");
    }

    let report = ScriptReport {
        status,
        modified_file: None,
        summary: if total == 0 {
            "No Markdown files found in the batch.".to_string()
        } else {
            format!("Processed {} of {total} Markdown files.", total - failed)
        },
        errors,
        details: json!({
            "staging_dir": req.staging_dir.display().to_string(),
            "processed_files_log": log,
            "editorial_messages": messages,
        }),
    };
    progress.finished(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use editorial_markdown::{BasicRenderer, CommonmarkRenderer};

    fn request(root: &Path) -> BatchRequest {
        BatchRequest {
            incoming_dir: root.join("incoming/b1"),
            staging_dir: root.join("staging/b1"),
        }
    }

    #[test]
    fn lists_markdown_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.md", "a.md", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let names: Vec<_> = markdown_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn single_file_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("essay.md");
        std::fs::write(&source, "---\ntitle: Essay\n---\n# Hello\n\nBody.").unwrap();

        let outcome = process_file(
            &source,
            dir.path(),
            &FrontmatterExtractor::default(),
            &BasicRenderer,
        );
        assert_eq!(outcome.entry.status, FileStatus::Success);
        assert_eq!(outcome.entry.body_sha256.as_deref(), Some(body_hash("# Hello\n\nBody.").as_str()));

        let html = std::fs::read_to_string(dir.path().join("essay.html")).unwrap();
        assert!(html.contains("<h1>Hello</h1>"));
        let meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("essay_metadata.json")).unwrap())
                .unwrap();
        assert_eq!(meta["title"], json!("Essay"));
    }

    #[test]
    fn base_name_strips_only_the_last_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.md.md");
        std::fs::write(&source, "Plain body.").unwrap();

        let outcome = process_file(
            &source,
            dir.path(),
            &FrontmatterExtractor::default(),
            &BasicRenderer,
        );
        assert_eq!(outcome.entry.metadata_out.as_deref(), Some("notes.md_metadata.json"));
        assert_eq!(outcome.entry.html_out.as_deref(), Some("notes.md.html"));
        assert!(dir.path().join("notes.md.html").is_file());
    }

    #[tokio::test]
    async fn batch_reports_in_filename_order() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        std::fs::create_dir_all(&req.incoming_dir).unwrap();
        for name in ["c", "a", "b"] {
            std::fs::write(
                req.incoming_dir.join(format!("{name}.md")),
                format!("---\ntitle: {name}\n---\nText for {name}."),
            )
            .unwrap();
        }

        let report = process_batch(
            &req,
            Arc::new(FrontmatterExtractor::default()),
            Arc::new(CommonmarkRenderer::default()),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(report.status, ProcessStatus::Success);
        let sources: Vec<_> = report.details["processed_files_log"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["source"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(sources, vec!["a.md", "b.md", "c.md"]);
        assert!(req.staging_dir.join("b_metadata.json").is_file());
    }

    #[tokio::test]
    async fn malformed_frontmatter_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        std::fs::create_dir_all(&req.incoming_dir).unwrap();
        std::fs::write(req.incoming_dir.join("x.md"), "---\ntitle: [oops\n---\nBody").unwrap();

        let report = process_batch(
            &req,
            Arc::new(FrontmatterExtractor::default()),
            Arc::new(BasicRenderer),
            &SilentProgress,
        )
        .await
        .unwrap();
        assert_eq!(report.status, ProcessStatus::SuccessWithWarnings);
        assert_eq!(
            report.details["processed_files_log"][0]["status"],
            json!("warning")
        );
    }

    #[tokio::test]
    async fn panicked_worker_is_a_task_error() {
        let join_err = tokio::task::spawn_blocking::<_, ()>(|| panic!("worker down"))
            .await
            .unwrap_err();
        let err = worker_failed(join_err);
        assert!(matches!(err, EditorialError::Task { .. }), "{err:?}");
        assert!(err.to_string().starts_with("task error: batch worker failed"));
    }

    #[tokio::test]
    async fn missing_batch_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let report = process_batch(
            &request(dir.path()),
            Arc::new(FrontmatterExtractor::default()),
            Arc::new(BasicRenderer),
            &SilentProgress,
        )
        .await
        .unwrap();
        assert!(report.status.is_failure());
    }
}
