//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use editorial_core::Capabilities;
use editorial_core::assets::{StageRequest, stage_assets_file};
use editorial_core::batch::{BatchRequest, ProgressReporter, process_batch};
use editorial_core::finalize::{FinalizeRequest, finalize_file};
use editorial_core::mood::suggest_visuals_file;
use editorial_core::post::{PostProfile, process_post};
use editorial_core::review::{ReviewRequest, assemble_review_package};
use editorial_core::sidecar::{apply_theme_file, update_router_file};
use editorial_core::suggest::suggest_metadata_file;
use editorial_shared::{
    AppConfig, AssetKind, ContentType, ScriptReport, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Editorial pipeline: stage Markdown articles for review and publication.
#[derive(Parser)]
#[command(
    name = "editorial",
    version,
    about = "Process, enrich, and publish Markdown articles for the site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.editorial/editorial.toml.
    #[arg(long, global = true, env = "EDITORIAL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Post types handled by `process-post`.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum PostKind {
    Video,
    Audio,
    Interactive,
}

impl From<PostKind> for ContentType {
    fn from(kind: PostKind) -> Self {
        match kind {
            PostKind::Video => ContentType::Video,
            PostKind::Audio => ContentType::Audio,
            PostKind::Interactive => ContentType::Interactive,
        }
    }
}

/// Asset families handled by `stage-assets`.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum AssetArg {
    Images,
    Audio,
    Documents,
}

impl From<AssetArg> for AssetKind {
    fn from(kind: AssetArg) -> Self {
        match kind {
            AssetArg::Images => AssetKind::Images,
            AssetArg::Audio => AssetKind::Audio,
            AssetArg::Documents => AssetKind::Documents,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert every Markdown file of an incoming batch into staged metadata + HTML.
    ProcessMarkdown {
        /// Batch directory name under the incoming root.
        batch: String,

        /// Override `paths.incoming_root`.
        #[arg(long)]
        incoming_root: Option<PathBuf>,

        /// Override `paths.staging_root`.
        #[arg(long)]
        staging_root: Option<PathBuf>,
    },

    /// Validate a video, audio or interactive post and write its metadata.
    ProcessPost {
        #[arg(long, value_enum)]
        kind: PostKind,

        /// Markdown post file.
        input: PathBuf,

        /// Directory for `<id>_metadata.json`.
        output_dir: PathBuf,
    },

    /// Copy (or embed) the assets referenced by a staged article.
    StageAssets {
        batch: String,

        /// Article base name.
        base: String,

        #[arg(long, value_enum)]
        kind: AssetArg,

        /// JSON array of metadata fields whose files are copied.
        #[arg(long)]
        fields: String,

        /// JSON array of text fields to embed (documents only).
        #[arg(long)]
        embed_fields: Option<String>,
    },

    /// Suggest excerpt, categories and tags for an article.
    SuggestMetadata {
        metadata: PathBuf,
        content_html: PathBuf,
        style_guide: PathBuf,
    },

    /// Map an article's visual mood to theme parameters.
    SuggestVisuals {
        metadata: PathBuf,
        style_guide: PathBuf,
        output: PathBuf,
    },

    /// Merge accepted suggestions and publish staged assets.
    Finalize {
        batch: String,
        base: String,
        live_root: PathBuf,
        live_prefix: String,
    },

    /// Upsert a finalized article into the router sidecar.
    UpdateRouter {
        sidecar: PathBuf,
        final_metadata: PathBuf,
        article_id: String,
    },

    /// Apply theme suggestions to the theme sidecar.
    ApplyTheme {
        sidecar: PathBuf,
        suggestions: PathBuf,
    },

    /// Assemble the human review package for a staged article.
    ReviewPackage {
        batch: String,
        base: String,
        /// Incoming batch directory holding the source Markdown.
        incoming_batch: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// a single JSON report.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "editorial=info",
        1 => "editorial=debug",
        _ => "editorial=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command. Stage commands always print a report; a failed stage
/// exits with status 1.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config;
    let command = match cli.command {
        Command::Config { action } => {
            match action {
                ConfigAction::Init => cmd_config_init()?,
                ConfigAction::Show => cmd_config_show(config_path.as_deref())?,
            }
            return Ok(ExitCode::SUCCESS);
        }
        other => other,
    };

    let report = match run_stage(command, config_path.as_deref()).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "stage aborted");
            ScriptReport::failure("An unexpected error occurred.", format!("{e:#}"))
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.status.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn parse_field_list(raw: &str, flag: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .wrap_err_with(|| format!("{flag} must be a JSON array of strings, got '{raw}'"))
}

async fn run_stage(command: Command, config_path: Option<&Path>) -> Result<ScriptReport> {
    let config = resolve_config(config_path)?;
    let caps = Capabilities::from_config(&config);
    debug!(?caps, "capabilities selected");

    let incoming_root = PathBuf::from(&config.paths.incoming_root);
    let staging_root = PathBuf::from(&config.paths.staging_root);
    let processed_root = PathBuf::from(&config.paths.processed_assets_root);

    let report = match command {
        Command::ProcessMarkdown {
            batch,
            incoming_root: incoming_override,
            staging_root: staging_override,
        } => {
            let req = BatchRequest {
                incoming_dir: incoming_override.unwrap_or(incoming_root).join(&batch),
                staging_dir: staging_override.unwrap_or(staging_root).join(&batch),
            };
            let progress = CliProgress::new();
            process_batch(&req, caps.extractor.clone(), caps.renderer.clone(), &progress).await?
        }
        Command::ProcessPost {
            kind,
            input,
            output_dir,
        } => {
            let content_type = ContentType::from(kind);
            let profile = PostProfile::for_type(content_type)
                .ok_or_else(|| eyre!("no post profile for '{content_type}'"))?;
            process_post(&input, &output_dir, &profile, &caps.extractor).into_report(&profile)
        }
        Command::StageAssets {
            batch,
            base,
            kind,
            fields,
            embed_fields,
        } => {
            let req = StageRequest {
                metadata_path: staging_root.join(&batch).join(format!("{base}_metadata.json")),
                incoming_dir: incoming_root.join(&batch),
                processed_root,
                base,
                kind: kind.into(),
                copy_fields: parse_field_list(&fields, "--fields")?,
                embed_fields: match embed_fields {
                    Some(raw) => parse_field_list(&raw, "--embed-fields")?,
                    None => Vec::new(),
                },
            };
            stage_assets_file(&req)?
        }
        Command::SuggestMetadata {
            metadata,
            content_html,
            style_guide,
        } => suggest_metadata_file(&metadata, &content_html, &style_guide, &caps.analyzer)?,
        Command::SuggestVisuals {
            metadata,
            style_guide,
            output,
        } => suggest_visuals_file(&metadata, &style_guide, &output)?,
        Command::Finalize {
            batch,
            base,
            live_root,
            live_prefix,
        } => finalize_file(&FinalizeRequest {
            staging_dir: staging_root.join(&batch),
            base,
            processed_root,
            live_root,
            live_prefix,
        })?,
        Command::UpdateRouter {
            sidecar,
            final_metadata,
            article_id,
        } => update_router_file(&sidecar, &final_metadata, &article_id)?,
        Command::ApplyTheme {
            sidecar,
            suggestions,
        } => apply_theme_file(&sidecar, &suggestions)?,
        Command::ReviewPackage {
            batch,
            base,
            incoming_batch,
        } => assemble_review_package(&ReviewRequest {
            staging_dir: staging_root.join(&batch),
            incoming_dir: incoming_batch,
            batch,
            base,
        })?,
        Command::Config { .. } => return Err(eyre!("config is not a pipeline stage")),
    };
    Ok(report)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Batch progress on stderr using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn started(&self, total: usize) {
        self.spinner.set_message(format!("Processing {total} Markdown files"));
    }

    fn file_done(&self, source: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processed [{current}/{total}] {source}"));
    }

    fn finished(&self, _report: &ScriptReport) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    eprintln!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
