//! Application configuration for the editorial pipeline.
//!
//! User config lives at `~/.editorial/editorial.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EditorialError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "editorial.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".editorial";

// ---------------------------------------------------------------------------
// Config structs (matching editorial.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline directory roots.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Suggestion engine tuning.
    #[serde(default)]
    pub suggest: SuggestConfig,

    /// Parser/tokenizer strategy selection.
    #[serde(default)]
    pub strategies: StrategiesConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root holding one directory per incoming batch.
    #[serde(default = "default_incoming_root")]
    pub incoming_root: String,

    /// Root holding one staging directory per batch.
    #[serde(default = "default_staging_root")]
    pub staging_root: String,

    /// Root for staged asset copies (`<root>/<kind>/<base>/...`).
    #[serde(default = "default_processed_assets_root")]
    pub processed_assets_root: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            incoming_root: default_incoming_root(),
            staging_root: default_staging_root(),
            processed_assets_root: default_processed_assets_root(),
        }
    }
}

fn default_incoming_root() -> String {
    "content_pipeline/incoming".into()
}
fn default_staging_root() -> String {
    "content_pipeline/staging".into()
}
fn default_processed_assets_root() -> String {
    "content_pipeline/processed_assets".into()
}

/// `[suggest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// Hard cap on generated excerpt length (before the ellipsis).
    #[serde(default = "default_excerpt_max_chars")]
    pub excerpt_max_chars: usize,

    /// How many frequency-ranked keywords to keep per article.
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,

    /// Existing excerpts shorter than this are replaced by a suggestion.
    #[serde(default = "default_min_excerpt_len")]
    pub min_excerpt_len: usize,

    /// Articles with fewer tags than this get tag suggestions.
    #[serde(default = "default_min_tags")]
    pub min_tags: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            excerpt_max_chars: default_excerpt_max_chars(),
            top_keywords: default_top_keywords(),
            min_excerpt_len: default_min_excerpt_len(),
            min_tags: default_min_tags(),
        }
    }
}

fn default_excerpt_max_chars() -> usize {
    250
}
fn default_top_keywords() -> usize {
    20
}
fn default_min_excerpt_len() -> usize {
    50
}
fn default_min_tags() -> usize {
    3
}

/// `[strategies]` section. Each value picks one implementation at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategiesConfig {
    #[serde(default)]
    pub frontmatter: FrontmatterStrategy,
    #[serde(default)]
    pub markdown: MarkdownStrategy,
    #[serde(default)]
    pub stopwords: StopwordStrategy,
    #[serde(default)]
    pub sentences: SentenceStrategy,
}

/// Primary parser for frontmatter blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrontmatterStrategy {
    /// Full YAML, with key-value fallback on parse errors.
    #[default]
    Yaml,
    /// Line-based `key: value` splitting only.
    KeyValue,
}

/// Markdown → HTML renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkdownStrategy {
    #[default]
    Commonmark,
    Basic,
}

/// Stopword list used for keyword extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopwordStrategy {
    #[default]
    Comprehensive,
    Basic,
}

/// Sentence boundary detection for excerpts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SentenceStrategy {
    #[default]
    AbbreviationAware,
    Punctuation,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.editorial/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| EditorialError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.editorial/editorial.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EditorialError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| EditorialError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EditorialError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EditorialError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EditorialError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
