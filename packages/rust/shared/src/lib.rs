//! Shared types, error model, and configuration for the editorial pipeline.
//!
//! This crate is the foundation depended on by all other editorial crates.
//! It provides:
//! - [`EditorialError`]: the unified error type
//! - Domain types ([`ContentType`], [`AssetKind`], [`ProcessStatus`], [`ScriptReport`])
//! - Configuration ([`AppConfig`], strategy selection, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FrontmatterStrategy, MarkdownStrategy, PathsConfig, SentenceStrategy,
    StopwordStrategy, StrategiesConfig, SuggestConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{EditorialError, Result};
pub use types::{
    AssetKind, BODY_FIELD, ContentType, Metadata, OVERRIDE_FIELD, ProcessStatus,
    SUGGESTIONS_FIELD, ScriptReport, file_name_of, has_value, is_truthy, non_empty_str,
};
