//! JSON data files consumed directly by the front-end.
//!
//! - `router_articles.json`: `{ "articles": [ ... ] }`, one record per article id
//! - `theme_modifiers.json`: `{ "sectionModifiers": { "<key>": { ... } } }`
//!
//! A missing sidecar starts empty; other top-level keys are preserved.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Value, json};
use tracing::{info, instrument};

use editorial_shared::{EditorialError, Metadata, ProcessStatus, Result, ScriptReport, non_empty_str};

use crate::io::{read_json_object, write_json_pretty};
use crate::mood::{ParamValue, ThemeSuggestions};

pub const ARTICLES_KEY: &str = "articles";
pub const MODIFIERS_KEY: &str = "sectionModifiers";

/// Whether an upsert replaced an existing record or appended a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Updated,
    Added,
}

fn load_or_empty(path: &Path) -> Result<Metadata> {
    if path.exists() {
        read_json_object(path)
    } else {
        Ok(Metadata::new())
    }
}

/// Insert or replace `record` in the `articles` list by its `id`.
pub fn upsert_article(sidecar: &mut Metadata, record: Metadata) -> Result<Upsert> {
    let id = non_empty_str(&record, "id")
        .ok_or_else(|| EditorialError::validation("article record has no 'id'"))?
        .to_string();

    let slot = sidecar
        .entry(ARTICLES_KEY)
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(articles) = slot else {
        return Err(EditorialError::validation(format!(
            "'{ARTICLES_KEY}' in router sidecar is not a list"
        )));
    };

    let existing = articles
        .iter_mut()
        .find(|a| a.get("id").and_then(Value::as_str) == Some(id.as_str()));
    match existing {
        Some(entry) => {
            *entry = Value::Object(record);
            Ok(Upsert::Updated)
        }
        None => {
            articles.push(Value::Object(record));
            Ok(Upsert::Added)
        }
    }
}

/// Section-modifier key for an article: `article_<id>_custom`, restricted to
/// `[A-Za-z0-9_]`.
pub fn modifier_key(article_id: &str) -> String {
    let sanitized: String = article_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("article_{sanitized}_custom")
}

/// Nest dotted keys (`colorShift.h`) one level deep.
pub fn nest_params(params: &BTreeMap<String, ParamValue>) -> Metadata {
    let mut out = Metadata::new();
    for (key, value) in params {
        let value = json!(value);
        match key.split_once('.') {
            Some((group, leaf)) => {
                let slot = out
                    .entry(group)
                    .or_insert_with(|| Value::Object(Metadata::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Metadata::new());
                }
                if let Value::Object(inner) = slot {
                    inner.insert(leaf.to_string(), value);
                }
            }
            None => {
                out.insert(key.clone(), value);
            }
        }
    }
    out
}

/// Insert or replace the article's section modifier. Returns the key used.
pub fn apply_theme(sidecar: &mut Metadata, suggestions: &ThemeSuggestions) -> Result<String> {
    if suggestions.applies_to_article_id.trim().is_empty() {
        return Err(EditorialError::validation(
            "theme suggestions have no 'applies_to_article_id'",
        ));
    }
    if suggestions.params.is_empty() {
        return Err(EditorialError::validation(
            "theme suggestions contain no parameters to apply",
        ));
    }

    let key = modifier_key(&suggestions.applies_to_article_id);
    let slot = sidecar
        .entry(MODIFIERS_KEY)
        .or_insert_with(|| Value::Object(Metadata::new()));
    let Value::Object(modifiers) = slot else {
        return Err(EditorialError::validation(format!(
            "'{MODIFIERS_KEY}' in theme sidecar is not an object"
        )));
    };
    modifiers.insert(key.clone(), Value::Object(nest_params(&suggestions.params)));
    Ok(key)
}

/// `update-router` stage.
#[instrument(fields(sidecar = %sidecar_path.display()))]
pub fn update_router_file(
    sidecar_path: &Path,
    final_metadata_path: &Path,
    article_id: &str,
) -> Result<ScriptReport> {
    let record = match read_json_object(final_metadata_path) {
        Ok(r) => r,
        Err(e) => {
            return Ok(ScriptReport::failure(
                format!("Failed to load final metadata for article '{article_id}'."),
                e.to_string(),
            ));
        }
    };
    let title = record
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(article_id)
        .to_string();

    let mut sidecar = match load_or_empty(sidecar_path) {
        Ok(s) => s,
        Err(e) => {
            return Ok(ScriptReport::failure("Router sidecar unreadable.", e.to_string()));
        }
    };

    let outcome = match upsert_article(&mut sidecar, record) {
        Ok(o) => o,
        Err(e) => {
            return Ok(ScriptReport::failure(
                format!("Failed to update article '{title}' (ID: {article_id})."),
                e.to_string(),
            ));
        }
    };
    write_json_pretty(sidecar_path, &Value::Object(sidecar))?;

    let verb = match outcome {
        Upsert::Updated => "Updated",
        Upsert::Added => "Added",
    };
    info!(article_id, verb, "router sidecar updated");

    Ok(ScriptReport {
        status: ProcessStatus::Success,
        modified_file: Some(sidecar_path.display().to_string()),
        summary: format!("{verb} article '{title}' (ID: {article_id}) in the router sidecar."),
        errors: Vec::new(),
        details: json!({ "article_id": article_id, "action": verb.to_lowercase() }),
    })
}

/// `apply-theme` stage.
#[instrument(fields(sidecar = %sidecar_path.display()))]
pub fn apply_theme_file(sidecar_path: &Path, suggestions_path: &Path) -> Result<ScriptReport> {
    let suggestions: ThemeSuggestions = match read_json_object(suggestions_path)
        .and_then(|m| {
            serde_json::from_value(Value::Object(m))
                .map_err(|e| EditorialError::json(suggestions_path, e))
        }) {
        Ok(s) => s,
        Err(e) => {
            return Ok(ScriptReport::failure("Theme suggestions unreadable.", e.to_string()));
        }
    };

    let mut sidecar = match load_or_empty(sidecar_path) {
        Ok(s) => s,
        Err(e) => return Ok(ScriptReport::failure("Theme sidecar unreadable.", e.to_string())),
    };

    let key = match apply_theme(&mut sidecar, &suggestions) {
        Ok(k) => k,
        Err(e) => {
            return Ok(ScriptReport::failure("Theme suggestions not applied.", e.to_string()));
        }
    };
    write_json_pretty(sidecar_path, &Value::Object(sidecar))?;
    info!(%key, "theme sidecar updated");

    Ok(ScriptReport {
        status: ProcessStatus::Success,
        modified_file: Some(sidecar_path.display().to_string()),
        summary: format!(
            "Applied theme modifier '{key}' for article '{}'.",
            suggestions.applies_to_article_id
        ),
        errors: Vec::new(),
        details: json!({ "modifier_key": key }),
    })
}
