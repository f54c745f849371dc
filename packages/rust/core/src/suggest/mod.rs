//! Heuristic metadata suggestions: excerpt, categories and tags.
//!
//! Everything here is deterministic. The only inputs are the article's
//! metadata, its plain text, and the [`Vocabulary`] of the style guide.

pub mod excerpt;
pub mod keywords;
pub mod tokenize;
pub mod vocabulary;

use std::path::Path;

use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use editorial_markdown::html_to_text;
use editorial_shared::{
    Metadata, OVERRIDE_FIELD, ProcessStatus, Result, SUGGESTIONS_FIELD, ScriptReport,
    SentenceStrategy, StopwordStrategy, SuggestConfig,
};

use crate::io::{read_json_object, read_text, write_json_pretty};

pub use excerpt::{ScoredSentence, generate_excerpt, score_sentences};
pub use keywords::{KeywordCount, top_keywords};
pub use tokenize::{
    AbbreviationAwareSplitter, BasicStopwords, ComprehensiveStopwords, PunctuationSplitter,
    SentenceSplitter, StopwordList, content_words, splitter_for, stopwords_for, tokenize,
};
pub use vocabulary::Vocabulary;

/// Keywords considered for scoring and vocabulary matching.
const SCORING_KEYWORDS: usize = 10;
/// Keywords taken directly as tags.
const TAG_KEYWORDS: usize = 5;
/// Matched vocabulary terms appended to tags.
const TAG_TERMS: usize = 3;
const MAX_TAGS: usize = 7;
const MAX_CATEGORIES: usize = 2;

/// Text-analysis strategies and tuning used by the suggestion engine.
pub struct Analyzer {
    pub stopwords: Box<dyn StopwordList>,
    pub sentences: Box<dyn SentenceSplitter>,
    pub settings: SuggestConfig,
}

impl Analyzer {
    pub fn new(
        stopwords: StopwordStrategy,
        sentences: SentenceStrategy,
        settings: SuggestConfig,
    ) -> Self {
        Self {
            stopwords: stopwords_for(stopwords),
            sentences: splitter_for(sentences),
            settings,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(
            StopwordStrategy::default(),
            SentenceStrategy::default(),
            SuggestConfig::default(),
        )
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("stopwords", &self.stopwords.name())
            .field("sentences", &self.sentences.name())
            .field("settings", &self.settings)
            .finish()
    }
}

/// What the engine decided for one article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestions {
    /// Suggestions disabled by the article's override flag.
    pub overridden: bool,
    pub excerpt: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Ranked content keywords (empty when overridden).
    pub keywords: Vec<KeywordCount>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.excerpt.is_none() && self.categories.is_empty() && self.tags.is_empty()
    }

    /// The `ai_suggestions` entries produced, as a JSON object.
    pub fn to_metadata(&self) -> Metadata {
        let mut map = Metadata::new();
        if let Some(excerpt) = &self.excerpt {
            map.insert("suggested_excerpt".into(), json!(excerpt));
        }
        if !self.categories.is_empty() {
            map.insert("suggested_categories".into(), json!(self.categories));
        }
        if !self.tags.is_empty() {
            map.insert("suggested_tags".into(), json!(self.tags));
        }
        map
    }
}

/// Whether the article opted out of suggestions.
pub fn is_overridden(metadata: &Metadata) -> bool {
    metadata.get(OVERRIDE_FIELD) == Some(&Value::Bool(true))
}

/// Produce suggestions for an article from its plain text.
#[instrument(skip_all, fields(text_len = text.len()))]
pub fn suggest(
    metadata: &Metadata,
    text: &str,
    vocabulary: &Vocabulary,
    analyzer: &Analyzer,
) -> Suggestions {
    if is_overridden(metadata) {
        debug!("suggestions overridden by metadata flag");
        return Suggestions {
            overridden: true,
            ..Default::default()
        };
    }

    let settings = &analyzer.settings;
    let words = content_words(text, analyzer.stopwords.as_ref());
    let keywords = top_keywords(&words, settings.top_keywords);
    let scoring: Vec<String> = keywords
        .iter()
        .take(SCORING_KEYWORDS)
        .map(|k| k.word.clone())
        .collect();

    let mut out = Suggestions::default();

    let excerpt_len = metadata
        .get("excerpt")
        .and_then(Value::as_str)
        .map(|s| s.chars().count())
        .unwrap_or(0);
    if excerpt_len < settings.min_excerpt_len {
        let title = metadata.get("title").and_then(Value::as_str).unwrap_or("");
        out.excerpt = generate_excerpt(text, title, &scoring, analyzer);
    }

    let has_category = metadata
        .get("category")
        .is_some_and(editorial_shared::is_truthy);
    if !has_category || tag_count(metadata) < settings.min_tags {
        // Distinct matched terms, in first-match order.
        let mut matched: Vec<String> = Vec::new();
        for keyword in &scoring {
            for term in vocabulary.matches(keyword) {
                if !matched.iter().any(|m| m == term) {
                    matched.push(term.to_string());
                }
            }
        }
        out.categories = matched.iter().take(MAX_CATEGORIES).cloned().collect();
        if out.categories.is_empty() {
            out.categories = broad_categories(vocabulary);
        }

        let mut tags: Vec<String> = Vec::new();
        let candidates = keywords
            .iter()
            .take(TAG_KEYWORDS)
            .map(|k| k.word.as_str())
            .chain(matched.iter().take(TAG_TERMS).map(String::as_str));
        for tag in candidates {
            if tags.len() == MAX_TAGS {
                break;
            }
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        out.tags = tags;
    }

    out.keywords = keywords;
    out
}

/// Category fallback when no keyword hits the vocabulary: the first
/// multi-word terms, which name themes rather than single concepts.
fn broad_categories(vocabulary: &Vocabulary) -> Vec<String> {
    vocabulary
        .iter()
        .filter(|term| term.contains(' '))
        .take(MAX_CATEGORIES)
        .map(str::to_string)
        .collect()
}

fn tag_count(metadata: &Metadata) -> usize {
    match metadata.get("tags") {
        Some(Value::Array(items)) => items.len(),
        Some(Value::String(s)) => s.split(',').filter(|t| !t.trim().is_empty()).count(),
        _ => 0,
    }
}

/// Merge suggestions into `metadata[ai_suggestions]`, keeping other entries.
pub fn merge_suggestions(metadata: &mut Metadata, suggestions: Metadata) {
    let slot = metadata
        .entry(SUGGESTIONS_FIELD)
        .or_insert_with(|| Value::Object(Metadata::new()));
    if !slot.is_object() {
        *slot = Value::Object(Metadata::new());
    }
    if let Value::Object(existing) = slot {
        existing.extend(suggestions);
    }
}

/// `suggest-metadata` stage: read metadata and rendered HTML, merge
/// suggestions, and rewrite the metadata file when anything was produced.
#[instrument(skip(analyzer), fields(metadata = %metadata_path.display()))]
pub fn suggest_metadata_file(
    metadata_path: &Path,
    content_html_path: &Path,
    style_guide_path: &Path,
    analyzer: &Analyzer,
) -> Result<ScriptReport> {
    let mut metadata = match read_json_object(metadata_path) {
        Ok(m) => m,
        Err(e) => {
            return Ok(ScriptReport::failure(
                "Error loading metadata.",
                format!("Error loading metadata: {e}"),
            ));
        }
    };

    if is_overridden(&metadata) {
        info!("suggestions overridden");
        return Ok(ScriptReport {
            status: ProcessStatus::Success,
            modified_file: None,
            summary: format!("AI suggestions overridden by '{OVERRIDE_FIELD}'."),
            errors: Vec::new(),
            details: json!({ "overridden": true, "suggestions_made": {} }),
        });
    }

    let html = match read_text(content_html_path) {
        Ok(h) => h,
        Err(e) => {
            return Ok(ScriptReport::failure(
                "Error loading HTML content.",
                format!("Error loading HTML content: {e}"),
            ));
        }
    };

    let text = html_to_text(&html);
    if text.trim().is_empty() {
        return Ok(ScriptReport::failure(
            "Extracted text content is empty.",
            "Extracted text content is empty.",
        ));
    }

    let mut errors = Vec::new();
    let vocabulary = match read_text(style_guide_path) {
        Ok(guide) => Vocabulary::from_style_guide(&guide),
        Err(e) => {
            warn!(error = %e, "style guide unreadable, continuing without vocabulary");
            errors.push(format!("Style guide unreadable, no vocabulary matching: {e}"));
            Vocabulary::default()
        }
    };

    let suggestions = suggest(&metadata, &text, &vocabulary, analyzer);
    let made = suggestions.to_metadata();
    let keywords: Vec<&str> = suggestions.keywords.iter().map(|k| k.word.as_str()).collect();

    let (modified_file, summary) = if made.is_empty() {
        (
            None,
            "No new AI suggestions generated (existing metadata might be sufficient or content too short).".to_string(),
        )
    } else {
        merge_suggestions(&mut metadata, made.clone());
        write_json_pretty(metadata_path, &Value::Object(metadata))?;
        info!(fields = made.len(), "metadata updated with suggestions");
        (
            Some(metadata_path.display().to_string()),
            "Metadata updated with AI suggestions.".to_string(),
        )
    };

    Ok(ScriptReport {
        status: ProcessStatus::from_warnings(&errors),
        modified_file,
        summary,
        errors,
        details: json!({
            "overridden": false,
            "suggestions_made": made,
            "top_keywords": keywords,
            "vocabulary_terms": vocabulary.len(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    const TEXT: &str = "Digital sovereignty matters for every reader today. \
        Sovereignty means control over data and platforms. \
        Platforms shape how readers think about sovereignty and control.";

    #[test]
    fn override_flag_blocks_everything() {
        let metadata = meta(json!({ OVERRIDE_FIELD: true, "title": "x" }));
        let vocab = Vocabulary::from_terms(["digital sovereignty"]);
        let out = suggest(&metadata, TEXT, &vocab, &Analyzer::default());
        assert!(out.overridden);
        assert!(out.is_empty());
        assert!(out.keywords.is_empty());
    }

    #[test]
    fn override_must_be_literal_true() {
        let metadata = meta(json!({ OVERRIDE_FIELD: "true" }));
        assert!(!is_overridden(&metadata));
    }

    #[test]
    fn deficient_metadata_gets_all_suggestions() {
        let metadata = meta(json!({ "title": "Digital Sovereignty" }));
        let vocab = Vocabulary::from_terms(["digital sovereignty", "glitch art"]);
        let out = suggest(&metadata, TEXT, &vocab, &Analyzer::default());

        assert!(out.excerpt.is_some());
        assert_eq!(out.categories, vec!["digital sovereignty"]);
        assert_eq!(out.tags[0], "sovereignty");
        assert!(out.tags.contains(&"digital sovereignty".to_string()));
        assert!(out.tags.len() <= MAX_TAGS);
    }

    #[test]
    fn categories_and_tags_are_capped() {
        let text = "Glitch archives resist platforms. \
            Glitch archives and sovereignty shape memory. \
            Platforms erase memory while sovereignty protects archives. \
            Readers remember glitch culture.";
        let metadata = meta(json!({ "title": "Notes" }));
        let vocab = Vocabulary::from_terms([
            "glitch art",
            "archives of memory",
            "digital sovereignty",
            "platform politics",
        ]);
        let out = suggest(&metadata, text, &vocab, &Analyzer::default());

        let top5: Vec<&str> = out.keywords.iter().take(5).map(|k| k.word.as_str()).collect();
        assert_eq!(top5, vec!["glitch", "archives", "platforms", "sovereignty", "memory"]);
        assert_eq!(out.categories, vec!["glitch art", "archives of memory"]);
        assert_eq!(
            out.tags,
            vec![
                "glitch",
                "archives",
                "platforms",
                "sovereignty",
                "memory",
                "glitch art",
                "archives of memory",
            ]
        );
        assert_eq!(out.tags.len(), MAX_TAGS);
    }

    #[test]
    fn repeated_term_hits_leave_room_for_other_terms() {
        let text = "Digital sovereignty. Digital glitch. Platform.";
        let metadata = meta(json!({ "title": "T" }));
        let vocab = Vocabulary::from_terms([
            "digital sovereignty",
            "glitch art",
            "platform politics",
        ]);
        let out = suggest(&metadata, text, &vocab, &Analyzer::default());
        for term in ["digital sovereignty", "glitch art", "platform politics"] {
            assert!(out.tags.iter().any(|t| t == term), "{term} missing from {:?}", out.tags);
        }
    }

    #[test]
    fn unmatched_vocabulary_falls_back_to_broad_terms() {
        let metadata = meta(json!({ "title": "T" }));
        let vocab = Vocabulary::from_terms(["zebra crossing", "anomaly", "yellow submarine", "xylophone choir"]);
        let out = suggest(&metadata, TEXT, &vocab, &Analyzer::default());
        assert_eq!(out.categories, vec!["xylophone choir", "yellow submarine"]);
    }

    #[test]
    fn complete_metadata_gets_nothing() {
        let metadata = meta(json!({
            "title": "T",
            "excerpt": "An excerpt that is already comfortably longer than fifty characters.",
            "category": "Essays",
            "tags": ["a", "b", "c"],
        }));
        let out = suggest(&metadata, TEXT, &Vocabulary::default(), &Analyzer::default());
        assert!(out.is_empty());
        assert!(!out.keywords.is_empty());
    }

    #[test]
    fn few_tags_trigger_tag_suggestions() {
        let metadata = meta(json!({
            "excerpt": "An excerpt that is already comfortably longer than fifty characters.",
            "category": "Essays",
            "tags": ["one"],
        }));
        let out = suggest(&metadata, TEXT, &Vocabulary::default(), &Analyzer::default());
        assert!(out.excerpt.is_none());
        assert!(out.categories.is_empty());
        assert!(!out.tags.is_empty());
    }

    #[test]
    fn merge_keeps_existing_suggestions() {
        let mut metadata = meta(json!({ SUGGESTIONS_FIELD: { "suggested_excerpt": "old" } }));
        merge_suggestions(&mut metadata, meta(json!({ "suggested_tags": ["x"] })));
        assert_eq!(metadata[SUGGESTIONS_FIELD]["suggested_excerpt"], json!("old"));
        assert_eq!(metadata[SUGGESTIONS_FIELD]["suggested_tags"], json!(["x"]));
    }

    #[test]
    fn stage_writes_suggestions_into_metadata_file() {
        let dir = tempfile::tempdir().unwrap();
        let meta_path = dir.path().join("essay_metadata.json");
        let html_path = dir.path().join("essay.html");
        let guide_path = dir.path().join("STYLE.md");
        std::fs::write(&meta_path, r#"{"title": "Digital Sovereignty"}"#).unwrap();
        std::fs::write(&html_path, format!("<p>{TEXT}</p>")).unwrap();
        std::fs::write(&guide_path, "### Digital Sovereignty Theme\n").unwrap();

        let report =
            suggest_metadata_file(&meta_path, &html_path, &guide_path, &Analyzer::default()).unwrap();
        assert_eq!(report.status, ProcessStatus::Success);
        assert!(report.modified_file.is_some());

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&meta_path).unwrap()).unwrap();
        assert_eq!(
            written[SUGGESTIONS_FIELD]["suggested_categories"],
            json!(["digital sovereignty"])
        );
    }

    #[test]
    fn stage_reports_override_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let meta_path = dir.path().join("m.json");
        std::fs::write(&meta_path, r#"{"jules_override_ai_suggestions": true}"#).unwrap();

        let report = suggest_metadata_file(
            &meta_path,
            &dir.path().join("missing.html"),
            &dir.path().join("missing.md"),
            &Analyzer::default(),
        )
        .unwrap();
        assert_eq!(report.status, ProcessStatus::Success);
        assert!(report.summary.contains("overridden"));
        assert!(report.modified_file.is_none());
    }

    #[test]
    fn stage_fails_on_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let report = suggest_metadata_file(
            &dir.path().join("nope.json"),
            &dir.path().join("x.html"),
            &dir.path().join("x.md"),
            &Analyzer::default(),
        )
        .unwrap();
        assert!(report.status.is_failure());
        assert!(!report.errors.is_empty());
    }
}
