//! Visual-mood → theme-parameter mapping.
//!
//! Rules come from the style guide's keyword-mapping section:
//!
//! ```text
//! ### Visual Mood Keyword Mapping for AI Suggestions
//! *   **calm**: intensity(*0.8), particleCount(-20), animationStyle("gentle")
//! *   **dark**: colorShift.l(-15)
//! ```
//!
//! A leading `+ - * /` applies arithmetic to the current value; no prefix sets
//! it. Mapping a mood string is a pure function of the string and the table.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use editorial_shared::{Metadata, ProcessStatus, Result, ScriptReport, non_empty_str};

use crate::io::{read_json_object, read_text, write_json_pretty};
use crate::suggest::vocabulary::sections;

/// Heading of the rule section, compared case-insensitively.
pub const RULES_HEADING: &str = "Visual Mood Keyword Mapping for AI Suggestions";

static RULE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\s*\*\*(.+?)\*\*\s*:\s*(.+?)\s*$").expect("valid regex"));
static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z0-9._]+)\s*\(([-+*/]?\s*".*?"|[-+*/]?\s*[\d.]+)\)"#).expect("valid regex")
});
static MOOD_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,_-]+").expect("valid regex"));
static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{3}){1,2}$").expect("valid regex"));

/// Hue (degrees) for recognised color names.
pub const COLOR_HUES: &[(&str, i64)] = &[
    ("red", 0),
    ("orange", 30),
    ("yellow", 60),
    ("green", 120),
    ("cyan", 180),
    ("blue", 210),
    ("purple", 270),
    ("magenta", 300),
    ("pink", 330),
];

fn hue_of(name: &str) -> Option<i64> {
    COLOR_HUES.iter().find(|(n, _)| *n == name).map(|(_, h)| *h)
}

// ---------------------------------------------------------------------------
// Values and rules
// ---------------------------------------------------------------------------

/// A theme parameter value. Integers stay integers through `+ - *`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }

    fn is_zero(&self) -> bool {
        self.as_f64() == Some(0.0)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl RuleOp {
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::Set => "",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRule {
    pub value: ParamValue,
    pub op: RuleOp,
}

impl std::fmt::Display for ParamRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.value)
    }
}

/// Keyword → parameter → rule, loaded once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: BTreeMap<String, BTreeMap<String, ParamRule>>,
}

impl RuleTable {
    /// Parse the keyword-mapping section of a style guide. A guide without
    /// that section yields an empty table.
    pub fn from_style_guide(doc: &str) -> Self {
        let mut table = Self::default();
        let heading = RULES_HEADING.to_lowercase();

        let Some(section) = sections(doc)
            .into_iter()
            .find(|s| s.heading.to_lowercase().starts_with(&heading))
        else {
            return table;
        };

        for line in section.lines {
            let Some(caps) = RULE_LINE_RE.captures(line) else {
                continue;
            };
            let keyword = caps[1].trim().to_lowercase();
            let params = parse_params(&caps[2]);
            table.rules.insert(keyword, params);
        }
        table
    }

    pub fn get(&self, keyword: &str) -> Option<&BTreeMap<String, ParamRule>> {
        self.rules.get(keyword)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

fn parse_params(spec: &str) -> BTreeMap<String, ParamRule> {
    let mut params = BTreeMap::new();
    for caps in PARAM_RE.captures_iter(spec) {
        let raw = caps[2].trim();
        let (op, rest) = match raw.chars().next().and_then(RuleOp::from_prefix) {
            Some(op) => (op, raw[1..].trim()),
            None => (RuleOp::Set, raw),
        };
        params.insert(caps[1].to_string(), ParamRule {
            value: parse_value(rest),
            op,
        });
    }
    params
}

fn parse_value(raw: &str) -> ParamValue {
    let parsed = if raw.contains('.') {
        raw.parse::<f64>().ok().map(ParamValue::Float)
    } else {
        raw.parse::<i64>().ok().map(ParamValue::Int)
    };
    parsed.unwrap_or_else(|| ParamValue::Text(raw.trim_matches('"').to_string()))
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Parameters every mapping starts from.
pub fn default_params() -> BTreeMap<String, ParamValue> {
    BTreeMap::from([
        ("colorShift.h".to_string(), ParamValue::Int(0)),
        ("colorShift.s".to_string(), ParamValue::Int(0)),
        ("colorShift.l".to_string(), ParamValue::Int(0)),
        ("intensity".to_string(), ParamValue::Float(1.0)),
        ("particleCount".to_string(), ParamValue::Int(100)),
        ("animationStyle".to_string(), ParamValue::Text("smooth".into())),
        ("visualComplexity".to_string(), ParamValue::Text("medium".into())),
    ])
}

/// Mood tokens split into general keywords and color hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodTokens {
    pub keywords: Vec<String>,
    pub color_names: Vec<String>,
    pub hex_colors: Vec<String>,
}

pub fn tokenize_mood(mood: &str) -> MoodTokens {
    let lowered = mood.to_lowercase();
    let mut tokens = MoodTokens::default();
    for token in MOOD_SPLIT_RE.split(&lowered).filter(|t| !t.is_empty()) {
        if HEX_RE.is_match(token) {
            tokens.hex_colors.push(token.to_string());
        } else if hue_of(token).is_some() {
            tokens.color_names.push(token.to_string());
        } else {
            tokens.keywords.push(token.to_string());
        }
    }
    tokens
}

/// Result of interpreting one mood string.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodMapping {
    /// Final parameters; empty when nothing in the mood applied.
    pub params: BTreeMap<String, ParamValue>,
    pub trace: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub unmatched_keywords: Vec<String>,
    pub tokens: MoodTokens,
    pub rules_found: bool,
    pub rationale: String,
}

impl MoodMapping {
    pub fn suggestions_generated(&self) -> bool {
        !self.params.is_empty()
    }
}

/// Map a mood string through the rule table.
pub fn map_mood(mood: &str, rules: &RuleTable) -> MoodMapping {
    let tokens = tokenize_mood(mood);
    let mut params = default_params();
    let mut trace = vec![format!("Interpreting visual mood: '{mood}'.")];
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for keyword in &tokens.keywords {
        let Some(keyword_rules) = rules.get(keyword) else {
            unmatched.push(keyword.clone());
            continue;
        };
        matched.push(keyword.clone());
        let described: Vec<String> = keyword_rules
            .iter()
            .map(|(param, rule)| format!("{param}({rule})"))
            .collect();
        trace.push(format!("Keyword '{keyword}' suggests: {}.", described.join(", ")));

        for (param, rule) in keyword_rules {
            match apply_rule(params.get(param), rule) {
                Ok(value) => {
                    params.insert(param.clone(), value);
                }
                Err(reason) => trace.push(format!("Skipped {param}({rule}): {reason}.")),
            }
        }
    }

    let mut color_applied = false;
    if let Some(name) = tokens.color_names.first() {
        if let Some(hue) = hue_of(name) {
            params.insert("colorShift.h".into(), ParamValue::Int(hue));
            trace.push(format!("Color name '{name}' suggests Hue: {hue}."));
            color_applied = true;
        }
    }
    if !tokens.hex_colors.is_empty() {
        trace.push(format!(
            "Hex color(s) {} found; hex colors are not converted, set HSL values manually.",
            tokens.hex_colors.join(", ")
        ));
    }

    let generated = !matched.is_empty() || color_applied;
    let rationale = if generated {
        "Suggestions are based on matching keywords from 'visual_mood' to rules in the style guide and interpreting explicit color mentions."
    } else {
        trace.push(format!(
            "Visual mood '{mood}' did not map to any keyword rule or color hint."
        ));
        params.clear();
        "No specific parameter changes suggested based on current rules and mood string."
    };

    debug!(matched = matched.len(), generated, "mood mapped");

    MoodMapping {
        params,
        trace,
        matched_keywords: matched,
        unmatched_keywords: unmatched,
        tokens,
        rules_found: !rules.is_empty(),
        rationale: rationale.to_string(),
    }
}

/// Apply one rule to the current value, or say why it was skipped.
pub fn apply_rule(
    current: Option<&ParamValue>,
    rule: &ParamRule,
) -> std::result::Result<ParamValue, String> {
    use ParamValue::{Float, Int, Text};

    let identity = match rule.op {
        RuleOp::Set => return Ok(rule.value.clone()),
        RuleOp::Add | RuleOp::Subtract => Int(0),
        RuleOp::Multiply | RuleOp::Divide => Int(1),
    };
    let base = current.unwrap_or(&identity);

    if matches!(base, Text(_)) || matches!(rule.value, Text(_)) {
        return Err(format!("'{}' does not apply to text", rule.op.symbol()));
    }
    if rule.op == RuleOp::Divide && rule.value.is_zero() {
        return Err("division by zero".to_string());
    }

    if let (Int(a), Int(b)) = (base, &rule.value) {
        let exact = match rule.op {
            RuleOp::Add => a.checked_add(*b),
            RuleOp::Subtract => a.checked_sub(*b),
            RuleOp::Multiply => a.checked_mul(*b),
            _ => None,
        };
        if let Some(v) = exact {
            return Ok(Int(v));
        }
    }

    let (a, b) = match (base.as_f64(), rule.value.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err("non-numeric operand".to_string()),
    };
    Ok(Float(match rule.op {
        RuleOp::Add => a + b,
        RuleOp::Subtract => a - b,
        RuleOp::Multiply => a * b,
        _ => a / b,
    }))
}

// ---------------------------------------------------------------------------
// ThemeSuggestions file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorHints {
    pub hex: Vec<String>,
    pub name: Vec<String>,
}

/// The `theme_suggestions.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSuggestions {
    pub applies_to_article_id: String,
    pub source_visual_mood: String,
    pub ai_interpretation: String,
    #[serde(rename = "suggested_sectionModifier_params", default)]
    pub params: BTreeMap<String, ParamValue>,
    pub rationale: String,
    #[serde(default)]
    pub style_guidance_rules_found: bool,
    #[serde(default)]
    pub parsed_mood_keywords: Vec<String>,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub unmatched_keywords: Vec<String>,
    #[serde(default)]
    pub parsed_color_hints: ColorHints,
}

impl ThemeSuggestions {
    pub fn new(article_id: &str, mood: &str, mapping: MoodMapping) -> Self {
        Self {
            applies_to_article_id: article_id.to_string(),
            source_visual_mood: mood.to_string(),
            ai_interpretation: mapping.trace.join(" "),
            params: mapping.params,
            rationale: mapping.rationale,
            style_guidance_rules_found: mapping.rules_found,
            parsed_mood_keywords: mapping.tokens.keywords,
            matched_keywords: mapping.matched_keywords,
            unmatched_keywords: mapping.unmatched_keywords,
            parsed_color_hints: ColorHints {
                hex: mapping.tokens.hex_colors,
                name: mapping.tokens.color_names,
            },
        }
    }
}

/// Article id from metadata, else the file name without `_metadata.json`.
pub fn article_id_for(metadata: &Metadata, metadata_path: &Path) -> String {
    if let Some(id) = non_empty_str(metadata, "id") {
        return id.to_string();
    }
    let name = metadata_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix("_metadata.json")
        .map(str::to_string)
        .unwrap_or_else(|| {
            metadata_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

/// `suggest-visuals` stage: map the article's `visual_mood` and write the
/// theme suggestions file.
#[instrument(fields(metadata = %metadata_path.display()))]
pub fn suggest_visuals_file(
    metadata_path: &Path,
    style_guide_path: &Path,
    output_path: &Path,
) -> Result<ScriptReport> {
    let metadata = match read_json_object(metadata_path) {
        Ok(m) => m,
        Err(e) => {
            return Ok(ScriptReport::failure(
                "Error loading metadata.",
                format!("Error loading metadata: {e}"),
            ));
        }
    };

    let article_id = article_id_for(&metadata, metadata_path);
    let Some(mood) = non_empty_str(&metadata, "visual_mood") else {
        return Ok(ScriptReport {
            status: ProcessStatus::Success,
            modified_file: None,
            summary: "No 'visual_mood' found in metadata.".into(),
            errors: Vec::new(),
            details: json!({ "article_id": article_id, "suggestions_generated": false }),
        });
    };

    let mut errors = Vec::new();
    let rules = match read_text(style_guide_path) {
        Ok(guide) => RuleTable::from_style_guide(&guide),
        Err(e) => {
            warn!(error = %e, "style guide unreadable");
            errors.push(format!("Style guide unreadable: {e}"));
            RuleTable::default()
        }
    };
    if rules.is_empty() {
        errors.push("No rules parsed from style guidance.".to_string());
    }

    let mapping = map_mood(mood, &rules);
    let generated = mapping.suggestions_generated();
    let suggestions = ThemeSuggestions::new(&article_id, mood, mapping);
    write_json_pretty(output_path, &suggestions)?;
    info!(%article_id, generated, "theme suggestions written");

    let summary = if generated {
        "Visual theme suggestions generated."
    } else {
        "No specific visual theme suggestions generated based on mood."
    };

    Ok(ScriptReport {
        status: ProcessStatus::from_warnings(&errors),
        modified_file: Some(output_path.display().to_string()),
        summary: summary.into(),
        errors,
        details: json!({
            "article_id": article_id,
            "suggestions_generated": generated,
            "params": suggestions.params,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUIDE: &str = r#"
### Palette
* **ignored**: intensity(9)

### Visual Mood Keyword Mapping for AI Suggestions
*   **calm**: intensity(*0.8), particleCount(-20), animationStyle("gentle")
*   **dark**: colorShift.l(-15)
*   **frantic**: particleCount(*2), intensity(+0.5)
*   **broken**: animationStyle(+1), intensity(/0)

### Next Section
* **late**: intensity(5)
"#;

    fn table() -> RuleTable {
        RuleTable::from_style_guide(GUIDE)
    }

    #[test]
    fn parses_rules_from_mapping_section_only() {
        let rules = table();
        assert_eq!(rules.len(), 4);
        assert!(rules.get("ignored").is_none());
        assert!(rules.get("late").is_none());

        let calm = rules.get("calm").unwrap();
        assert_eq!(calm["intensity"], ParamRule { value: ParamValue::Float(0.8), op: RuleOp::Multiply });
        assert_eq!(calm["particleCount"], ParamRule { value: ParamValue::Int(20), op: RuleOp::Subtract });
        assert_eq!(
            calm["animationStyle"],
            ParamRule { value: ParamValue::Text("gentle".into()), op: RuleOp::Set }
        );
    }

    #[test]
    fn calm_blue_scales_intensity_and_sets_hue() {
        let mapping = map_mood("calm blue", &table());
        assert_eq!(mapping.params["intensity"], ParamValue::Float(0.8));
        assert_eq!(mapping.params["colorShift.h"], ParamValue::Int(210));
        assert_eq!(mapping.params["particleCount"], ParamValue::Int(80));
        assert_eq!(mapping.params["animationStyle"], ParamValue::Text("gentle".into()));
        assert_eq!(mapping.matched_keywords, vec!["calm"]);
        assert_eq!(mapping.tokens.color_names, vec!["blue"]);
    }

    #[test]
    fn integers_stay_integers_except_division() {
        let mapping = map_mood("frantic", &table());
        assert_eq!(mapping.params["particleCount"], ParamValue::Int(200));
        assert_eq!(mapping.params["intensity"], ParamValue::Float(1.5));

        let rule = ParamRule { value: ParamValue::Int(2), op: RuleOp::Divide };
        assert_eq!(apply_rule(Some(&ParamValue::Int(5)), &rule), Ok(ParamValue::Float(2.5)));
    }

    #[test]
    fn unset_bases_use_operator_identity() {
        let add = ParamRule { value: ParamValue::Int(7), op: RuleOp::Add };
        assert_eq!(apply_rule(None, &add), Ok(ParamValue::Int(7)));
        let mul = ParamRule { value: ParamValue::Float(0.5), op: RuleOp::Multiply };
        assert_eq!(apply_rule(None, &mul), Ok(ParamValue::Float(0.5)));
    }

    #[test]
    fn text_arithmetic_and_zero_division_are_skipped() {
        let mapping = map_mood("broken", &table());
        assert_eq!(mapping.params["animationStyle"], ParamValue::Text("smooth".into()));
        assert_eq!(mapping.params["intensity"], ParamValue::Float(1.0));
        assert!(mapping.trace.iter().any(|t| t.contains("does not apply to text")));
        assert!(mapping.trace.iter().any(|t| t.contains("division by zero")));
    }

    #[test]
    fn only_first_color_name_applies() {
        let mapping = map_mood("red-green", &RuleTable::default());
        assert_eq!(mapping.params["colorShift.h"], ParamValue::Int(0));
        assert_eq!(mapping.tokens.color_names, vec!["red", "green"]);
        assert!(mapping.suggestions_generated());
    }

    #[test]
    fn hex_colors_are_noted_not_applied() {
        let mapping = map_mood("#FF00aa, moody_#abc", &RuleTable::default());
        assert_eq!(mapping.tokens.hex_colors, vec!["#ff00aa", "#abc"]);
        assert_eq!(mapping.tokens.keywords, vec!["moody"]);
        assert!(mapping.params.is_empty());
        assert!(mapping.trace.iter().any(|t| t.contains("#ff00aa")));
    }

    #[test]
    fn unmatched_mood_yields_empty_params() {
        let mapping = map_mood("serene", &table());
        assert!(mapping.params.is_empty());
        assert_eq!(mapping.unmatched_keywords, vec!["serene"]);
        assert!(mapping.rules_found);
        assert!(mapping.rationale.starts_with("No specific"));
    }

    #[test]
    fn mapping_is_deterministic() {
        let rules = table();
        let a = map_mood("calm dark frantic purple", &rules);
        let b = map_mood("calm dark frantic purple", &rules);
        assert_eq!(a, b);
        assert_eq!(a.params["colorShift.l"], ParamValue::Int(-15));
    }

    #[test]
    fn param_values_serialize_untagged() {
        let json = serde_json::to_value(default_params()).unwrap();
        assert_eq!(json["intensity"], serde_json::json!(1.0));
        assert_eq!(json["particleCount"], serde_json::json!(100));
        assert_eq!(json["animationStyle"], serde_json::json!("smooth"));
    }

    #[test]
    fn id_falls_back_to_file_name() {
        let path = Path::new("/staging/my_essay_metadata.json");
        assert_eq!(article_id_for(&Metadata::new(), path), "my_essay");
    }

    #[test]
    fn stage_writes_theme_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let meta = dir.path().join("essay_metadata.json");
        let guide = dir.path().join("STYLE.md");
        let out = dir.path().join("out/theme_suggestions.json");
        std::fs::write(&meta, r#"{"id": "essay", "visual_mood": "calm blue"}"#).unwrap();
        std::fs::write(&guide, GUIDE).unwrap();

        let report = suggest_visuals_file(&meta, &guide, &out).unwrap();
        assert_eq!(report.status, ProcessStatus::Success);

        let written: ThemeSuggestions =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written.applies_to_article_id, "essay");
        assert_eq!(written.params["colorShift.h"], ParamValue::Int(210));
        assert!(written.style_guidance_rules_found);
    }

    #[test]
    fn stage_without_mood_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let meta = dir.path().join("a_metadata.json");
        let out = dir.path().join("theme.json");
        std::fs::write(&meta, r#"{"title": "x"}"#).unwrap();

        let report = suggest_visuals_file(&meta, &dir.path().join("g.md"), &out).unwrap();
        assert!(!report.status.is_failure());
        assert!(!out.exists());
    }
}
