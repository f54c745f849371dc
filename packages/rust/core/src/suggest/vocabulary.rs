//! Core vocabulary extracted from the style-guidance document.
//!
//! The guide is read as a list of `###` sections. Theme and modifier headings,
//! labelled list items (`* Digital Sovereignty: ...`), short capitalized
//! list phrases, and bolded principle/concept items all become terms.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Terms too generic to categorize an article.
const GENERIC_TERMS: &[&str] = &[
    "name",
    "primary",
    "secondary",
    "accent",
    "background",
    "mood",
    "color shift",
    "intensity",
    "particle count",
    "animation style",
    "visual complexity",
];

/// Terms of this many characters or fewer are dropped.
const MIN_TERM_LEN: usize = 3;

/// Longest comma-separated phrase (in words) taken from an unlabelled list item.
const MAX_PHRASE_WORDS: usize = 3;

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[*-]\s*(.+)$").expect("valid regex"));
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z\s]+):").expect("valid regex"));
static CAPITALIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+").expect("valid regex"));
static BOLD_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[*-]\s*\*\*(.+?)\*\*\s*:").expect("valid regex"));

/// A `###` section of a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    /// Heading text without the leading hashes.
    pub heading: &'a str,
    /// Lines up to the next `###` heading.
    pub lines: Vec<&'a str>,
}

/// Split a document into `###` sections. Text before the first one is ignored.
pub fn sections(doc: &str) -> Vec<Section<'_>> {
    let mut out: Vec<Section<'_>> = Vec::new();
    for line in doc.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("###") {
            out.push(Section {
                heading: trimmed.trim_start_matches('#').trim(),
                lines: Vec::new(),
            });
        } else if let Some(current) = out.last_mut() {
            current.lines.push(line);
        }
    }
    out
}

/// Sorted set of lowercased vocabulary terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: BTreeSet<String>,
}

impl Vocabulary {
    /// Extract the vocabulary of a style-guidance document.
    pub fn from_style_guide(doc: &str) -> Self {
        let mut raw: Vec<String> = Vec::new();

        for section in sections(doc) {
            let heading = section.heading.to_lowercase();
            if heading.contains("theme") || heading.contains("modifier") {
                raw.push(heading.replace("theme", "").replace("modifier", ""));
            }

            for line in &section.lines {
                if let Some(caps) = LIST_ITEM_RE.captures(line) {
                    collect_list_item(&caps[1], &mut raw);
                }
            }

            if heading.contains("principles") || heading.contains("concepts") {
                for line in &section.lines {
                    if let Some(caps) = BOLD_ITEM_RE.captures(line) {
                        raw.push(caps[1].to_string());
                    }
                }
            }
        }

        Self::from_terms(raw)
    }

    /// Build from raw terms, applying normalization and the generic/length filters.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| t.chars().count() > MIN_TERM_LEN && !GENERIC_TERMS.contains(&t.as_str()))
            .collect();
        Self { terms }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms matching `keyword` exactly or through one of their words.
    pub fn matches<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |term| *term == keyword || term.split_whitespace().any(|w| w == keyword))
    }
}

fn collect_list_item(item: &str, out: &mut Vec<String>) {
    let item = item.replace('*', "");
    let item = item.trim();

    if let Some(caps) = LABEL_RE.captures(item) {
        out.push(caps[1].to_string());
        return;
    }

    for piece in item.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if piece.split_whitespace().count() <= MAX_PHRASE_WORDS && CAPITALIZED_RE.is_match(piece) {
            out.push(piece.to_string());
        }
    }
}
