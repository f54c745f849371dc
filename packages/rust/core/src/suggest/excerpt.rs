//! Extractive excerpt generation.

use std::collections::HashSet;

use super::Analyzer;
use super::tokenize::{BasicStopwords, content_words, normalize_whitespace};

const TITLE_KEYWORD_WEIGHT: f64 = 3.0;
const TOP_KEYWORD_WEIGHT: f64 = 1.0;
const POSITION_PENALTY: f64 = 0.1;
const LENGTH_BONUS: f64 = 0.5;
const LENGTH_BONUS_RANGE: (usize, usize) = (50, 200);
/// A best sentence longer than this share of the maximum stands alone.
const SOLO_SENTENCE_RATIO: f64 = 0.66;

/// A sentence with its extractive score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    pub text: String,
    pub score: f64,
}

/// Score every sentence of `text` against the title and top keywords.
/// The result is sorted best-first; equal scores keep document order.
pub fn score_sentences(
    text: &str,
    title: &str,
    top_keywords: &[String],
    analyzer: &Analyzer,
) -> Vec<ScoredSentence> {
    let normalized = normalize_whitespace(text);
    let title_keywords: HashSet<String> = content_words(title, &BasicStopwords).into_iter().collect();

    let mut scored: Vec<ScoredSentence> = analyzer
        .sentences
        .split(&normalized)
        .into_iter()
        .enumerate()
        .map(|(index, sentence)| {
            let words: HashSet<String> = content_words(&sentence, analyzer.stopwords.as_ref())
                .into_iter()
                .collect();

            let mut score = 0.0;
            score += TITLE_KEYWORD_WEIGHT
                * title_keywords.iter().filter(|k| words.contains(*k)).count() as f64;
            score += TOP_KEYWORD_WEIGHT
                * top_keywords.iter().filter(|k| words.contains(*k)).count() as f64;
            score -= index as f64 * POSITION_PENALTY;

            let len = sentence.chars().count();
            if LENGTH_BONUS_RANGE.0 < len && len < LENGTH_BONUS_RANGE.1 {
                score += LENGTH_BONUS;
            }

            ScoredSentence {
                text: sentence,
                score,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Build an excerpt of at most `max_chars` characters (plus `...` when cut).
///
/// Returns `None` when the text has no sentences.
pub fn generate_excerpt(
    text: &str,
    title: &str,
    top_keywords: &[String],
    analyzer: &Analyzer,
) -> Option<String> {
    let max_chars = analyzer.settings.excerpt_max_chars;
    let scored = score_sentences(text, title, top_keywords, analyzer);
    let best = scored.first()?;

    let mut excerpt = best.text.clone();
    if (excerpt.chars().count() as f64) <= max_chars as f64 * SOLO_SENTENCE_RATIO {
        for next in scored.iter().skip(1).take(2) {
            if excerpt.chars().count() + next.text.chars().count() + 1 < max_chars {
                excerpt.push(' ');
                excerpt.push_str(&next.text);
            }
        }
    }

    let excerpt = if excerpt.chars().count() > max_chars {
        let cut: String = excerpt.chars().take(max_chars).collect();
        format!("{}...", cut.trim())
    } else {
        excerpt.trim().to_string()
    };

    (!excerpt.is_empty()).then_some(excerpt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn title_keywords_dominate_scoring() {
        let analyzer = Analyzer::default();
        let text = "Weather was mild today. Digital sovereignty shapes every platform we build. Lunch was fine.";
        let scored = score_sentences(text, "Digital Sovereignty", &[], &analyzer);
        assert_eq!(scored[0].text, "Digital sovereignty shapes every platform we build.");
        assert!(scored[0].score > scored[1].score);
    }

    #[test]
    fn earlier_sentences_win_ties() {
        let analyzer = Analyzer::default();
        let scored = score_sentences("First plain. Second plain.", "", &[], &analyzer);
        assert_eq!(scored[0].text, "First plain.");
        assert!((scored[1].score - -0.1).abs() < 1e-9);
    }

    #[test]
    fn short_sentences_are_combined() {
        let analyzer = Analyzer::default();
        let excerpt =
            generate_excerpt("Alpha one. Beta two. Gamma three. Delta four.", "", &[], &analyzer)
                .unwrap();
        assert_eq!(excerpt, "Alpha one. Beta two. Gamma three.");
    }

    #[test]
    fn long_best_sentence_stands_alone() {
        let analyzer = Analyzer::default();
        let long = format!("Media {} ends here.", "word ".repeat(40));
        let text = format!("{long} Short tail.");
        let excerpt = generate_excerpt(&text, "media", &[], &analyzer).unwrap();
        assert!(excerpt.starts_with("Media"));
        assert!(!excerpt.contains("Short tail"));
    }

    #[test]
    fn excerpt_never_exceeds_limit_plus_ellipsis() {
        let analyzer = Analyzer::default();
        let text = format!("Keyword {}.", "lengthy ".repeat(80));
        let excerpt = generate_excerpt(&text, "keyword", &kw(&["keyword"]), &analyzer).unwrap();
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= 250 + 3);
    }

    #[test]
    fn keeps_source_casing() {
        let analyzer = Analyzer::default();
        let excerpt = generate_excerpt("The EMA Principles matter.", "", &[], &analyzer).unwrap();
        assert_eq!(excerpt, "The EMA Principles matter.");
    }

    #[test]
    fn empty_text_has_no_excerpt() {
        let analyzer = Analyzer::default();
        assert!(generate_excerpt("   ", "Title", &[], &analyzer).is_none());
    }
}
