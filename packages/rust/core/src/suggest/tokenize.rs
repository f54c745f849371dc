//! Word and sentence tokenization for keyword analysis.

use std::collections::HashSet;
use std::sync::LazyLock;

use editorial_shared::{SentenceStrategy, StopwordStrategy};
use regex::Regex;

static STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.?!]").expect("valid regex"));
static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s.?!]+").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lowercased words of `text`, with punctuation other than sentence enders
/// removed and sentence enders treated as separators.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = STRIP_RE.replace_all(&lowered, "");
    SPLIT_RE
        .split(&cleaned)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// [`tokenize`] with stopwords removed.
pub fn content_words(text: &str, stopwords: &dyn StopwordList) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| !stopwords.contains(w))
        .collect()
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Stopwords
// ---------------------------------------------------------------------------

pub trait StopwordList: Send + Sync {
    fn name(&self) -> &'static str;
    /// `word` is expected lowercased.
    fn contains(&self, word: &str) -> bool;
}

/// Pick the stopword list selected in configuration.
pub fn stopwords_for(strategy: StopwordStrategy) -> Box<dyn StopwordList> {
    match strategy {
        StopwordStrategy::Comprehensive => Box::new(ComprehensiveStopwords),
        StopwordStrategy::Basic => Box::new(BasicStopwords),
    }
}

const BASIC_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "o", "of", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she",
    "should", "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves", "article", "section", "page", "chapter", "paragraph", "fig", "figure",
    "table", "title", "subject", "date", "author", "content", "text", "example", "examples",
    "however", "therefore", "introduction", "conclusion", "summary", "abstract", "detail",
    "details", "information", "issue", "issues", "solution", "solutions", "problem",
    "problems", "context", "background", "overview", "analysis", "study", "approach",
    "method", "methods", "result", "results", "discussion", "reference", "references",
    "appendix",
];

// Contractions and auxiliaries missing from the basic list.
const EXTENDED_WORDS: &[&str] = &[
    "d", "ll", "m", "re", "ve", "y", "ain", "aren", "couldn", "didn", "doesn", "hadn", "hasn",
    "haven", "isn", "ma", "mightn", "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won",
    "wouldn", "don", "it's", "you're", "you've", "you'll", "you'd", "she's", "that'll",
    "should've", "off", "also", "could", "would", "might", "must", "shall", "may", "us",
    "every", "many", "much", "yet", "still", "even", "ever", "whether", "though", "although",
    "within", "without", "upon", "across", "along", "among", "around", "via", "one", "two",
    "get", "got", "make", "made", "like", "well", "way",
];

static BASIC_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| BASIC_WORDS.iter().copied().collect());

static COMPREHENSIVE_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    BASIC_WORDS
        .iter()
        .chain(EXTENDED_WORDS.iter())
        .copied()
        .collect()
});

/// Fixed English list plus editorial filler words ("article", "section", ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicStopwords;

impl StopwordList for BasicStopwords {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn contains(&self, word: &str) -> bool {
        BASIC_SET.contains(word)
    }
}

/// The basic list extended with contractions, modals and common filler verbs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComprehensiveStopwords;

impl StopwordList for ComprehensiveStopwords {
    fn name(&self) -> &'static str {
        "comprehensive"
    }

    fn contains(&self, word: &str) -> bool {
        COMPREHENSIVE_SET.contains(word)
    }
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

pub trait SentenceSplitter: Send + Sync {
    fn name(&self) -> &'static str;
    /// Split whitespace-normalized text into trimmed, non-empty sentences.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Pick the sentence splitter selected in configuration.
pub fn splitter_for(strategy: SentenceStrategy) -> Box<dyn SentenceSplitter> {
    match strategy {
        SentenceStrategy::AbbreviationAware => Box::new(AbbreviationAwareSplitter),
        SentenceStrategy::Punctuation => Box::new(PunctuationSplitter),
    }
}

/// Splits after `.`, `!` or `?` followed by whitespace.
#[derive(Debug, Default, Clone, Copy)]
pub struct PunctuationSplitter;

impl SentenceSplitter for PunctuationSplitter {
    fn name(&self) -> &'static str {
        "punctuation"
    }

    fn split(&self, text: &str) -> Vec<String> {
        split_with(text, |_, _| true)
    }
}

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "e.g", "i.e", "cf", "fig", "approx",
    "dept", "vol", "u.s", "a.m", "p.m",
];

/// Capitalized words that usually open a new sentence rather than continue a name.
const SENTENCE_STARTERS: &[&str] = &[
    "a", "after", "an", "and", "as", "at", "before", "but", "he", "her", "his", "how", "however",
    "i", "if", "in", "it", "its", "my", "no", "on", "our", "she", "so", "that", "the", "their",
    "then", "there", "these", "they", "this", "those", "we", "what", "when", "where", "why",
    "yes", "you",
];

/// `word` is an uppercase initial (`J`) continued by another initial or a
/// capitalized name, as in `J. R. Tolkien` or `John F. Kennedy`.
fn is_name_initial(word: &str, after: &str) -> bool {
    let mut chars = word.chars();
    if !matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase()) {
        return false;
    }
    let next = after.split_whitespace().next().unwrap_or("");
    if !next.chars().next().is_some_and(char::is_uppercase) {
        return false;
    }
    let bare = next.trim_end_matches(|c: char| !c.is_alphanumeric());
    let next_is_initial = bare.chars().count() == 1 && next.ends_with('.');
    next_is_initial || !SENTENCE_STARTERS.contains(&bare.to_lowercase().as_str())
}

/// Like [`PunctuationSplitter`], but keeps abbreviations (`e.g.`, `Dr.`),
/// name initials and lowercase continuations inside the sentence.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbbreviationAwareSplitter;

impl SentenceSplitter for AbbreviationAwareSplitter {
    fn name(&self) -> &'static str {
        "abbreviation-aware"
    }

    fn split(&self, text: &str) -> Vec<String> {
        split_with(text, |before, after| {
            let last_word = before
                .rsplit(char::is_whitespace)
                .next()
                .unwrap_or("")
                .trim_start_matches(['(', '"', '\''])
                .trim_end_matches(['.', '!', '?']);

            if before.ends_with('.') {
                if ABBREVIATIONS.contains(&last_word.to_lowercase().as_str()) {
                    return false;
                }
                if is_name_initial(last_word, after) {
                    return false;
                }
            }

            !after
                .trim_start()
                .chars()
                .next()
                .is_some_and(char::is_lowercase)
        })
    }
}

/// Cut after each sentence ender followed by whitespace when `accept(before, after)`.
fn split_with(text: &str, accept: impl Fn(&str, &str) -> bool) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_i, next_c)) = chars.peek() else {
            break;
        };
        if !next_c.is_whitespace() {
            continue;
        }
        let end = i + c.len_utf8();
        if accept(&text[start..end], &text[next_i..]) {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}
