//! Keyword frequency ranking.

use std::collections::HashMap;

/// A ranked keyword and its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// The `n` most frequent words, by count descending. Ties keep first-occurrence order.
pub fn top_keywords(words: &[String], n: usize) -> Vec<KeywordCount> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, word) in words.iter().enumerate() {
        counts.entry(word.as_str()).or_insert((0, index)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(n)
        .map(|(word, count, _)| KeywordCount {
            word: word.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn ranks_by_count_then_first_occurrence() {
        let ranked = top_keywords(&words("beta alpha gamma alpha beta delta alpha"), 3);
        let names: Vec<_> = ranked.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[2].count, 1);
    }

    #[test]
    fn ties_are_stable() {
        let ranked = top_keywords(&words("zeta eta theta"), 10);
        let names: Vec<_> = ranked.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(names, vec!["zeta", "eta", "theta"]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(top_keywords(&[], 20).is_empty());
    }
}
