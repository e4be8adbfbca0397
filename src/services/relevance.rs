// src/services/relevance.rs
//
// Keyword relevance filter for indexer results.
//
// A result is kept when its title shares at least one significant keyword
// with any planned source title. Keywords are words of three or more
// characters that are not stop words or bare numbers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::domain::RawResult;

static STANDALONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+\b").expect("number regex should compile"));

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation regex should compile"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Articles, pronouns, auxiliaries
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do",
        "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
        "can", "need", "this", "that", "these", "those", "i", "you", "he", "she", "it", "we",
        "they", "what", "which", "who", "whom", "where", "when", "why", "how", "all", "each",
        "every", "both", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
        "only", "own", "same", "so", "than", "too", "very", "just",
        // Release vocabulary
        "season", "episode", "ep", "vol", "volume", "part", "chapter", "s01", "s02", "s03",
        "s04", "s1", "s2", "s3", "s4", "ova", "ona", "movie", "film", "gekijouban",
        "theatrical", "cinema", "special", "specials",
        // Common words in anime titles
        "love", "war", "world", "story", "tale", "life", "time", "day", "days", "night", "girl",
        "girls", "boy", "boys", "man", "men", "woman", "women", "school", "high", "magic",
        "battle", "fight", "hero", "heroes", "dragon", "sword", "king", "queen", "prince",
        "princess", "knight", "angel", "demon", "god", "devil", "soul", "spirit", "heart",
        "dream", "star", "stars", "moon", "sun", "sky", "sea", "ocean", "fire", "ice", "dark",
        "light", "black", "white", "red", "blue", "green", "golden", "new", "last", "first",
        "final", "ultimate", "great", "super", "mega", "zero", "one", "two", "three", "ii",
        "iii", "iv",
    ]
    .into_iter()
    .collect()
});

fn words(text: &str) -> HashSet<String> {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Significant keywords across all titles
pub fn extract_keywords<S: AsRef<str>>(titles: &[S]) -> HashSet<String> {
    titles
        .iter()
        .flat_map(|title| {
            let without_numbers = STANDALONE_NUMBER.replace_all(title.as_ref(), "");
            words(&without_numbers)
        })
        .filter(|word| word.chars().count() >= 3 && !STOP_WORDS.contains(word.as_str()))
        .collect()
}

/// Substring match between words of comparable length, e.g. `kaguya` / `kaguyasama`
fn is_partial_match(keyword: &str, word: &str) -> bool {
    let (k, w) = (keyword.chars().count(), word.chars().count());
    if k < 4 || w < 4 {
        return false;
    }
    let (shorter, longer, short_len, long_len) = if k <= w {
        (keyword, word, k, w)
    } else {
        (word, keyword, w, k)
    };
    short_len * 2 >= long_len && longer.contains(shorter)
}

pub fn is_relevant(title: &str, keywords: &HashSet<String>) -> bool {
    let result_words = words(title);
    keywords.iter().any(|keyword| {
        result_words.contains(keyword)
            || result_words.iter().any(|word| is_partial_match(keyword, word))
    })
}

/// Keeps results relevant to any of `titles`; with no usable keywords nothing is dropped
pub fn filter_relevant<S: AsRef<str>>(results: Vec<RawResult>, titles: &[S]) -> Vec<RawResult> {
    let keywords = extract_keywords(titles);
    if keywords.is_empty() {
        log::warn!("No significant keywords in search titles, relevance filter skipped");
        return results;
    }

    let before = results.len();
    let kept: Vec<RawResult> = results
        .into_iter()
        .filter(|r| {
            let keep = is_relevant(&r.title, &keywords);
            if !keep {
                log::debug!("Dropped irrelevant result: {}", r.title);
            }
            keep
        })
        .collect();

    if kept.len() < before {
        log::info!("Relevance filter kept {} of {} results", kept.len(), before);
    }
    kept
}
