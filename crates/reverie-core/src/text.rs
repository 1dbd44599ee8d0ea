//! Text helpers shared by the detectors
//!
//! Previews keep evidence free of full entry bodies; the tokenizer feeds the
//! lexical clustering engine.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Maximum characters in a derived preview snippet
pub const PREVIEW_MAX_CHARS: usize = 40;

/// Tokens shorter than this never survive tokenization
pub const MIN_TOKEN_LEN: usize = 3;

/// Common filler words excluded from lexical overlap.
///
/// Journaling prose is dominated by these; leaving them in would connect
/// nearly every pair of entries.
const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "always", "and", "another", "any", "are", "back", "because",
    "been", "before", "being", "but", "came", "can", "could", "day", "did", "does", "doing",
    "don", "down", "each", "even", "feel", "feeling", "felt", "for", "from", "get", "going",
    "got", "had", "has", "have", "her", "here", "him", "his", "how", "into", "its", "just",
    "know", "like", "little", "made", "make", "maybe", "more", "most", "much", "myself", "need",
    "never", "not", "now", "off", "one", "only", "other", "our", "out", "over", "really", "said",
    "she", "should", "some", "something", "still", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "thing", "things", "think", "this", "those", "though", "through",
    "time", "today", "too", "very", "want", "wanted", "was", "way", "well", "went", "were",
    "what", "when", "where", "which", "while", "who", "why", "will", "with", "would", "you",
    "your",
];

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]+").expect("static pattern"))
}

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Derive a short snippet from an entry body: the first non-empty line, or
/// the first [`PREVIEW_MAX_CHARS`] characters with an ellipsis.
///
/// Evidence carries previews only, never the full body.
pub fn preview(text: &str) -> String {
    let first_line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let chars: Vec<char> = first_line.chars().collect();
    if chars.len() <= PREVIEW_MAX_CHARS {
        first_line.to_string()
    } else {
        let mut s: String = chars[..PREVIEW_MAX_CHARS].iter().collect();
        s.push('…');
        s
    }
}

/// Tokenize an entry body for lexical overlap: lowercase, strip non-word
/// characters, split on whitespace, drop short tokens and stopwords.
///
/// Preserves first-occurrence order; duplicates are kept so callers can
/// count frequencies. Use [`token_set`] for set semantics.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = non_word_re().replace_all(&lowered, " ");
    stripped
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .filter(|t| !stopword_set().contains(t))
        .map(str::to_string)
        .collect()
}

/// Distinct tokens of an entry body.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Jaccard similarity |A∩B| / |A∪B| between two token sets.
///
/// Symmetric by construction; 0.0 when both sets are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_first_line() {
        assert_eq!(preview("Short title\nlong body follows"), "Short title");
        assert_eq!(preview("\n\n  padded line  \nmore"), "padded line");
    }

    #[test]
    fn test_preview_truncates_long_line() {
        let long = "a".repeat(60);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_MAX_CHARS + 1);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_preview_is_char_boundary_safe() {
        let long = "é".repeat(60);
        let p = preview(&long);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_tokenize_strips_and_filters() {
        let tokens = tokenize("The budget, the BUDGET! We can't afford it.");
        assert_eq!(tokens, vec!["budget", "budget", "afford"]);
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("go to gym at 6am");
        assert!(!tokens.contains(&"go".to_string()));
        assert!(tokens.contains(&"gym".to_string()));
    }

    #[test]
    fn test_jaccard_symmetric() {
        let a = token_set("budget stress work");
        let b = token_set("budget work deadline");
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
        // |{budget, work}| / |{budget, stress, work, deadline}| = 2/4
        assert!((jaccard(&a, &b) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jaccard_empty_sets() {
        let empty = HashSet::new();
        assert_eq!(jaccard(&empty, &empty), 0.0);
    }
}
