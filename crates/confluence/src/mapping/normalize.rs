//! Column-name normalization and tokenization.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+").unwrap());

/// Tokens too generic to carry mapping signal on their own.
const STOPWORDS: &[&str] = &[
    "id", "ids", "no", "num", "nr", "code", "cd", "key", "flag", "is", "has", "at", "dt", "ts",
    "ref", "uid",
];

/// Normalize a column or field name for comparison.
///
/// Splits camelCase at case boundaries, lowercases, folds every separator
/// run into a single underscore, and strips leading/trailing underscores.
pub fn normalize_name(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() && chars[i - 1].is_lowercase() {
            spaced.push('_');
        }
        spaced.push(c);
    }

    let lowered = spaced.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_sep = true;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Tokenize a name into alphanumeric words, minus common stopwords.
pub fn tokenize(name: &str) -> Vec<String> {
    let normalized = normalize_name(name);
    WORD_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}
