//! Similarity scoring between dataset column names and reference fields.

use super::normalize::{normalize_name, tokenize};

/// Score for a normalized-name equality that is not an exact match.
const NORMALIZED_MATCH: f64 = 0.98;

/// Ceiling for matches that go through a synonym rather than the field's
/// own name, so a direct name match always wins ties.
const SYNONYM_CEILING: f64 = 0.97;

/// Penalty for single ultra-short tokens ("id", "nr") mapping onto longer
/// reference names.
const SHORT_NAME_PENALTY: f64 = 0.02;

/// Jaccard overlap between two token sets.
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    use std::collections::HashSet;
    let sa: HashSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let sb: HashSet<&str> = b.iter().map(|s| s.as_str()).collect();
    if sa.is_empty() && sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Similarity between two names in [0, 1].
///
/// Exact case-insensitive equality short-circuits at 1.0; otherwise the
/// maximum of normalized equality, token-set overlap, and an edit-distance
/// signal, with a small penalty for ultra-short source names.
pub fn name_similarity(src: &str, target: &str) -> f64 {
    if src.eq_ignore_ascii_case(target) {
        return 1.0;
    }

    let src_n = normalize_name(src);
    let target_n = normalize_name(target);
    if !src_n.is_empty() && src_n == target_n {
        return NORMALIZED_MATCH;
    }

    let src_tokens = tokenize(src);
    let target_tokens = tokenize(target);

    let token_overlap = jaccard(&src_tokens, &target_tokens);
    let edit = strsim::jaro_winkler(&src_n, &target_n);

    let mut score = token_overlap.max(edit);

    // Discourage mapping a bare "id"-like stub onto longer reference names.
    if src_tokens.len() <= 1
        && src_n.len() <= 2
        && src_n != target_n
    {
        score -= SHORT_NAME_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

/// Score of one reference field for a column: the maximum over the field's
/// own name and its synonyms, synonym hits capped just below a direct
/// name match.
pub fn field_score(column: &str, field: &str, synonyms: &[String]) -> f64 {
    let mut best = name_similarity(column, field);
    for alias in synonyms {
        let via_alias = name_similarity(column, alias).min(SYNONYM_CEILING);
        if via_alias > best {
            best = via_alias;
        }
    }
    best
}
