use super::canonical::CanonicalTitle;
use super::resolve::{merge_fuzzy_match_titles, should_merge_fuzzy_match_titles};
use crate::constants::DEFAULT_FUZZY_THRESHOLD;
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

/// Levenshtein similarity on a 0-100 scale, 100 meaning identical.
///
/// `100 * (1 - distance / max(len_a, len_b, 1))`, lengths counted in chars.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    let distance = strsim::levenshtein(a, b);
    100.0 * (1.0 - distance as f64 / max_len as f64)
}

/// Whether the similarity ratio of `a` and `b` is strictly above `threshold`.
///
/// Compared in integers so a pair sitting exactly on the threshold never
/// flips because of float rounding.
pub fn exceeds_threshold(a: &str, b: &str, threshold: u32) -> bool {
    let max_len = a.chars().count().max(b.chars().count()).max(1);
    let distance = strsim::levenshtein(a, b).min(max_len);
    100 * (max_len - distance) > threshold as usize * max_len
}

/// A row's fuzzy-match candidate and how similar it is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyCandidate {
    pub index: usize,
    pub score: f64,
}

/// For each row, the other rows whose normalized titles score above the
/// threshold, best score first (ties in row order).
pub fn find_fuzzy_candidates(titles: &[CanonicalTitle], threshold: u32) -> Vec<Vec<FuzzyCandidate>> {
    titles
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut candidates: Vec<FuzzyCandidate> = titles
                .iter()
                .enumerate()
                .filter(|(j, other)| {
                    *j != i
                        && exceeds_threshold(&row.normalized_title, &other.normalized_title, threshold)
                })
                .map(|(j, other)| FuzzyCandidate {
                    index: j,
                    score: similarity_ratio(&row.normalized_title, &other.normalized_title),
                })
                .collect();
            candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            candidates
        })
        .collect()
}

/// Merge rows whose normalized titles are similar but not identical, using the
/// default threshold.
pub fn handle_fuzzy_match_titles(titles: Vec<CanonicalTitle>) -> Vec<CanonicalTitle> {
    merge_similar_titles(titles, DEFAULT_FUZZY_THRESHOLD)
}

/// Merge rows whose normalized titles are similar but not identical.
///
/// Rows with the most candidates are resolved first. Each row absorbs every
/// candidate not yet consumed by an earlier group, provided the two never both
/// carry an id for the same source. A consumed row is never emitted again, so
/// mutual candidates merge exactly once.
///
/// Known weakness: sequels share most of their title with the original
/// ("the matrix" vs "the matrix 3" scores 83) and are merged when their
/// sources don't collide.
#[instrument(skip_all, fields(rows = titles.len(), threshold = threshold))]
pub fn merge_similar_titles(titles: Vec<CanonicalTitle>, threshold: u32) -> Vec<CanonicalTitle> {
    let candidates = find_fuzzy_candidates(&titles, threshold);

    // Stable sort: rows with equal candidate counts keep their input order.
    let mut order: Vec<usize> = (0..titles.len()).collect();
    order.sort_by(|&a, &b| candidates[b].len().cmp(&candidates[a].len()));

    let mut consumed = vec![false; titles.len()];
    let mut merged_titles = Vec::with_capacity(titles.len());
    let mut merges = 0usize;

    for idx in order {
        if consumed[idx] {
            continue;
        }
        consumed[idx] = true;

        let mut current = titles[idx].clone();
        for candidate in &candidates[idx] {
            if consumed[candidate.index] {
                continue;
            }
            let other = &titles[candidate.index];
            if should_merge_fuzzy_match_titles(&current, other) {
                debug!(
                    left = %current.normalized_title,
                    right = %other.normalized_title,
                    score = candidate.score,
                    "Fuzzy match merged"
                );
                current = merge_fuzzy_match_titles(&current, other);
                consumed[candidate.index] = true;
                merges += 1;
            } else {
                debug!(
                    left = %current.normalized_title,
                    right = %other.normalized_title,
                    score = candidate.score,
                    "Fuzzy match refused, both rows carry an id from the same source"
                );
            }
        }

        merged_titles.push(current);
    }

    info!(
        "Fuzzy matching merged {} rows, {} remain",
        merges,
        merged_titles.len()
    );
    merged_titles
}
