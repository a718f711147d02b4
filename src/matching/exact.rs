use super::canonical::CanonicalTitle;
use super::normalize::normalize_title;
use crate::error::{Result, ShowingsError};
use crate::types::{RawTitle, Source};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// A joined row plus which sources have already been written into it
struct JoinedRow {
    row: CanonicalTitle,
    filled: [bool; 3],
}

impl JoinedRow {
    fn new(normalized_title: &str) -> Self {
        Self {
            row: CanonicalTitle::keyed(normalized_title),
            filled: [false; 3],
        }
    }

    fn slot(source: Source) -> usize {
        match source {
            Source::Grand => 0,
            Source::Prime => 1,
            Source::Taj => 2,
        }
    }

    fn is_filled(&self, source: Source) -> bool {
        self.filled[Self::slot(source)]
    }

    fn fill(&mut self, source: Source, raw: &RawTitle) {
        self.row.set_source(source, raw.title.clone(), raw.source_id.clone());
        self.filled[Self::slot(source)] = true;
    }
}

/// Join the per-source title lists on their normalized titles.
///
/// Behaves as a full outer join: every listing ends up in exactly one row,
/// listings from different sources with the same key share a row, and keys
/// seen by only one source get a row of their own with the other sources
/// left empty. The display `title` is left empty; only the fuzzy pass picks one.
///
/// Empty lists are treated as absent. Rows come back sorted by normalized title.
#[instrument(skip_all, fields(grand = grand_titles.len(), prime = prime_titles.len(), taj = taj_titles.len()))]
pub fn handle_perfect_match_titles(
    grand_titles: &[RawTitle],
    prime_titles: &[RawTitle],
    taj_titles: &[RawTitle],
) -> Result<Vec<CanonicalTitle>> {
    let tables: Vec<(Source, &[RawTitle])> = [
        (Source::Grand, grand_titles),
        (Source::Prime, prime_titles),
        (Source::Taj, taj_titles),
    ]
    .into_iter()
    .filter(|(_, titles)| !titles.is_empty())
    .collect();

    if tables.is_empty() {
        return Err(ShowingsError::NoTitlesToMatch);
    }

    let mut joined: BTreeMap<String, Vec<JoinedRow>> = BTreeMap::new();

    for (source, titles) in tables {
        for raw in titles {
            let key = normalize_title(&raw.title);
            let bucket = joined.entry(key.clone()).or_default();

            // A second listing from the same source under the same key gets its
            // own row rather than overwriting the first.
            match bucket.iter_mut().find(|joined_row| !joined_row.is_filled(source)) {
                Some(joined_row) => {
                    debug!(
                        source = %source,
                        key = %joined_row.row.normalized_title,
                        "Exact match joined"
                    );
                    joined_row.fill(source, raw);
                }
                None => {
                    let mut joined_row = JoinedRow::new(&key);
                    joined_row.fill(source, raw);
                    bucket.push(joined_row);
                }
            }
        }
    }

    let rows: Vec<CanonicalTitle> = joined
        .into_values()
        .flatten()
        .map(|joined_row| joined_row.row)
        .collect();

    info!("Exact matching produced {} rows", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        normalized: &str,
        grand: (&str, &str),
        prime: (&str, &str),
        taj: (&str, &str),
    ) -> CanonicalTitle {
        CanonicalTitle {
            title: String::new(),
            normalized_title: normalized.to_string(),
            title_grand: grand.0.to_string(),
            grand_id: grand.1.to_string(),
            title_prime: prime.0.to_string(),
            prime_id: prime.1.to_string(),
            title_taj: taj.0.to_string(),
            taj_id: taj.1.to_string(),
        }
    }

    #[test]
    fn test_no_titles_found() {
        let result = handle_perfect_match_titles(&[], &[], &[]);
        assert!(matches!(result, Err(ShowingsError::NoTitlesToMatch)));
    }

    #[test]
    fn test_single_source_keeps_title_empty() {
        let grand = vec![RawTitle::new("   The Matrix ", "1abc")];

        let merged = handle_perfect_match_titles(&grand, &[], &[]).unwrap();

        assert_eq!(
            merged,
            vec![row("the matrix", ("   The Matrix ", "1abc"), ("", ""), ("", ""))]
        );
    }

    #[test]
    fn test_merges_matching_titles() {
        let grand = vec![RawTitle::new("   The Matrix ", "1abc")];
        let prime = vec![RawTitle::new("THE MATRIX", "1yts")];

        let merged = handle_perfect_match_titles(&grand, &prime, &[]).unwrap();

        assert_eq!(
            merged,
            vec![row(
                "the matrix",
                ("   The Matrix ", "1abc"),
                ("THE MATRIX", "1yts"),
                ("", "")
            )]
        );
    }

    #[test]
    fn test_unmatched_titles_get_their_own_rows() {
        let grand = vec![RawTitle::new("   The Matrix ", "1abc")];
        let prime = vec![RawTitle::new("ALIEN 5", "ahd2")];

        let merged = handle_perfect_match_titles(&grand, &prime, &[]).unwrap();

        assert_eq!(
            merged,
            vec![
                row("alien 5", ("", ""), ("ALIEN 5", "ahd2"), ("", "")),
                row("the matrix", ("   The Matrix ", "1abc"), ("", ""), ("", "")),
            ]
        );
    }

    #[test]
    fn test_merges_three_sources() {
        let grand = vec![RawTitle::new("   The Matrix ", "1abc")];
        let prime = vec![RawTitle::new("THE MATRIX", "1yts")];
        let taj = vec![
            RawTitle::new("the matrix", "2"),
            RawTitle::new("The Matrix Reloaded", "yajg2"),
        ];

        let merged = handle_perfect_match_titles(&grand, &prime, &taj).unwrap();

        assert_eq!(
            merged,
            vec![
                row(
                    "the matrix",
                    ("   The Matrix ", "1abc"),
                    ("THE MATRIX", "1yts"),
                    ("the matrix", "2")
                ),
                row(
                    "the matrix reloaded",
                    ("", ""),
                    ("", ""),
                    ("The Matrix Reloaded", "yajg2")
                ),
            ]
        );
    }

    #[test]
    fn test_same_source_duplicate_key_is_not_dropped() {
        let grand = vec![
            RawTitle::new("Inception", "2"),
            RawTitle::new("INCEPTION ", "7"),
        ];
        let prime = vec![RawTitle::new("inception", "p1")];

        let merged = handle_perfect_match_titles(&grand, &prime, &[]).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].grand_id, "2");
        assert_eq!(merged[0].prime_id, "p1");
        assert_eq!(merged[1].grand_id, "7");
        assert_eq!(merged[1].prime_id, "");
    }

    #[test]
    fn test_every_listing_lands_in_exactly_one_row() {
        let grand = vec![
            RawTitle::new("   The Matrix ", "1abc"),
            RawTitle::new("Inception   ", "2"),
            RawTitle::new(" El Dashash", "3"),
        ];
        let prime = vec![
            RawTitle::new("THE MATRIX", "1yts"),
            RawTitle::new("ALIEN 5", "ahd2"),
        ];
        let taj = vec![
            RawTitle::new("elDashash ", "1vfda"),
            RawTitle::new("Alien 5  ", "ad3sa"),
        ];

        let merged = handle_perfect_match_titles(&grand, &prime, &taj).unwrap();

        for (source, titles) in [
            (Source::Grand, &grand),
            (Source::Prime, &prime),
            (Source::Taj, &taj),
        ] {
            for raw in titles.iter() {
                let hits = merged
                    .iter()
                    .filter(|r| r.id_for(source) == raw.source_id)
                    .count();
                assert_eq!(hits, 1, "{} listing {} appears {} times", source, raw.source_id, hits);
            }
        }
        assert_eq!(merged.len(), 5);
    }
}
