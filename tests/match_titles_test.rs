use anyhow::Result;
use showings_aggregator::matching::{merge_similar_titles, normalize_title};
use showings_aggregator::{match_titles, CanonicalTitle, RawTitle, ShowingsError, Source, TitleMatcher};
use std::collections::HashMap;

fn titles(pairs: &[(&str, &str)]) -> Vec<RawTitle> {
    pairs.iter().map(|(title, id)| RawTitle::new(*title, *id)).collect()
}

/// A week's listings across the three sites
fn weekly_listing() -> (Vec<RawTitle>, Vec<RawTitle>, Vec<RawTitle>) {
    let grand = titles(&[
        ("The Matrix", "1abc"),
        ("Inception", "2"),
        ("Inception IMAX", "4"),
        (" El Dashash", "3"),
        ("Dune: Part Two", "g5"),
    ]);
    let prime = titles(&[
        ("THE MATRIX", "1yts"),
        ("AL DESHASH", "bj3h"),
        ("ALIEN 5", "ahd2"),
        ("300", "lo5f"),
    ]);
    let taj = titles(&[
        ("The Matrix 3", "yajg2"),
        ("elDashash ", "1vfda"),
        ("Alien 5 ", "ad3sa"),
        ("Dune Part Two", "t9"),
    ]);
    (grand, prime, taj)
}

fn row_with_id<'a>(rows: &'a [CanonicalTitle], source: Source, id: &str) -> &'a CanonicalTitle {
    rows.iter()
        .find(|r| r.id_for(source) == id)
        .unwrap_or_else(|| panic!("no row carries {source} id {id}"))
}

#[test]
fn test_exact_match_across_two_sources() -> Result<()> {
    let rows = match_titles(
        &titles(&[("The Matrix", "1abc")]),
        &titles(&[("THE MATRIX", "1yts")]),
        &[],
    )?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].normalized_title, "the matrix");
    assert_eq!(rows[0].grand_id, "1abc");
    assert_eq!(rows[0].prime_id, "1yts");
    assert_eq!(rows[0].taj_id, "");
    Ok(())
}

#[test]
fn test_exact_match_across_all_sources() -> Result<()> {
    let rows = match_titles(
        &titles(&[("The Matrix", "1abc")]),
        &titles(&[("THE MATRIX", "1yts")]),
        &titles(&[("  the matrix", "9t")]),
    )?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].grand_id, "1abc");
    assert_eq!(rows[0].prime_id, "1yts");
    assert_eq!(rows[0].taj_id, "9t");
    assert_eq!(rows[0].title_taj, "  the matrix");
    Ok(())
}

#[test]
fn test_fuzzy_match_joins_sequel_listing() -> Result<()> {
    let rows = match_titles(
        &titles(&[("The Matrix", "1abc")]),
        &[],
        &titles(&[("The Matrix 3", "yajg2")]),
    )?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].grand_id, "1abc");
    assert_eq!(rows[0].taj_id, "yajg2");
    assert_eq!(rows[0].prime_id, "");
    Ok(())
}

#[test]
fn test_same_source_rows_never_merge() -> Result<()> {
    let grand = titles(&[("Inception", "2"), ("Inception IMAX", "4")]);

    // Even with a threshold low enough to make them candidates
    let rows = TitleMatcher::new(50).match_titles(&grand, &[], &[])?;

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.populated_id_count() == 1));
    Ok(())
}

#[test]
fn test_no_titles_is_an_error() {
    let result = match_titles(&[], &[], &[]);
    assert!(matches!(result, Err(ShowingsError::NoTitlesToMatch)));
}

#[test]
fn test_single_source_passes_through() -> Result<()> {
    let grand = titles(&[("Alien", "1"), ("Dune", "2"), ("The Matrix", "3")]);

    let rows = match_titles(&grand, &[], &[])?;

    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.prime_id, "");
        assert_eq!(row.taj_id, "");
        assert_eq!(row.title, "");
    }
    let keys: Vec<&str> = rows.iter().map(|r| r.normalized_title.as_str()).collect();
    assert_eq!(keys, vec!["alien", "dune", "the matrix"]);
    Ok(())
}

#[test]
fn test_normalization_is_idempotent() {
    for title in ["  The Matrix ", "elDashash ", "ALIEN 5", "", "   "] {
        let once = normalize_title(title);
        assert_eq!(normalize_title(&once), once);
    }
}

#[test]
fn test_weekly_listing_groups_films() -> Result<()> {
    let (grand, prime, taj) = weekly_listing();

    let rows = match_titles(&grand, &prime, &taj)?;

    assert_eq!(rows.len(), 7);

    let dashash = row_with_id(&rows, Source::Grand, "3");
    assert_eq!(dashash.prime_id, "bj3h");
    assert_eq!(dashash.taj_id, "1vfda");
    assert_eq!(dashash.normalized_title, "el dashash");

    let matrix = row_with_id(&rows, Source::Prime, "1yts");
    assert_eq!(matrix.grand_id, "1abc");
    assert_eq!(matrix.taj_id, "yajg2");

    let dune = row_with_id(&rows, Source::Taj, "t9");
    assert_eq!(dune.grand_id, "g5");

    let alien = row_with_id(&rows, Source::Prime, "ahd2");
    assert_eq!(alien.taj_id, "ad3sa");

    assert_ne!(
        row_with_id(&rows, Source::Grand, "2").normalized_title,
        row_with_id(&rows, Source::Grand, "4").normalized_title
    );
    Ok(())
}

#[test]
fn test_every_listing_lands_in_exactly_one_row() -> Result<()> {
    let (grand, prime, taj) = weekly_listing();

    let rows = match_titles(&grand, &prime, &taj)?;

    let mut seen: HashMap<(Source, String), usize> = HashMap::new();
    for row in &rows {
        for source in row.sources() {
            *seen.entry((source, row.id_for(source).to_string())).or_default() += 1;
        }
    }

    for (source, list) in [(Source::Grand, &grand), (Source::Prime, &prime), (Source::Taj, &taj)] {
        for raw in list {
            assert_eq!(
                seen.get(&(source, raw.source_id.clone())),
                Some(&1),
                "{source} id {} should appear once",
                raw.source_id
            );
        }
    }
    assert_eq!(seen.len(), grand.len() + prime.len() + taj.len());
    Ok(())
}

#[test]
fn test_fuzzy_pass_is_stable_on_its_output() -> Result<()> {
    let (grand, prime, taj) = weekly_listing();

    let rows = match_titles(&grand, &prime, &taj)?;
    let again = merge_similar_titles(rows.clone(), 70);

    assert_eq!(again, rows);
    Ok(())
}
