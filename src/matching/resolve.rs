use super::canonical::CanonicalTitle;
use crate::types::Source;

/// Return the first non-empty value, or an empty string
pub fn first_non_empty<'a>(values: &[&'a str]) -> &'a str {
    values.iter().copied().find(|v| !v.is_empty()).unwrap_or("")
}

/// Two rows may merge only if no source has an id on both sides.
///
/// This is what keeps two separate Grand listings (say "Inception" and
/// "Inception IMAX") from collapsing into one movie however similar they look.
pub fn should_merge_fuzzy_match_titles(title_a: &CanonicalTitle, title_b: &CanonicalTitle) -> bool {
    !title_a.conflicts_with(title_b)
}

/// Combine two rows into one.
///
/// The side backed by more source ids supplies the display title and key; on a
/// tie the side carrying a Prime listing wins, falling back to `title_a`.
/// Per-source fields take `title_a`'s value when present, otherwise `title_b`'s.
pub fn merge_fuzzy_match_titles(title_a: &CanonicalTitle, title_b: &CanonicalTitle) -> CanonicalTitle {
    let winner = pick_display_side(title_a, title_b);

    let mut merged = CanonicalTitle {
        title: winner.title.clone(),
        normalized_title: winner.normalized_title.clone(),
        ..Default::default()
    };

    for source in Source::ALL {
        let title = first_non_empty(&[title_a.title_for(source), title_b.title_for(source)]);
        let id = first_non_empty(&[title_a.id_for(source), title_b.id_for(source)]);
        merged.set_source(source, title, id);
    }

    merged
}

fn pick_display_side<'a>(title_a: &'a CanonicalTitle, title_b: &'a CanonicalTitle) -> &'a CanonicalTitle {
    let count_a = title_a.populated_id_count();
    let count_b = title_b.populated_id_count();

    if count_a > count_b {
        return title_a;
    }
    if count_b > count_a {
        return title_b;
    }

    let prime_a = !title_a.title_prime.is_empty();
    let prime_b = !title_b.title_prime.is_empty();
    if prime_b && !prime_a {
        title_b
    } else {
        title_a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_grand() -> CanonicalTitle {
        CanonicalTitle {
            title: "  The Matrix   ".to_string(),
            normalized_title: "the matrix".to_string(),
            title_grand: "  The Matrix   ".to_string(),
            grand_id: "1abc".to_string(),
            ..Default::default()
        }
    }

    fn title_prime() -> CanonicalTitle {
        CanonicalTitle {
            title: "The Matrix 3".to_string(),
            normalized_title: "the matrix 3".to_string(),
            title_prime: "The Matrix 3".to_string(),
            prime_id: "1yts".to_string(),
            ..Default::default()
        }
    }

    fn title_taj() -> CanonicalTitle {
        CanonicalTitle {
            title: "THE MATRIX".to_string(),
            normalized_title: "the matrix".to_string(),
            title_taj: "THE MATRIX".to_string(),
            taj_id: "2".to_string(),
            ..Default::default()
        }
    }

    fn merged_grand_prime() -> CanonicalTitle {
        CanonicalTitle {
            title: "The Matrix 3".to_string(),
            normalized_title: "the matrix 3".to_string(),
            title_grand: "  The Matrix   ".to_string(),
            grand_id: "1abc".to_string(),
            title_prime: "The Matrix 3".to_string(),
            prime_id: "1yts".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_non_empty() {
        assert_eq!(first_non_empty(&["1yts", ""]), "1yts");
        assert_eq!(first_non_empty(&["", "1yts"]), "1yts");
        assert_eq!(first_non_empty(&["a", "b"]), "a");
        assert_eq!(first_non_empty(&["", ""]), "");
        assert_eq!(first_non_empty(&[]), "");
    }

    #[test]
    fn test_should_merge_refuses_shared_source() {
        let a = CanonicalTitle {
            prime_id: "1yts".to_string(),
            grand_id: "zc".to_string(),
            ..Default::default()
        };
        let b = CanonicalTitle {
            grand_id: "1abc".to_string(),
            taj_id: "1vfda".to_string(),
            ..Default::default()
        };
        assert!(!should_merge_fuzzy_match_titles(&a, &b));
    }

    #[test]
    fn test_should_merge_disjoint_sources() {
        let a = CanonicalTitle {
            prime_id: "1yts".to_string(),
            taj_id: "zzz".to_string(),
            ..Default::default()
        };
        let b = CanonicalTitle {
            grand_id: "1abc".to_string(),
            ..Default::default()
        };
        assert!(should_merge_fuzzy_match_titles(&a, &b));
    }

    #[test]
    fn test_merge_tie_prefers_prime_on_left() {
        assert_eq!(merge_fuzzy_match_titles(&title_prime(), &title_grand()), merged_grand_prime());
    }

    #[test]
    fn test_merge_tie_prefers_prime_on_right() {
        assert_eq!(merge_fuzzy_match_titles(&title_grand(), &title_prime()), merged_grand_prime());
    }

    #[test]
    fn test_merge_tie_without_prime_keeps_left() {
        let merged = merge_fuzzy_match_titles(&title_taj(), &title_grand());
        assert_eq!(merged.title, "THE MATRIX");
        assert_eq!(merged.normalized_title, "the matrix");
        assert_eq!(merged.grand_id, "1abc");
        assert_eq!(merged.taj_id, "2");

        let merged = merge_fuzzy_match_titles(&title_grand(), &title_taj());
        assert_eq!(merged.title, "  The Matrix   ");
    }

    #[test]
    fn test_merge_prefers_side_with_more_ids() {
        let expected = CanonicalTitle {
            title_taj: "THE MATRIX".to_string(),
            taj_id: "2".to_string(),
            ..merged_grand_prime()
        };

        assert_eq!(merge_fuzzy_match_titles(&merged_grand_prime(), &title_taj()), expected);
        assert_eq!(merge_fuzzy_match_titles(&title_taj(), &merged_grand_prime()), expected);
    }

    #[test]
    fn test_merge_never_drops_an_id() {
        let a = title_grand();
        let b = title_taj();
        let merged = merge_fuzzy_match_titles(&a, &b);
        for source in Source::ALL {
            if a.has_source(source) || b.has_source(source) {
                assert!(merged.has_source(source), "{source} id dropped");
            }
        }
    }
}
