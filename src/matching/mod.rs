//! Title matching across the three cinema sites.
//!
//! Raw listings are normalized, joined on identical keys, then rows with
//! similar keys are merged as long as they never both carry an id from the
//! same site. The result is one [`CanonicalTitle`] per inferred film.

pub mod canonical;
pub mod exact;
pub mod fuzzy;
pub mod normalize;
pub mod resolve;

pub use canonical::CanonicalTitle;
pub use exact::handle_perfect_match_titles;
pub use fuzzy::{handle_fuzzy_match_titles, merge_similar_titles, similarity_ratio};
pub use normalize::normalize_title;
pub use resolve::{merge_fuzzy_match_titles, should_merge_fuzzy_match_titles};

use crate::constants::DEFAULT_FUZZY_THRESHOLD;
use crate::error::Result;
use crate::types::RawTitle;
use tracing::instrument;

/// Runs exact then fuzzy matching with a configurable similarity threshold
#[derive(Debug, Clone, Copy)]
pub struct TitleMatcher {
    threshold: u32,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl TitleMatcher {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Produce the canonical title list for one refresh.
    ///
    /// Any of the lists may be empty; fails with `NoTitlesToMatch` only when
    /// all of them are.
    #[instrument(skip_all, fields(threshold = self.threshold))]
    pub fn match_titles(
        &self,
        grand_titles: &[RawTitle],
        prime_titles: &[RawTitle],
        taj_titles: &[RawTitle],
    ) -> Result<Vec<CanonicalTitle>> {
        let exact = handle_perfect_match_titles(grand_titles, prime_titles, taj_titles)?;
        Ok(merge_similar_titles(exact, self.threshold))
    }
}

/// Match titles with the default threshold
pub fn match_titles(
    grand_titles: &[RawTitle],
    prime_titles: &[RawTitle],
    taj_titles: &[RawTitle],
) -> Result<Vec<CanonicalTitle>> {
    TitleMatcher::default().match_titles(grand_titles, prime_titles, taj_titles)
}
