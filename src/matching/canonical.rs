use crate::types::Source;
use serde::{Deserialize, Serialize};

/// The unified record for one inferred film across the three sources.
///
/// Every field is always present; an empty string means the value is absent.
/// A source's title and id are set together, so `title_grand` is non-empty
/// exactly when `grand_id` is (and likewise for prime and taj), except for
/// degenerate listings with a blank title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTitle {
    /// Display title chosen when rows are merged; empty until then
    pub title: String,
    /// Join key that produced this row
    pub normalized_title: String,
    pub title_grand: String,
    pub grand_id: String,
    pub title_prime: String,
    pub prime_id: String,
    pub title_taj: String,
    pub taj_id: String,
}

impl CanonicalTitle {
    /// An empty row for the given join key
    pub fn keyed(normalized_title: impl Into<String>) -> Self {
        Self {
            normalized_title: normalized_title.into(),
            ..Default::default()
        }
    }

    pub fn id_for(&self, source: Source) -> &str {
        match source {
            Source::Grand => &self.grand_id,
            Source::Prime => &self.prime_id,
            Source::Taj => &self.taj_id,
        }
    }

    pub fn title_for(&self, source: Source) -> &str {
        match source {
            Source::Grand => &self.title_grand,
            Source::Prime => &self.title_prime,
            Source::Taj => &self.title_taj,
        }
    }

    /// Attach one source's raw title and id as a pair
    pub fn set_source(&mut self, source: Source, title: impl Into<String>, id: impl Into<String>) {
        let (title_slot, id_slot) = match source {
            Source::Grand => (&mut self.title_grand, &mut self.grand_id),
            Source::Prime => (&mut self.title_prime, &mut self.prime_id),
            Source::Taj => (&mut self.title_taj, &mut self.taj_id),
        };
        *title_slot = title.into();
        *id_slot = id.into();
    }

    pub fn has_source(&self, source: Source) -> bool {
        !self.id_for(source).is_empty()
    }

    /// Sources that contributed a non-empty id to this row
    pub fn sources(&self) -> impl Iterator<Item = Source> + '_ {
        Source::ALL.into_iter().filter(move |s| self.has_source(*s))
    }

    pub fn populated_id_count(&self) -> usize {
        self.sources().count()
    }

    /// True when both rows claim an id from the same source
    pub fn conflicts_with(&self, other: &CanonicalTitle) -> bool {
        self.sources().any(|s| other.has_source(s))
    }
}
