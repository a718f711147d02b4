//! Validation of scraped showings and tying them to stored movies.

use crate::error::{Result, ShowingsError};
use crate::matching::normalize_title;
use crate::models::{Movie, Showing};
use crate::types::{RawShowing, Source, TitleRef};
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));
static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("time pattern is valid"));

/// Parse a `YYYY-MM-DD` date
pub fn parse_showing_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if !DATE_PATTERN.is_match(value) {
        return Err(ShowingsError::validation(
            "date",
            format!("'{value}' is not in YYYY-MM-DD format"),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ShowingsError::validation("date", format!("'{value}' is not a date: {e}")))
}

/// Parse an `HH:MM` time
pub fn parse_showing_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    if !TIME_PATTERN.is_match(value) {
        return Err(ShowingsError::validation(
            "time",
            format!("'{value}' is not in HH:MM format"),
        ));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| ShowingsError::validation("time", format!("'{value}' is not a time: {e}")))
}

/// Blank urls are treated as absent
pub fn parse_showing_url(value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(Some(url.to_string()))
        }
        Some(url) => Err(ShowingsError::validation(
            "url",
            format!("'{url}' must start with http:// or https://"),
        )),
    }
}

/// Looks movies up the way each site refers to them
#[derive(Debug, Default)]
pub struct MovieIndex {
    by_source_id: HashMap<(Source, String), Uuid>,
    by_source_title: HashMap<(Source, String), Uuid>,
    by_normalized_title: HashMap<String, Uuid>,
}

impl MovieIndex {
    pub fn new(movies: &[Movie]) -> Self {
        let mut index = Self::default();
        for movie in movies {
            let Some(id) = movie.id else {
                continue;
            };
            for source in Source::ALL {
                if let Some(source_id) = movie.id_for(source) {
                    index.by_source_id.insert((source, source_id.to_string()), id);
                }
                if let Some(title) = movie.title_for(source) {
                    index
                        .by_source_title
                        .insert((source, normalize_title(title)), id);
                }
            }
            index
                .by_normalized_title
                .insert(movie.normalized_title.clone(), id);
        }
        index
    }

    /// Ids resolve against the source's own id; titles against the title the
    /// source listed, then against the canonical key.
    pub fn resolve(&self, source: Source, reference: &TitleRef) -> Option<Uuid> {
        match reference {
            TitleRef::TitleId(id) => self.by_source_id.get(&(source, id.trim().to_string())).copied(),
            TitleRef::Title(title) => {
                let key = normalize_title(title);
                self.by_source_title
                    .get(&(source, key.clone()))
                    .or_else(|| self.by_normalized_title.get(&key))
                    .copied()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_normalized_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_normalized_title.is_empty()
    }
}

/// A scraped showing that could not be stored, and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedShowing {
    pub source: Source,
    pub reference: TitleRef,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct AggregatedShowings {
    pub showings: Vec<Showing>,
    pub skipped: Vec<SkippedShowing>,
}

/// Turn one source's raw showings into showings tied to movies and locations.
///
/// `locations` maps lower-cased location names to ids; a showing with a blank
/// location is held at the source's own cinema.
pub fn aggregate_showings(
    source: Source,
    raw_showings: &[RawShowing],
    movies: &MovieIndex,
    locations: &HashMap<String, Uuid>,
    today: NaiveDate,
) -> AggregatedShowings {
    let mut result = AggregatedShowings::default();

    for raw in raw_showings {
        match build_showing(source, raw, movies, locations, today) {
            Ok(showing) => result.showings.push(showing),
            Err(e) => {
                debug!("Skipping {} showing {:?}: {}", source, raw.reference, e);
                result.skipped.push(SkippedShowing {
                    source,
                    reference: raw.reference.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if !result.skipped.is_empty() {
        warn!(
            "{}: skipped {} of {} showings",
            source,
            result.skipped.len(),
            raw_showings.len()
        );
    }
    result
}

fn build_showing(
    source: Source,
    raw: &RawShowing,
    movies: &MovieIndex,
    locations: &HashMap<String, Uuid>,
    today: NaiveDate,
) -> Result<Showing> {
    let date = parse_showing_date(&raw.date)?;
    let time = parse_showing_time(&raw.time)?;
    let url = parse_showing_url(raw.url.as_deref())?;

    let movie_id = movies.resolve(source, &raw.reference).ok_or_else(|| {
        ShowingsError::validation("movie", format!("no movie matches {:?}", raw.reference))
    })?;

    let location_name = match raw.location.trim() {
        "" => source.location_name().to_lowercase(),
        name => name.to_lowercase(),
    };
    let location_id = *locations.get(&location_name).ok_or_else(|| {
        ShowingsError::validation("location", format!("unknown location '{}'", raw.location))
    })?;

    let showing = Showing::new(movie_id, location_id, date, time).with_url(url);
    showing.validate(today)?;
    Ok(showing)
}
