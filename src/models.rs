use crate::error::{Result, ShowingsError};
use crate::matching::CanonicalTitle;
use crate::types::Source;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn validate_http_url(field: &str, url: Option<&str>) -> Result<()> {
    match url {
        Some(u) if !(u.starts_with("http://") || u.starts_with("https://")) => Err(
            ShowingsError::validation(field, "URL must start with http:// or https://"),
        ),
        _ => Ok(()),
    }
}

/// The durable form of a canonical title, keyed by `normalized_title`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: Option<Uuid>,
    pub title: String,
    pub normalized_title: String,
    pub grand_id: Option<String>,
    pub prime_id: Option<String>,
    pub taj_id: Option<String>,
    pub grand_title: Option<String>,
    pub prime_title: Option<String>,
    pub taj_title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub fn from_canonical(canonical: &CanonicalTitle) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: canonical.title.clone(),
            normalized_title: canonical.normalized_title.clone(),
            grand_id: non_empty(&canonical.grand_id),
            prime_id: non_empty(&canonical.prime_id),
            taj_id: non_empty(&canonical.taj_id),
            grand_title: non_empty(&canonical.title_grand),
            prime_title: non_empty(&canonical.title_prime),
            taj_title: non_empty(&canonical.title_taj),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_for(&self, source: Source) -> Option<&str> {
        match source {
            Source::Grand => self.grand_id.as_deref(),
            Source::Prime => self.prime_id.as_deref(),
            Source::Taj => self.taj_id.as_deref(),
        }
    }

    pub fn title_for(&self, source: Source) -> Option<&str> {
        match source {
            Source::Grand => self.grand_title.as_deref(),
            Source::Prime => self.prime_title.as_deref(),
            Source::Taj => self.taj_title.as_deref(),
        }
    }

    /// Human-readable name: the chosen title, else the first source title, else the key
    pub fn display_title(&self) -> &str {
        if !self.title.trim().is_empty() {
            return self.title.trim();
        }
        Source::ALL
            .into_iter()
            .filter_map(|s| self.title_for(s))
            .map(str::trim)
            .find(|t| !t.is_empty())
            .unwrap_or(self.normalized_title.as_str())
    }

    /// Fill this movie's empty id and title slots from `other`.
    ///
    /// Slots already set are kept; returns the ids from `other` that could not
    /// be placed because the slot held a different id.
    pub fn absorb(&mut self, other: &Movie) -> Vec<(Source, String)> {
        let mut dropped = Vec::new();
        for source in Source::ALL {
            let Some(other_id) = other.id_for(source) else {
                continue;
            };
            match self.id_for(source) {
                None => {
                    let title = other.title_for(source).map(str::to_string);
                    let (id_slot, title_slot) = match source {
                        Source::Grand => (&mut self.grand_id, &mut self.grand_title),
                        Source::Prime => (&mut self.prime_id, &mut self.prime_title),
                        Source::Taj => (&mut self.taj_id, &mut self.taj_title),
                    };
                    *id_slot = Some(other_id.to_string());
                    *title_slot = title;
                }
                Some(id) if id != other_id => dropped.push((source, other_id.to_string())),
                Some(_) => {}
            }
        }
        if self.title.trim().is_empty() {
            self.title = other.title.clone();
        }
        dropped
    }

    /// A movie must be listed by at least one cinema
    pub fn validate(&self) -> Result<()> {
        if Source::ALL.into_iter().all(|s| self.id_for(s).is_none()) {
            return Err(ShowingsError::validation(
                "movie",
                "Movie must have at least one source ID",
            ));
        }
        Ok(())
    }
}

/// A cinema location showings are tied to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: Option<Uuid>,
    pub city: String,
    pub name: String,
    pub address: String,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(name: impl Into<String>, city: impl Into<String>, address: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            city: city.into(),
            name: name.into(),
            address: address.into(),
            website: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The single location a source's showings are held at
    pub fn for_source(source: Source) -> Self {
        Self::new(
            source.location_name(),
            crate::constants::LOCATIONS_CITY,
            source.location_address(),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.city.trim().is_empty() || self.address.trim().is_empty() {
            return Err(ShowingsError::validation(
                "location",
                "Location name, city, and address are required",
            ));
        }
        validate_http_url("website", self.website.as_deref())
    }
}

/// One screening of a movie at a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Showing {
    pub id: Option<Uuid>,
    pub movie_id: Uuid,
    pub location_id: Uuid,
    pub url: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_showing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Showing {
    pub fn new(movie_id: Uuid, location_id: Uuid, date: NaiveDate, time: NaiveTime) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            movie_id,
            location_id,
            url: None,
            date,
            time,
            is_showing: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    /// Showings are unique per movie, location, date and time
    pub fn natural_key(&self) -> (Uuid, Uuid, NaiveDate, NaiveTime) {
        (self.movie_id, self.location_id, self.date, self.time)
    }

    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if self.date < today {
            return Err(ShowingsError::validation(
                "date",
                "Showing date cannot be in the past",
            ));
        }
        validate_http_url("url", self.url.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One refresh run and the movies and showings it produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    pub id: Option<Uuid>,
    pub batch_id: String,
    pub movie_ids: Vec<Uuid>,
    pub showing_ids: Vec<Uuid>,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    pub fn new() -> Self {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: None,
            batch_id: format!("refresh-{}-{}", now.format("%Y%m%d%H%M%S"), &suffix[..8]),
            movie_ids: Vec::new(),
            showing_ids: Vec::new(),
            status: BatchStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: BatchStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}
