use crate::constants::{
    GRAND_LOCATION_ADDRESS, GRAND_LOCATION_NAME, GRAND_SOURCE, PRIME_LOCATION_ADDRESS,
    PRIME_LOCATION_NAME, PRIME_SOURCE, TAJ_LOCATION_ADDRESS, TAJ_LOCATION_NAME, TAJ_SOURCE,
};
use crate::error::{Result, ShowingsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three cinema sites titles and showings are scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Grand,
    Prime,
    Taj,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Grand, Source::Prime, Source::Taj];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Grand => GRAND_SOURCE,
            Source::Prime => PRIME_SOURCE,
            Source::Taj => TAJ_SOURCE,
        }
    }

    /// Name of the id field this source populates on a canonical title
    pub fn id_field(&self) -> &'static str {
        match self {
            Source::Grand => "grand_id",
            Source::Prime => "prime_id",
            Source::Taj => "taj_id",
        }
    }

    pub fn location_name(&self) -> &'static str {
        match self {
            Source::Grand => GRAND_LOCATION_NAME,
            Source::Prime => PRIME_LOCATION_NAME,
            Source::Taj => TAJ_LOCATION_NAME,
        }
    }

    pub fn location_address(&self) -> &'static str {
        match self {
            Source::Grand => GRAND_LOCATION_ADDRESS,
            Source::Prime => PRIME_LOCATION_ADDRESS,
            Source::Taj => TAJ_LOCATION_ADDRESS,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ShowingsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            GRAND_SOURCE => Ok(Source::Grand),
            PRIME_SOURCE => Ok(Source::Prime),
            TAJ_SOURCE => Ok(Source::Taj),
            other => Err(ShowingsError::Config(format!("Unknown source: {other}"))),
        }
    }
}

/// One cinema's listing of one movie.
///
/// The source is implied by which list the title arrives in; on the wire the id
/// is carried under the source's own field name (`grand_id`, `prime_id`, `taj_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTitle {
    pub title: String,
    #[serde(alias = "grand_id", alias = "prime_id", alias = "taj_id", alias = "id")]
    pub source_id: String,
}

impl RawTitle {
    pub fn new(title: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_id: source_id.into(),
        }
    }
}

/// How a scraped showing points back at its movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleRef {
    /// The display title as printed on the site (Grand, Taj)
    Title(String),
    /// The site's own id for the movie (Prime)
    TitleId(String),
}

/// A showing as scraped from one source, before it is tied to a movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawShowing {
    #[serde(flatten)]
    pub reference: TitleRef,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Core trait every cinema site adapter must implement
#[async_trait::async_trait]
pub trait CinemaApi: Send + Sync {
    /// Which site this adapter reads
    fn source(&self) -> Source;

    /// Fetch the movies currently listed on the site
    async fn get_titles(&self) -> Result<Vec<RawTitle>>;

    /// Fetch showings for the given titles
    async fn get_showings(&self, titles: &[RawTitle]) -> Result<Vec<RawShowing>>;
}
