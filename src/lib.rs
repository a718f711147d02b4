pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod refresh;
pub mod showings;
pub mod storage;
pub mod types;

pub use error::{Result, ShowingsError};
pub use matching::{match_titles, CanonicalTitle, TitleMatcher};
pub use types::{CinemaApi, RawShowing, RawTitle, Source, TitleRef};
