pub mod fixture;

pub use fixture::FixtureApi;

use crate::types::{CinemaApi, Source};
use std::path::Path;

/// Build the adapter for a source, reading its snapshot from `fixtures_dir`
pub fn create_api(source: Source, fixtures_dir: impl AsRef<Path>) -> Box<dyn CinemaApi> {
    Box::new(FixtureApi::from_dir(source, fixtures_dir))
}
