use crate::error::{Result, ShowingsError};
use crate::types::{CinemaApi, RawShowing, RawTitle, Source, TitleRef};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// One site's listing as captured to disk
#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    titles: Vec<RawTitle>,
    #[serde(default)]
    showings: Vec<RawShowing>,
}

/// Serves a cinema site's titles and showings from a JSON snapshot.
///
/// The snapshot looks like
/// `{"titles": [{"title": "...", "grand_id": "..."}], "showings": [...]}`.
pub struct FixtureApi {
    source: Source,
    path: PathBuf,
}

impl FixtureApi {
    pub fn new(source: Source, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }

    /// Snapshot at `<dir>/<source>.json`
    pub fn from_dir(source: Source, dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(format!("{}.json", source.as_str()));
        Self::new(source, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ShowingsError::source(
                self.source.as_str(),
                format!("failed to read snapshot '{}': {}", self.path.display(), e),
            )
        })?;

        serde_json::from_str(&content).map_err(|e| {
            ShowingsError::source(
                self.source.as_str(),
                format!("malformed snapshot '{}': {}", self.path.display(), e),
            )
        })
    }
}

#[async_trait]
impl CinemaApi for FixtureApi {
    fn source(&self) -> Source {
        self.source
    }

    #[instrument(skip(self), fields(source = %self.source))]
    async fn get_titles(&self) -> Result<Vec<RawTitle>> {
        let snapshot = self.load().await?;

        for title in &snapshot.titles {
            if title.source_id.trim().is_empty() {
                return Err(ShowingsError::validation(
                    self.source.id_field(),
                    format!("blank id for title '{}'", title.title),
                ));
            }
        }

        info!("Loaded {} titles from {}", snapshot.titles.len(), self.path.display());
        Ok(snapshot.titles)
    }

    /// Only showings that point at one of `titles` are returned
    #[instrument(skip(self, titles), fields(source = %self.source, titles = titles.len()))]
    async fn get_showings(&self, titles: &[RawTitle]) -> Result<Vec<RawShowing>> {
        let snapshot = self.load().await?;
        let total = snapshot.showings.len();

        let showings: Vec<RawShowing> = snapshot
            .showings
            .into_iter()
            .filter(|showing| match &showing.reference {
                TitleRef::Title(name) => titles.iter().any(|t| t.title == *name),
                TitleRef::TitleId(id) => titles.iter().any(|t| t.source_id == *id),
            })
            .collect();

        debug!(
            "Kept {} of {} showings for requested titles",
            showings.len(),
            total
        );
        Ok(showings)
    }
}
