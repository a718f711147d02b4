use crate::error::{Result, ShowingsError};
use crate::models::{Batch, Location, Movie, Showing};
use crate::types::Source;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Storage trait for persisting the movie catalog
#[async_trait]
pub trait Storage: Send + Sync {
    // Movie operations
    /// Insert or update keyed on `normalized_title`; sets `movie.id`
    async fn upsert_movie(&self, movie: &mut Movie) -> Result<()>;
    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>>;
    async fn get_movie_by_normalized_title(&self, normalized_title: &str) -> Result<Option<Movie>>;
    async fn find_movie_by_source_id(&self, source: Source, source_id: &str) -> Result<Option<Movie>>;
    async fn list_movies(&self) -> Result<Vec<Movie>>;

    // Location operations
    /// Create the location unless one with the same name exists; sets `location.id` either way
    async fn ensure_location(&self, location: &mut Location) -> Result<()>;
    async fn get_location_by_name(&self, name: &str) -> Result<Option<Location>>;

    // Showing operations
    /// Insert or refresh keyed on movie, location, date and time; sets `showing.id`
    async fn upsert_showing(&self, showing: &mut Showing) -> Result<()>;
    /// Mark showings at `location_ids` that are not in `keep` as no longer
    /// showing, returning how many changed
    async fn deactivate_showings_except(&self, location_ids: &[Uuid], keep: &[Uuid]) -> Result<usize>;
    async fn list_active_showings(&self) -> Result<Vec<Showing>>;

    // Batch operations
    async fn create_batch(&self, batch: &mut Batch) -> Result<()>;
    async fn update_batch(&self, batch: &Batch) -> Result<()>;
    async fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>>;
    /// All batches, oldest first
    async fn list_batches(&self) -> Result<Vec<Batch>>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| ShowingsError::storage(format!("lock poisoned: {e}")))
}

/// In-memory storage implementation for development/testing
#[derive(Default)]
pub struct InMemoryStorage {
    movies: Arc<Mutex<HashMap<Uuid, Movie>>>,
    locations: Arc<Mutex<HashMap<Uuid, Location>>>,
    showings: Arc<Mutex<HashMap<Uuid, Showing>>>,
    batches: Arc<Mutex<HashMap<Uuid, Batch>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn upsert_movie(&self, movie: &mut Movie) -> Result<()> {
        movie.validate()?;

        let mut movies = lock(&self.movies)?;
        let existing = movies
            .values()
            .find(|m| m.normalized_title == movie.normalized_title)
            .map(|m| (m.id, m.created_at));

        match existing {
            Some((Some(id), created_at)) => {
                movie.id = Some(id);
                movie.created_at = created_at;
                movie.updated_at = Utc::now();
                movies.insert(id, movie.clone());
                debug!("Updated movie: {} with id {}", movie.normalized_title, id);
            }
            _ => {
                let id = Uuid::new_v4();
                movie.id = Some(id);
                movies.insert(id, movie.clone());
                debug!("Created movie: {} with id {}", movie.normalized_title, id);
            }
        }
        Ok(())
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>> {
        let movies = lock(&self.movies)?;
        Ok(movies.get(&id).cloned())
    }

    async fn get_movie_by_normalized_title(&self, normalized_title: &str) -> Result<Option<Movie>> {
        let movies = lock(&self.movies)?;
        Ok(movies
            .values()
            .find(|m| m.normalized_title == normalized_title)
            .cloned())
    }

    async fn find_movie_by_source_id(&self, source: Source, source_id: &str) -> Result<Option<Movie>> {
        let movies = lock(&self.movies)?;
        Ok(movies
            .values()
            .find(|m| m.id_for(source) == Some(source_id))
            .cloned())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>> {
        let movies = lock(&self.movies)?;
        let mut all: Vec<Movie> = movies.values().cloned().collect();
        all.sort_by(|a, b| a.normalized_title.cmp(&b.normalized_title));
        Ok(all)
    }

    async fn ensure_location(&self, location: &mut Location) -> Result<()> {
        location.validate()?;

        let mut locations = lock(&self.locations)?;
        if let Some(existing) = locations.values().find(|l| l.name == location.name) {
            debug!("Location {} already exists, skipping", existing.name);
            *location = existing.clone();
            return Ok(());
        }

        let id = Uuid::new_v4();
        location.id = Some(id);
        locations.insert(id, location.clone());
        debug!("Created location: {} with id {}", location.name, id);
        Ok(())
    }

    async fn get_location_by_name(&self, name: &str) -> Result<Option<Location>> {
        let locations = lock(&self.locations)?;
        Ok(locations
            .values()
            .find(|l| l.name.to_lowercase() == name.to_lowercase())
            .cloned())
    }

    async fn upsert_showing(&self, showing: &mut Showing) -> Result<()> {
        let mut showings = lock(&self.showings)?;
        let key: (Uuid, Uuid, NaiveDate, NaiveTime) = showing.natural_key();
        let existing = showings
            .values()
            .find(|s| s.natural_key() == key)
            .map(|s| (s.id, s.created_at));

        match existing {
            Some((Some(id), created_at)) => {
                showing.id = Some(id);
                showing.created_at = created_at;
                showing.updated_at = Utc::now();
                showings.insert(id, showing.clone());
                debug!("Refreshed showing {}", id);
            }
            _ => {
                let id = Uuid::new_v4();
                showing.id = Some(id);
                showings.insert(id, showing.clone());
                debug!("Created showing {}", id);
            }
        }
        Ok(())
    }

    async fn deactivate_showings_except(&self, location_ids: &[Uuid], keep: &[Uuid]) -> Result<usize> {
        let mut showings = lock(&self.showings)?;
        let mut changed = 0;
        for (id, showing) in showings.iter_mut() {
            if showing.is_showing && location_ids.contains(&showing.location_id) && !keep.contains(id) {
                showing.is_showing = false;
                showing.updated_at = Utc::now();
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_active_showings(&self) -> Result<Vec<Showing>> {
        let showings = lock(&self.showings)?;
        let mut active: Vec<Showing> = showings.values().filter(|s| s.is_showing).cloned().collect();
        active.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
        Ok(active)
    }

    async fn create_batch(&self, batch: &mut Batch) -> Result<()> {
        let id = Uuid::new_v4();
        batch.id = Some(id);

        let mut batches = lock(&self.batches)?;
        batches.insert(id, batch.clone());

        debug!("Created batch: {} with id {}", batch.batch_id, id);
        Ok(())
    }

    async fn update_batch(&self, batch: &Batch) -> Result<()> {
        let batch_id = batch
            .id
            .ok_or_else(|| ShowingsError::storage("Cannot update batch without ID"))?;

        let mut batches = lock(&self.batches)?;
        batches.insert(batch_id, batch.clone());

        debug!("Updated batch: {} ({:?})", batch.batch_id, batch.status);
        Ok(())
    }

    async fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>> {
        let batches = lock(&self.batches)?;
        Ok(batches.values().find(|b| b.batch_id == batch_id).cloned())
    }

    async fn list_batches(&self) -> Result<Vec<Batch>> {
        let batches = lock(&self.batches)?;
        let mut all: Vec<Batch> = batches.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}
