use crate::error::{Result, ShowingsError};
use crate::matching::TitleMatcher;
use crate::metrics::RefreshMetrics;
use crate::models::{Batch, BatchStatus, Location, Movie};
use crate::showings::{aggregate_showings, MovieIndex, SkippedShowing};
use crate::storage::Storage;
use crate::types::{CinemaApi, RawTitle, Source};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// What one source contributed to a refresh
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub titles: usize,
    pub showings_stored: usize,
    pub showings_skipped: usize,
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: Source) -> Self {
        Self {
            source,
            titles: 0,
            showings_stored: 0,
            showings_skipped: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub batch_id: String,
    pub status: BatchStatus,
    pub canonical_titles: usize,
    pub movies_upserted: usize,
    pub showings_stored: usize,
    pub showings_deactivated: usize,
    pub sources: Vec<SourceReport>,
    pub errors: Vec<String>,
}

/// An active showing joined with its movie and location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveShowing {
    pub title: String,
    pub location: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub url: Option<String>,
}

/// Runs one refresh: fetch every source, match titles, store movies and showings.
pub struct RefreshWorkflow {
    storage: Arc<dyn Storage>,
    apis: Vec<Box<dyn CinemaApi>>,
    matcher: TitleMatcher,
    today: Option<NaiveDate>,
}

impl RefreshWorkflow {
    pub fn new(storage: Arc<dyn Storage>, apis: Vec<Box<dyn CinemaApi>>) -> Self {
        Self {
            storage,
            apis,
            matcher: TitleMatcher::default(),
            today: None,
        }
    }

    pub fn with_matcher(mut self, matcher: TitleMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Pin the date past showings are measured against
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Make sure every source's cinema exists, returning ids by lower-cased name
    pub async fn seed_locations(&self) -> Result<HashMap<String, Uuid>> {
        let mut locations = HashMap::new();
        for source in Source::ALL {
            let mut location = Location::for_source(source);
            self.storage.ensure_location(&mut location).await?;
            let id = location
                .id
                .ok_or_else(|| ShowingsError::storage(format!("location '{}' has no id", location.name)))?;
            locations.insert(location.name.to_lowercase(), id);
        }
        Ok(locations)
    }

    #[instrument(skip(self), fields(sources = self.apis.len()))]
    pub async fn run(&self) -> Result<RefreshReport> {
        let started = Instant::now();
        let locations = self.seed_locations().await?;

        let mut batch = Batch::new();
        batch.set_status(BatchStatus::Processing);
        self.storage.create_batch(&mut batch).await?;
        info!("Starting refresh batch {}", batch.batch_id);

        match self.run_batch(&mut batch, &locations).await {
            Ok(report) => {
                RefreshMetrics::record_run("completed", started.elapsed().as_secs_f64());
                Ok(report)
            }
            Err(e) => {
                error!("Refresh batch {} failed: {}", batch.batch_id, e);
                batch.set_status(BatchStatus::Failed);
                if let Err(update_err) = self.storage.update_batch(&batch).await {
                    error!("Could not mark batch {} as failed: {}", batch.batch_id, update_err);
                }
                RefreshMetrics::record_run("failed", started.elapsed().as_secs_f64());
                Err(e)
            }
        }
    }

    /// Everything after the batch record exists. An error here fails the batch.
    async fn run_batch(&self, batch: &mut Batch, locations: &HashMap<String, Uuid>) -> Result<RefreshReport> {
        let mut reports: Vec<SourceReport> = self.apis.iter().map(|api| SourceReport::new(api.source())).collect();
        let mut errors = Vec::new();

        // Step 1: fetch titles; a failing source is recorded and left out
        let mut fetched: Vec<Option<Vec<RawTitle>>> = Vec::with_capacity(self.apis.len());
        for (api, report) in self.apis.iter().zip(reports.iter_mut()) {
            let source = api.source();
            match api.get_titles().await {
                Ok(titles) => {
                    info!("Fetched {} titles from {}", titles.len(), source);
                    RefreshMetrics::record_titles_fetched(source.as_str(), titles.len());
                    report.titles = titles.len();
                    fetched.push(Some(titles));
                }
                Err(e) => {
                    warn!("Failed to fetch titles from {}: {}", source, e);
                    RefreshMetrics::record_source_failure(source.as_str(), "titles");
                    report.error = Some(e.to_string());
                    errors.push(format!("{source}: {e}"));
                    fetched.push(None);
                }
            }
        }

        // Step 2: match
        let mut by_source: HashMap<Source, Vec<RawTitle>> = HashMap::new();
        for (api, titles) in self.apis.iter().zip(&fetched) {
            if let Some(titles) = titles {
                by_source.entry(api.source()).or_default().extend(titles.iter().cloned());
            }
        }
        let t_match = Instant::now();
        let canonical = self.matcher.match_titles(
            titles_for(&by_source, Source::Grand),
            titles_for(&by_source, Source::Prime),
            titles_for(&by_source, Source::Taj),
        )?;
        RefreshMetrics::record_match_duration(t_match.elapsed().as_secs_f64());

        // Step 3: movies. Rows sharing a key (one site listing a film twice)
        // are folded into a single movie before it is stored.
        let mut movies: Vec<Movie> = Vec::with_capacity(canonical.len());
        for title in &canonical {
            let movie = Movie::from_canonical(title);
            match movies.iter_mut().find(|m| m.normalized_title == movie.normalized_title) {
                Some(existing) => {
                    for (source, id) in existing.absorb(&movie) {
                        warn!(
                            "'{}' is listed twice by {}; keeping id {:?}, dropping {}",
                            existing.normalized_title,
                            source,
                            existing.id_for(source),
                            id
                        );
                    }
                }
                None => movies.push(movie),
            }
        }

        let mut movie_ids = Vec::with_capacity(movies.len());
        for mut movie in movies {
            match self.storage.upsert_movie(&mut movie).await {
                Ok(()) => movie_ids.extend(movie.id),
                Err(ShowingsError::Validation { message, .. }) => {
                    warn!("Skipping movie '{}': {}", movie.normalized_title, message);
                    errors.push(format!("movie '{}': {}", movie.normalized_title, message));
                }
                Err(e) => return Err(e),
            }
        }
        RefreshMetrics::record_movies_upserted(movie_ids.len());
        batch.movie_ids = movie_ids;

        // Step 4: showings for every source whose titles came through
        let index = MovieIndex::new(&self.storage.list_movies().await?);
        if index.is_empty() {
            warn!("No stored movies to attach showings to");
        } else {
            debug!("Resolving showings against {} movies", index.len());
        }
        let today = self.today();
        let mut showing_ids = Vec::new();
        let mut refreshed_locations = Vec::new();

        for ((api, titles), report) in self.apis.iter().zip(&fetched).zip(reports.iter_mut()) {
            let Some(titles) = titles else {
                continue;
            };
            let source = api.source();
            let raw_showings = match api.get_showings(titles).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Failed to fetch showings from {}: {}", source, e);
                    RefreshMetrics::record_source_failure(source.as_str(), "showings");
                    report.error = Some(e.to_string());
                    errors.push(format!("{source}: {e}"));
                    continue;
                }
            };

            let aggregated = aggregate_showings(source, &raw_showings, &index, locations, today);
            for mut showing in aggregated.showings {
                self.storage.upsert_showing(&mut showing).await?;
                if let Some(id) = showing.id {
                    showing_ids.push(id);
                }
                report.showings_stored += 1;
            }
            report.showings_skipped = aggregated.skipped.len();
            errors.extend(aggregated.skipped.iter().map(describe_skipped));
            RefreshMetrics::record_showings(source.as_str(), report.showings_stored, report.showings_skipped);

            if let Some(id) = locations.get(&source.location_name().to_lowercase()) {
                refreshed_locations.push(*id);
            }
        }

        // Step 5: anything not seen this time at a refreshed cinema has ended
        let showings_deactivated = self
            .storage
            .deactivate_showings_except(&refreshed_locations, &showing_ids)
            .await?;
        if showings_deactivated > 0 {
            info!("Marked {} showings as no longer showing", showings_deactivated);
        }

        batch.showing_ids = showing_ids;
        batch.set_status(BatchStatus::Completed);
        self.storage.update_batch(batch).await?;

        let report = RefreshReport {
            batch_id: batch.batch_id.clone(),
            status: batch.status,
            canonical_titles: canonical.len(),
            movies_upserted: batch.movie_ids.len(),
            showings_stored: batch.showing_ids.len(),
            showings_deactivated,
            sources: reports,
            errors,
        };
        info!(
            "Refresh batch {} completed: {} movies, {} showings, {} errors",
            report.batch_id,
            report.movies_upserted,
            report.showings_stored,
            report.errors.len()
        );
        Ok(report)
    }
}

fn titles_for(by_source: &HashMap<Source, Vec<RawTitle>>, source: Source) -> &[RawTitle] {
    by_source.get(&source).map(Vec::as_slice).unwrap_or(&[])
}

fn describe_skipped(skipped: &SkippedShowing) -> String {
    format!("{}: showing {:?} skipped: {}", skipped.source, skipped.reference, skipped.reason)
}

/// Active showings in date order, labelled with movie and cinema names
pub async fn list_active_showings(storage: &dyn Storage) -> Result<Vec<ActiveShowing>> {
    let mut listing = Vec::new();
    let mut location_names: HashMap<Uuid, String> = HashMap::new();
    for source in Source::ALL {
        if let Some(location) = storage.get_location_by_name(source.location_name()).await? {
            if let Some(id) = location.id {
                location_names.insert(id, location.name);
            }
        }
    }

    for showing in storage.list_active_showings().await? {
        let Some(movie) = storage.get_movie(showing.movie_id).await? else {
            warn!("Active showing {:?} points at a missing movie", showing.id);
            continue;
        };
        listing.push(ActiveShowing {
            title: movie.display_title().to_string(),
            location: location_names
                .get(&showing.location_id)
                .cloned()
                .unwrap_or_default(),
            date: showing.date,
            time: showing.time,
            url: showing.url,
        });
    }
    Ok(listing)
}

/// Distinct titles of movies that have at least one active showing
pub async fn active_movie_titles(storage: &dyn Storage) -> Result<Vec<String>> {
    let titles: BTreeSet<String> = list_active_showings(storage)
        .await?
        .into_iter()
        .map(|s| s.title)
        .collect();
    Ok(titles.into_iter().collect())
}
