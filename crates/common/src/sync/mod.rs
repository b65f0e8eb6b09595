//! Popular-movie import
//!
//! Pulls the provider's popular list, enriches each entry with runtime and
//! credits, and stores the batch in one go. Titles already stored are
//! skipped so the import can be re-run.

use crate::db::models::NameList;
use crate::db::{NewMovie, Store};
use crate::errors::Result;
use crate::metadata::{MetadataProvider, PopularMovie};
use crate::metrics;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// What an import run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    Stored { stored: usize, skipped: usize },
    Failed { reason: String },
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncReport::Stored { .. } => write!(f, "Movies successfully fetched and stored."),
            SyncReport::Failed { reason } => write!(f, "Request failed: {}", reason),
        }
    }
}

/// Imports popular movies from a provider into a store
pub struct MovieSync {
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn Store>,
}

impl MovieSync {
    pub fn new(provider: Arc<dyn MetadataProvider>, store: Arc<dyn Store>) -> Self {
        Self { provider, store }
    }

    /// Fetch the popular list and persist it
    ///
    /// Provider failures are reported in the `SyncReport`; store failures
    /// are returned as errors.
    pub async fn fetch_and_store_popular(&self) -> Result<SyncReport> {
        let movies = match self.fetch_popular().await {
            Ok(movies) => movies,
            Err(e) => {
                tracing::error!(provider = self.provider.name(), error = %e, "Popular movie fetch failed");
                return Ok(SyncReport::Failed {
                    reason: e.to_string(),
                });
            }
        };

        let fetched = movies.len();
        let mut seen = HashSet::new();
        let mut fresh = Vec::with_capacity(fetched);
        for movie in movies {
            if !seen.insert(movie.title.clone()) {
                continue;
            }
            if self.store.find_movie_by_title(&movie.title).await?.is_some() {
                tracing::debug!(title = %movie.title, "Movie already stored, skipping");
                continue;
            }
            fresh.push(movie);
        }

        let stored = self.store.create_movies(fresh).await?.len();
        let skipped = fetched - stored;
        metrics::record_movies_created("sync", stored);

        tracing::info!(
            provider = self.provider.name(),
            fetched,
            stored,
            skipped,
            "Popular movies imported"
        );

        Ok(SyncReport::Stored { stored, skipped })
    }

    async fn fetch_popular(&self) -> Result<Vec<NewMovie>> {
        let popular = self.provider.popular_movies().await?;
        let mut movies = Vec::with_capacity(popular.len());

        for entry in popular {
            movies.push(self.enrich(entry).await?);
        }

        Ok(movies)
    }

    async fn enrich(&self, entry: PopularMovie) -> Result<NewMovie> {
        let id = entry.id.to_string();
        let (details, credits) = futures::try_join!(
            self.provider.movie_details(&id),
            self.provider.movie_credits(&id)
        )?;

        Ok(NewMovie {
            title: entry.title,
            imdb_id: Some(id),
            overview: entry.overview,
            poster: entry.poster_path,
            running_time: details.runtime,
            actors: Some(NameList(credits.actors())),
            directors: Some(NameList(credits.directors())),
        })
    }
}
