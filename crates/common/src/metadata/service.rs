//! Metadata lookups for page flows
//!
//! Provider failures never escape as errors here: they are logged and
//! returned as `Lookup::Failed` with a user-facing message, or as `None`
//! for trailers.

use super::{youtube_trailer, MetadataProvider};
use serde::{Serialize, Serializer};
use std::sync::Arc;

const SEARCH_FAILED: &str = "An error occurred while searching for movies.";
const DETAILS_FAILED: &str = "An error occurred while fetching movie details.";

/// Outcome of a lookup: the value itself, or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Lookup<T> {
    Found(T),
    Failed { error: String },
}

impl<T> Lookup<T> {
    pub fn failed(message: &str) -> Self {
        Lookup::Failed {
            error: message.to_string(),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Failed { .. } => None,
        }
    }
}

/// Title search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSuggestion {
    pub id: i64,
    pub title: String,
}

/// Runtime in minutes, or `"N/A"` when the provider has none
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunningTime {
    Minutes(i32),
    Unknown,
}

impl Serialize for RunningTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RunningTime::Minutes(minutes) => serializer.serialize_i32(*minutes),
            RunningTime::Unknown => serializer.serialize_str("N/A"),
        }
    }
}

impl From<Option<i32>> for RunningTime {
    fn from(runtime: Option<i32>) -> Self {
        runtime.map_or(RunningTime::Unknown, RunningTime::Minutes)
    }
}

/// Details used to pre-fill the add-movie form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieMetadata {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: String,
    pub running_time: RunningTime,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
}

/// Degrading wrapper around a `MetadataProvider`
pub struct MetadataService {
    provider: Arc<dyn MetadataProvider>,
    image_base_url: String,
}

impl MetadataService {
    pub fn new(provider: Arc<dyn MetadataProvider>, image_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            image_base_url: image_base_url.into(),
        }
    }

    pub fn provider(&self) -> Arc<dyn MetadataProvider> {
        Arc::clone(&self.provider)
    }

    /// Titles matching `query`
    pub async fn search_titles(&self, query: &str) -> Lookup<Vec<MovieSuggestion>> {
        match self.provider.search_movies(query).await {
            Ok(hits) => Lookup::Found(
                hits.into_iter()
                    .map(|hit| MovieSuggestion {
                        id: hit.id,
                        title: hit.title,
                    })
                    .collect(),
            ),
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    query = %query,
                    error = %e,
                    "Movie search failed"
                );
                Lookup::failed(SEARCH_FAILED)
            }
        }
    }

    /// Details and credits of one movie, merged
    pub async fn movie_details(&self, id: &str) -> Lookup<MovieMetadata> {
        let lookup = futures::try_join!(
            self.provider.movie_details(id),
            self.provider.movie_credits(id)
        );

        match lookup {
            Ok((details, credits)) => Lookup::Found(MovieMetadata {
                id: details.id,
                title: details.title,
                overview: details.overview,
                poster_path: format!(
                    "{}{}",
                    self.image_base_url,
                    details.poster_path.unwrap_or_default()
                ),
                running_time: details.runtime.into(),
                actors: credits.actors(),
                directors: credits.directors(),
            }),
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    movie_id = %id,
                    error = %e,
                    "Movie details lookup failed"
                );
                Lookup::failed(DETAILS_FAILED)
            }
        }
    }

    /// YouTube key of the movie's first trailer
    ///
    /// Unlike the other lookups a failure reads the same as "no trailer".
    pub async fn trailer_key(&self, id: &str) -> Option<String> {
        match self.provider.movie_videos(id).await {
            Ok(videos) => youtube_trailer(&videos).map(|video| video.key.clone()),
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    movie_id = %id,
                    error = %e,
                    "Trailer lookup failed"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, Result};
    use crate::metadata::{
        CastMember, Credits, CrewMember, MovieDetails, PopularMovie, SearchHit, Video,
    };
    use async_trait::async_trait;
    use serde_json::json;

    /// Provider returning canned data, or failing every call
    struct StubProvider {
        fail: bool,
        runtime: Option<i32>,
    }

    impl StubProvider {
        fn check(&self) -> Result<()> {
            if self.fail {
                Err(AppError::Upstream {
                    service: "stub".into(),
                    message: "connection refused".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl MetadataProvider for StubProvider {
        async fn search_movies(&self, _query: &str) -> Result<Vec<SearchHit>> {
            self.check()?;
            Ok(vec![SearchHit { id: 949, title: "Heat".into() }])
        }

        async fn movie_details(&self, id: &str) -> Result<MovieDetails> {
            self.check()?;
            Ok(MovieDetails {
                id: id.parse().unwrap_or_default(),
                title: "Heat".into(),
                overview: Some("A group of professional bank robbers...".into()),
                poster_path: Some("/heat.jpg".into()),
                runtime: self.runtime,
            })
        }

        async fn movie_credits(&self, _id: &str) -> Result<Credits> {
            self.check()?;
            Ok(Credits {
                cast: vec![
                    CastMember { name: "Al Pacino".into(), character: Some("Vincent Hanna".into()) },
                    CastMember { name: "Nobody".into(), character: None },
                ],
                crew: vec![CrewMember { name: "Michael Mann".into(), job: Some("Director".into()) }],
            })
        }

        async fn movie_videos(&self, _id: &str) -> Result<Vec<Video>> {
            self.check()?;
            Ok(vec![Video { key: "trailer-key".into(), site: "YouTube".into(), kind: "Trailer".into() }])
        }

        async fn popular_movies(&self) -> Result<Vec<PopularMovie>> {
            self.check()?;
            Ok(vec![])
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn service(fail: bool, runtime: Option<i32>) -> MetadataService {
        MetadataService::new(
            Arc::new(StubProvider { fail, runtime }),
            "https://image.tmdb.org/t/p/w500",
        )
    }

    #[tokio::test]
    async fn test_search_titles() {
        let result = service(false, None).search_titles("heat").await;
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!([{"id": 949, "title": "Heat"}])
        );
    }

    #[tokio::test]
    async fn test_search_failure_becomes_error_value() {
        let result = service(true, None).search_titles("heat").await;
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"error": "An error occurred while searching for movies."})
        );
    }

    #[tokio::test]
    async fn test_details_merge_credits_and_poster() {
        let details = service(false, Some(170)).movie_details("949").await.found().unwrap();

        assert_eq!(details.poster_path, "https://image.tmdb.org/t/p/w500/heat.jpg");
        assert_eq!(details.running_time, RunningTime::Minutes(170));
        assert_eq!(details.actors, vec!["Al Pacino"]);
        assert_eq!(details.directors, vec!["Michael Mann"]);
    }

    #[tokio::test]
    async fn test_missing_runtime_is_na() {
        let details = service(false, None).movie_details("949").await;
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["running_time"], json!("N/A"));
    }

    #[tokio::test]
    async fn test_details_failure_becomes_error_value() {
        let result = service(true, None).movie_details("949").await;
        assert_eq!(
            result,
            Lookup::failed("An error occurred while fetching movie details.")
        );
    }

    #[tokio::test]
    async fn test_trailer_key() {
        assert_eq!(
            service(false, None).trailer_key("949").await.as_deref(),
            Some("trailer-key")
        );
        assert_eq!(service(true, None).trailer_key("949").await, None);
    }
}
