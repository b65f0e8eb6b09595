//! Movie metadata provider abstraction
//!
//! `MetadataProvider` is the raw provider API (TMDB in production);
//! `MetadataService` turns its failures into the values page flows render.

mod client;
mod service;

pub use client::TmdbClient;
pub use service::{Lookup, MetadataService, MovieMetadata, MovieSuggestion, RunningTime};

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw movie-database API
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Title search
    async fn search_movies(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Details of one movie
    async fn movie_details(&self, id: &str) -> Result<MovieDetails>;

    /// Cast and crew of one movie
    async fn movie_credits(&self, id: &str) -> Result<Credits>;

    /// Videos attached to one movie
    async fn movie_videos(&self, id: &str) -> Result<Vec<Video>>;

    /// First page of the popular list
    async fn popular_movies(&self) -> Result<Vec<PopularMovie>>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Minutes
    #[serde(default)]
    pub runtime: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

impl Credits {
    /// Cast members who play a named character
    pub fn actors(&self) -> Vec<String> {
        self.cast
            .iter()
            .filter(|member| member.character.as_deref().is_some_and(|c| !c.is_empty()))
            .map(|member| member.name.clone())
            .collect()
    }

    /// Crew members whose job is exactly "Director"
    pub fn directors(&self) -> Vec<String> {
        self.crew
            .iter()
            .filter(|member| member.job.as_deref() == Some("Director"))
            .map(|member| member.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularMovie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopularResponse {
    #[serde(default)]
    pub results: Vec<PopularMovie>,
}

/// First YouTube trailer among the videos
pub fn youtube_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .find(|video| video.site == "YouTube" && video.kind == "Trailer")
}
