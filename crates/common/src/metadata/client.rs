//! TMDB HTTP client

use super::{
    Credits, MetadataProvider, MovieDetails, PopularMovie, PopularResponse, SearchHit,
    SearchResponse, Video, VideosResponse,
};
use crate::config::{MetadataConfig, TlsConfig};
use crate::errors::{AppError, Result};
use crate::{http, metrics};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::{Duration, Instant};

const SERVICE: &str = "tmdb";

/// TMDB v3 API client
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
    language: String,
}

impl TmdbClient {
    /// Create a client trusting the configured CA bundle
    pub fn from_config(config: &MetadataConfig, tls: &TlsConfig) -> Result<Self> {
        let http = http::build_client(
            Duration::from_secs(config.timeout_secs),
            tls.ca_bundle_path.as_deref().map(Path::new),
        )?;

        Ok(Self::with_http_client(http, config))
    }

    /// Create a client around an existing reqwest client
    pub fn with_http_client(http: reqwest::Client, config: &MetadataConfig) -> Self {
        let bearer_token = config.bearer_token.clone().unwrap_or_default();
        if bearer_token.is_empty() {
            tracing::warn!("TMDB bearer token is not configured; provider calls will be rejected");
        }

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token,
            language: config.language.clone(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let result = self.send(&url, query).await;
        metrics::record_upstream_call(SERVICE, result.is_ok(), start.elapsed().as_secs_f64());

        result.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "TMDB request failed");
            e
        })
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                service: SERVICE.to_string(),
                message: format!("{}: {}", status, body),
            });
        }

        response.json::<T>().await.map_err(Into::into)
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response: SearchResponse = self
            .get(
                "/3/search/movie",
                &[
                    ("query", query),
                    ("include_adult", "false"),
                    ("language", self.language.as_str()),
                ],
            )
            .await?;

        Ok(response.results)
    }

    async fn movie_details(&self, id: &str) -> Result<MovieDetails> {
        self.get(&format!("/3/movie/{}", id), &[("language", self.language.as_str())])
            .await
    }

    async fn movie_credits(&self, id: &str) -> Result<Credits> {
        self.get(&format!("/3/movie/{}/credits", id), &[("language", self.language.as_str())])
            .await
    }

    async fn movie_videos(&self, id: &str) -> Result<Vec<Video>> {
        let response: VideosResponse = self
            .get(&format!("/3/movie/{}/videos", id), &[("language", self.language.as_str())])
            .await?;

        Ok(response.results)
    }

    async fn popular_movies(&self) -> Result<Vec<PopularMovie>> {
        let response: PopularResponse = self
            .get("/3/movie/popular", &[("language", self.language.as_str()), ("page", "1")])
            .await?;

        Ok(response.results)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
