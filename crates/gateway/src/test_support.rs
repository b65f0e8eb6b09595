//! Router fixtures for handler tests: in-memory store, canned metadata
//! provider and translator

use crate::web::flash;
use crate::{create_router, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, request::Builder, Method, Request},
    response::Response,
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use roastingreels_common::{
    auth::{hash_password, JwtManager},
    config::AppConfig,
    db::{
        models::{Movie, NameList, Review, RoleSet, User, ROLE_EDITOR},
        InMemoryStore, NewMovie, NewReview, NewUser, Store,
    },
    errors::{AppError, Result},
    metadata::{
        CastMember, Credits, CrewMember, MetadataProvider, MetadataService, MovieDetails,
        PopularMovie, SearchHit, Video,
    },
    translation::{Translate, Translation},
};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse";
pub const EDITOR_EMAIL: &str = "editor@roastingreels.editor.com";
pub const MEMBER_EMAIL: &str = "member@example.com";

/// Largest poster the test app accepts
pub const MAX_POSTER_BYTES: usize = 2048;

fn upstream_failure() -> AppError {
    AppError::Upstream {
        service: "fake".into(),
        message: "connection refused".into(),
    }
}

/// Knows one movie: Heat (949)
pub struct FakeProvider;

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn search_movies(&self, query: &str) -> Result<Vec<SearchHit>> {
        if query == "fail" {
            return Err(upstream_failure());
        }
        let hits = [SearchHit { id: 949, title: "Heat".into() }];
        Ok(hits
            .into_iter()
            .filter(|hit| hit.title.to_lowercase().contains(&query.to_lowercase()))
            .collect())
    }

    async fn movie_details(&self, id: &str) -> Result<MovieDetails> {
        if id == "404" {
            return Err(upstream_failure());
        }
        Ok(MovieDetails {
            id: 949,
            title: "Heat".into(),
            overview: Some("A group of professional bank robbers.".into()),
            poster_path: Some("/heat.jpg".into()),
            runtime: Some(170),
        })
    }

    async fn movie_credits(&self, _id: &str) -> Result<Credits> {
        Ok(Credits {
            cast: vec![
                CastMember { name: "Al Pacino".into(), character: Some("Vincent Hanna".into()) },
                CastMember { name: "Stand In".into(), character: None },
            ],
            crew: vec![
                CrewMember { name: "Michael Mann".into(), job: Some("Director".into()) },
                CrewMember { name: "Dante Spinotti".into(), job: Some("Director of Photography".into()) },
            ],
        })
    }

    async fn movie_videos(&self, id: &str) -> Result<Vec<Video>> {
        if id != "949" {
            return Err(upstream_failure());
        }
        Ok(vec![
            Video { key: "teaser".into(), site: "YouTube".into(), kind: "Teaser".into() },
            Video { key: "heat-trailer".into(), site: "YouTube".into(), kind: "Trailer".into() },
        ])
    }

    async fn popular_movies(&self) -> Result<Vec<PopularMovie>> {
        Ok(vec![])
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Prefixes the language; cannot translate into Klingon
pub struct FakeTranslator;

#[async_trait]
impl Translate for FakeTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Translation {
        if target_language == "Klingon" {
            return Translation::Failed {
                error: "Unexpected API response structure.".into(),
            };
        }
        Translation::Translated {
            response: format!("({}) {}", target_language, text),
        }
    }
}

fn password_hash() -> String {
    // argon2 is slow in debug builds; hash once per test binary
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

pub struct TestApp {
    pub state: AppState,
    pub posters: TempDir,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let posters = tempfile::tempdir().unwrap();

        let mut config = AppConfig::default();
        config.uploads.posters_dir = posters.path().to_string_lossy().to_string();
        config.uploads.max_poster_bytes = MAX_POSTER_BYTES;

        let provider = Arc::new(FakeProvider);
        let state = AppState {
            config: Arc::new(config),
            store: Arc::new(InMemoryStore::new()),
            jwt: Arc::new(JwtManager::new("test-secret", 3600)),
            metadata: Arc::new(MetadataService::new(
                provider,
                "https://image.tmdb.org/t/p/w500",
            )),
            translator: Arc::new(FakeTranslator),
            metrics: None,
        };

        let router = create_router(state.clone());
        Self { state, posters, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>) -> Response {
        self.send(builder(method, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, uri, token).await
    }

    /// API read with a member's bearer token
    pub async fn get_as_member(&self, uri: &str) -> Response {
        let token = self.member_token().await;
        self.get(uri, Some(&token)).await
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.raw(method, uri, token, &body.to_string()).await
    }

    pub async fn raw(&self, method: Method, uri: &str, token: Option<&str>, body: &str) -> Response {
        let request = builder(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Page request carrying the auth cookie instead of a bearer header
    pub async fn page(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(page_builder(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    /// urlencoded form post carrying the auth cookie
    pub async fn form(&self, uri: &str, token: Option<&str>, body: &str) -> Response {
        let request = page_builder(Method::POST, uri, token)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn multipart(
        &self,
        uri: &str,
        token: Option<&str>,
        boundary: &str,
        body: Vec<u8>,
    ) -> Response {
        let request = page_builder(Method::POST, uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn user(&self, email: &str, name: &str, roles: RoleSet) -> User {
        if let Some(user) = self.state.store.find_user_by_email(email).await.unwrap() {
            return user;
        }
        self.state
            .store
            .create_user(NewUser {
                email: email.into(),
                name: name.into(),
                password_hash: password_hash(),
                roles,
            })
            .await
            .unwrap()
    }

    pub async fn member(&self) -> User {
        self.user(MEMBER_EMAIL, "Member", RoleSet::default()).await
    }

    pub async fn editor(&self) -> User {
        self.user(EDITOR_EMAIL, "Editor", RoleSet::new([ROLE_EDITOR])).await
    }

    pub async fn member_token(&self) -> String {
        let user = self.member().await;
        self.state.jwt.generate_token(&user).unwrap()
    }

    pub async fn editor_token(&self) -> String {
        let user = self.editor().await;
        self.state.jwt.generate_token(&user).unwrap()
    }

    pub async fn movie(&self, title: &str) -> Movie {
        self.state
            .store
            .create_movie(NewMovie {
                title: title.into(),
                imdb_id: Some("949".into()),
                overview: Some("Cops and robbers.".into()),
                poster: Some("/heat.jpg".into()),
                running_time: Some(170),
                actors: Some(NameList(vec!["Al Pacino".into(), "Robert De Niro".into()])),
                directors: Some(NameList(vec!["Michael Mann".into()])),
            })
            .await
            .unwrap()
    }

    /// Review by the member user
    pub async fn review(&self, movie_id: i32, score: i32) -> Review {
        self.review_on(movie_id, score, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .await
    }

    pub async fn review_on(&self, movie_id: i32, score: i32, date: NaiveDate) -> Review {
        let author = self.member().await;
        self.state
            .store
            .create_review(NewReview {
                movie_id,
                user_id: author.id,
                review_title: "Tense".into(),
                review_text: "Solid heist movie.".into(),
                score,
                date,
            })
            .await
            .unwrap()
    }
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

fn page_builder(method: Method, uri: &str, token: Option<&str>) -> Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::COOKIE, format!("auth_token={}", token)),
        None => builder,
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Redirect target of a response
pub fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Value of a cookie set by the response
pub fn set_cookie(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(|value| {
            value[prefix.len()..]
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

/// Flash messages queued by the response
pub fn flash_messages(response: &Response) -> Vec<String> {
    set_cookie(response, flash::FLASH_COOKIE)
        .map(|value| flash::decode(&value))
        .unwrap_or_default()
        .into_iter()
        .map(|flash| flash.message)
        .collect()
}
