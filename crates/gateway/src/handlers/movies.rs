//! Movie catalog handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{cacheable, deleted, double_option, parse_json, stored};
use crate::validation::{self, TITLE_NULL, TITLE_TAKEN};
use crate::AppState;
use roastingreels_common::{
    auth::AuthContext,
    db::{models::{Movie, NameList}, MovieChanges, NewMovie, Store},
    errors::{field_errors, AppError, FieldErrors, Result},
    metrics,
};

/// Movie as returned by the catalog endpoints
#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    pub imdb_id: Option<String>,
    pub overview: Option<String>,
    pub poster: Option<String>,
    pub running_time: Option<i32>,
}

impl From<&Movie> for MovieResponse {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            imdb_id: movie.imdb_id.clone(),
            overview: movie.overview.clone(),
            poster: movie.poster.clone(),
            running_time: movie.running_time,
        }
    }
}

/// Cast and direction of a movie
#[derive(Debug, Serialize)]
pub struct CrewResponse {
    pub id: i32,
    pub title: String,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
}

impl From<&Movie> for CrewResponse {
    fn from(movie: &Movie) -> Self {
        let names = |list: &Option<NameList>| {
            list.as_ref().map(|l| l.as_slice().to_vec()).unwrap_or_default()
        };
        Self {
            id: movie.id,
            title: movie.title.clone(),
            actors: names(&movie.actors),
            directors: names(&movie.directors),
        }
    }
}

/// Request to create a movie
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    #[validate(
        required(message = "The title must not be null."),
        custom(function = "validation::movie_title")
    )]
    pub title: Option<String>,

    #[serde(alias = "imdb_id")]
    #[validate(length(max = 255, message = "The IMDb id cannot be longer than 255 characters."))]
    pub imdb_id: Option<String>,

    pub overview: Option<String>,

    #[validate(length(max = 255, message = "The poster cannot be longer than 255 characters."))]
    pub poster: Option<String>,

    #[serde(alias = "running_time")]
    #[validate(range(min = 1, message = "The running time must be a positive number of minutes."))]
    pub running_time: Option<i32>,

    pub actors: Option<Vec<String>>,

    pub directors: Option<Vec<String>>,
}

impl CreateMovieRequest {
    /// Validate, including the unique-title rule
    pub async fn check(&self, store: &dyn Store) -> Result<()> {
        let mut errors = field_errors(self.validate());
        if !errors.contains_key("title") {
            if let Some(title) = self.title.as_deref() {
                check_title_available(store, title.trim(), None, &mut errors).await?;
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation { errors })
        }
    }

    pub fn into_new_movie(self) -> NewMovie {
        NewMovie {
            title: self.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            imdb_id: self.imdb_id,
            overview: self.overview,
            poster: self.poster,
            running_time: self.running_time,
            actors: self.actors.map(NameList),
            directors: self.directors.map(NameList),
        }
    }
}

/// Partial movie update; absent fields are left alone, `null` clears
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, alias = "imdb_id", deserialize_with = "double_option")]
    pub imdb_id: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub overview: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub poster: Option<Option<String>>,

    #[serde(default, alias = "running_time", deserialize_with = "double_option")]
    pub running_time: Option<Option<i32>>,

    #[serde(default, deserialize_with = "double_option")]
    pub actors: Option<Option<Vec<String>>>,

    #[serde(default, deserialize_with = "double_option")]
    pub directors: Option<Option<Vec<String>>>,
}

impl UpdateMovieRequest {
    /// Validate the supplied fields against the movie being updated
    pub async fn check(&self, store: &dyn Store, movie_id: i32) -> Result<()> {
        let mut errors = FieldErrors::new();

        match &self.title {
            Some(None) => {
                errors.insert("title".into(), TITLE_NULL.into());
            }
            Some(Some(title)) => match validation::movie_title(title) {
                Ok(()) => {
                    check_title_available(store, title.trim(), Some(movie_id), &mut errors).await?
                }
                Err(e) => {
                    errors.insert("title".into(), message_of(e));
                }
            },
            None => {}
        }

        let too_long = |field: &Option<Option<String>>, max: usize| {
            matches!(field, Some(Some(v)) if v.chars().count() > max)
        };
        if too_long(&self.imdb_id, 255) {
            errors.insert("imdbId".into(), "The IMDb id cannot be longer than 255 characters.".into());
        }
        if too_long(&self.poster, 255) {
            errors.insert("poster".into(), "The poster cannot be longer than 255 characters.".into());
        }
        if matches!(self.running_time, Some(Some(minutes)) if minutes < 1) {
            errors.insert(
                "runningTime".into(),
                "The running time must be a positive number of minutes.".into(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation { errors })
        }
    }

    pub fn into_changes(self) -> MovieChanges {
        MovieChanges {
            title: self.title.flatten().map(|t| t.trim().to_string()),
            imdb_id: self.imdb_id,
            overview: self.overview,
            poster: self.poster,
            running_time: self.running_time,
            actors: self.actors.map(|a| a.map(NameList)),
            directors: self.directors.map(|d| d.map(NameList)),
        }
    }
}

fn message_of(error: validator::ValidationError) -> String {
    error
        .message
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

async fn check_title_available(
    store: &dyn Store,
    title: &str,
    except: Option<i32>,
    errors: &mut FieldErrors,
) -> Result<()> {
    if let Some(existing) = store.find_movie_by_title(title).await? {
        if Some(existing.id) != except {
            errors.insert("title".into(), TITLE_TAKEN.into());
        }
    }
    Ok(())
}

pub(crate) async fn find_movie(store: &dyn Store, id: i32) -> Result<Movie> {
    store
        .find_movie(id)
        .await?
        .ok_or(AppError::MovieNotFound { id })
}

fn movie_location(id: i32) -> String {
    format!("/api/v1/movies/{}", id)
}

/// List every movie
pub async fn list_movies(State(state): State<AppState>, _auth: AuthContext) -> Result<Response> {
    let movies = state.store.list_movies().await?;
    if movies.is_empty() {
        return Err(AppError::NotFound {
            message: "No movies found".to_string(),
        });
    }

    let body: Vec<MovieResponse> = movies.iter().map(MovieResponse::from).collect();
    Ok(cacheable(body))
}

/// Get one movie
pub async fn get_movie(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    let movie = find_movie(state.store.as_ref(), id).await?;
    Ok(cacheable(MovieResponse::from(&movie)))
}

/// Get the cast and directors of a movie
pub async fn get_crew(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    let movie = find_movie(state.store.as_ref(), id).await?;
    Ok(cacheable(CrewResponse::from(&movie)))
}

/// Create a movie
pub async fn create_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Bytes,
) -> Result<Response> {
    let request: CreateMovieRequest = parse_json(&body)?;
    request.check(state.store.as_ref()).await?;

    let movie = state.store.create_movie(request.into_new_movie()).await?;
    metrics::record_movies_created("api", 1);

    tracing::info!(
        movie_id = movie.id,
        title = %movie.title,
        user_id = auth.user_id,
        "Movie created"
    );

    Ok(stored(
        StatusCode::CREATED,
        movie_location(movie.id),
        MovieResponse::from(&movie),
    ))
}

/// Update a movie (PUT and PATCH both apply a partial update)
pub async fn update_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
    body: Bytes,
) -> Result<Response> {
    auth.require_editor("update this movie")?;
    find_movie(state.store.as_ref(), id).await?;

    let request: UpdateMovieRequest = parse_json(&body)?;
    request.check(state.store.as_ref(), id).await?;

    let movie = state
        .store
        .update_movie(id, request.into_changes())
        .await?
        .ok_or(AppError::MovieNotFound { id })?;

    tracing::info!(movie_id = id, user_id = auth.user_id, "Movie updated");

    Ok(stored(
        StatusCode::OK,
        movie_location(movie.id),
        MovieResponse::from(&movie),
    ))
}

/// Delete a movie and its reviews
pub async fn delete_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    auth.require_editor("delete this movie")?;

    if !state.store.delete_movie(id).await? {
        return Err(AppError::MovieNotFound { id });
    }

    tracing::info!(movie_id = id, user_id = auth.user_id, "Movie deleted");
    Ok(deleted())
}
