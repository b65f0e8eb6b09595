//! Add-movie form with poster upload

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{
    flash::{self, Level},
    forms, to_login, Viewer,
};
use crate::handlers::movies::CreateMovieRequest;
use crate::validation::TITLE_TAKEN;
use crate::AppState;
use roastingreels_common::{
    auth::AuthContext,
    config::UploadConfig,
    db::{models::Movie, NewMovie, Store},
    errors::{AppError, FieldErrors, Result},
    metrics,
};

const UPLOAD_FAILED: &str = "Failed to upload the poster. Please try again.";
const INVALID_IMAGE: &str = "Please upload a valid image (JPEG, PNG or GIF).";

/// The form's textarea limit; the API accepts longer synced overviews
const OVERVIEW_MAX: usize = 250;

#[derive(Debug, Serialize)]
pub struct AddMoviePage {
    pub viewer: Viewer,
    pub max_poster_bytes: usize,
    pub default_poster: String,
    pub flashes: Vec<flash::Flash>,
}

#[derive(Debug)]
struct UploadedPoster {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

#[derive(Debug, Default)]
struct MovieForm {
    title: String,
    imdb_id: String,
    overview: String,
    running_time: String,
    actors: String,
    directors: String,
    poster_url: String,
    poster_file: Option<UploadedPoster>,
}

impl MovieForm {
    async fn read(mut multipart: Multipart) -> std::result::Result<Self, MultipartError> {
        let mut form = MovieForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "poster_file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.poster_file = Some(UploadedPoster {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                continue;
            }

            let value = field.text().await?;
            match name.as_str() {
                "title" => form.title = value,
                "imdb_id" => form.imdb_id = value,
                "overview" => form.overview = value,
                "running_time" => form.running_time = value,
                "actors" => form.actors = value,
                "directors" => form.directors = value,
                "poster_url" => form.poster_url = value,
                _ => {}
            }
        }

        Ok(form)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn names(value: &str) -> Option<Vec<String>> {
    let names = forms::split_names(value);
    (!names.is_empty()).then_some(names)
}

/// Where the poster comes from once the form is valid
enum PosterSource {
    Upload(UploadedPoster),
    Stored(String),
}

fn poster_source(
    form: &mut MovieForm,
    uploads: &UploadConfig,
    errors: &mut FieldErrors,
) -> Option<PosterSource> {
    if let Some(file) = form.poster_file.take() {
        if forms::image_extension(&file.content_type).is_none() {
            errors.insert("poster_file".into(), INVALID_IMAGE.into());
            return None;
        }
        if file.bytes.len() > uploads.max_poster_bytes {
            errors.insert(
                "poster_file".into(),
                format!(
                    "The poster must not be larger than {} KB.",
                    uploads.max_poster_bytes / 1024
                ),
            );
            return None;
        }
        return Some(PosterSource::Upload(file));
    }

    match non_empty(&form.poster_url) {
        Some(url) => match forms::poster_from_url(&url) {
            Ok(poster) => Some(PosterSource::Stored(poster)),
            Err(message) => {
                errors.insert("poster_url".into(), message.into());
                None
            }
        },
        None => Some(PosterSource::Stored(uploads.default_poster.clone())),
    }
}

/// Write an uploaded poster; returns the stored file name and its path
async fn save_poster(
    uploads: &UploadConfig,
    poster: UploadedPoster,
) -> std::io::Result<(String, PathBuf)> {
    let extension = forms::image_extension(&poster.content_type).unwrap_or("jpg");
    let file_name = forms::poster_file_name(&poster.file_name, extension);
    let path = Path::new(&uploads.posters_dir).join(&file_name);

    tokio::fs::create_dir_all(&uploads.posters_dir).await?;
    tokio::fs::write(&path, &poster.bytes).await?;

    Ok((file_name, path))
}

/// Insert the movie, removing the poster written for it when the insert fails
async fn create_with_poster(
    store: &dyn Store,
    movie: NewMovie,
    written: Option<&Path>,
) -> Result<Movie> {
    let result = store.create_movie(movie).await;

    if let (Err(_), Some(path)) = (&result, written) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove orphaned poster");
        }
    }

    result
}

fn back_to_form(jar: CookieJar, errors: FieldErrors) -> (CookieJar, Redirect) {
    (
        flash::push_all(jar, Level::Error, errors.into_values()),
        Redirect::to("/add-movie"),
    )
}

pub async fn form(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
) -> Response {
    let Some(auth) = auth else {
        return to_login().into_response();
    };

    let (jar, flashes) = flash::take(jar);
    (
        jar,
        Json(AddMoviePage {
            viewer: Viewer::from(&auth),
            max_poster_bytes: state.config.uploads.max_poster_bytes,
            default_poster: state.config.uploads.default_poster.clone(),
            flashes,
        }),
    )
        .into_response()
}

pub async fn submit(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<(CookieJar, Redirect)> {
    let Some(auth) = auth else {
        return Ok((jar, to_login()));
    };

    let mut form = match MovieForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable add-movie form");
            return Ok((
                flash::push(jar, Level::Error, UPLOAD_FAILED),
                Redirect::to("/add-movie"),
            ));
        }
    };

    let mut errors = FieldErrors::new();
    let running_time = match non_empty(&form.running_time) {
        None => None,
        Some(raw) => match raw.parse::<i32>() {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                errors.insert(
                    "running_time".into(),
                    "The running time must be a positive number of minutes.".into(),
                );
                None
            }
        },
    };

    if form.overview.trim().chars().count() > OVERVIEW_MAX {
        errors.insert(
            "overview".into(),
            format!("The overview cannot be longer than {} characters.", OVERVIEW_MAX),
        );
    }

    let request = CreateMovieRequest {
        title: Some(form.title.trim().to_string()),
        imdb_id: non_empty(&form.imdb_id),
        overview: non_empty(&form.overview),
        poster: None,
        running_time,
        actors: names(&form.actors),
        directors: names(&form.directors),
    };

    match request.check(state.store.as_ref()).await {
        Ok(()) => {}
        Err(AppError::Validation { errors: found }) => errors.extend(found),
        Err(e) => return Err(e),
    }

    let source = poster_source(&mut form, &state.config.uploads, &mut errors);
    let Some(source) = source.filter(|_| errors.is_empty()) else {
        return Ok(back_to_form(jar, errors));
    };

    let (poster, written) = match source {
        PosterSource::Stored(poster) => (poster, None),
        PosterSource::Upload(file) => match save_poster(&state.config.uploads, file).await {
            Ok((file_name, path)) => (file_name, Some(path)),
            Err(e) => {
                tracing::error!(error = %e, dir = %state.config.uploads.posters_dir, "Poster upload failed");
                return Ok((
                    flash::push(jar, Level::Error, UPLOAD_FAILED),
                    Redirect::to("/add-movie"),
                ));
            }
        },
    };

    let mut new_movie = request.into_new_movie();
    new_movie.poster = Some(poster);

    let movie = match create_with_poster(state.store.as_ref(), new_movie, written.as_deref()).await {
        Ok(movie) => movie,
        // another submission took the title after the check
        Err(AppError::Duplicate { .. }) => {
            let mut errors = FieldErrors::new();
            errors.insert("title".into(), TITLE_TAKEN.into());
            return Ok(back_to_form(jar, errors));
        }
        Err(e) => return Err(e),
    };
    metrics::record_movies_created("form", 1);
    tracing::info!(movie_id = movie.id, title = %movie.title, user_id = auth.user_id, "Movie added from form");

    Ok((
        flash::push(jar, Level::Success, "Your movie has been added successfully."),
        Redirect::to("/"),
    ))
}
