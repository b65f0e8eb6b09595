//! Review handlers, nested under a movie

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::movies::find_movie;
use super::{cacheable, deleted, parse_json, stored};
use crate::validation;
use crate::AppState;
use roastingreels_common::{
    auth::AuthContext,
    db::{
        models::{Movie, Review, User},
        AuthoredReview, NewReview, ReviewChanges, Store,
    },
    errors::{AppError, Result},
    metrics,
};

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct MovieRefResponse {
    pub id: i32,
    pub title: String,
}

/// Review as listed under its movie
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i32,
    pub user: Option<AuthorResponse>,
    pub review_title: String,
    pub review_text: String,
    pub score: i32,
    pub date: NaiveDate,
}

impl ReviewResponse {
    pub fn new(review: &Review, author: Option<&User>) -> Self {
        Self {
            id: review.id,
            user: author.map(|user| AuthorResponse {
                name: user.name.clone(),
            }),
            review_title: review.review_title.clone(),
            review_text: review.review_text.clone(),
            score: review.score,
            date: review.date,
        }
    }
}

impl From<&AuthoredReview> for ReviewResponse {
    fn from(authored: &AuthoredReview) -> Self {
        Self::new(&authored.review, authored.author.as_ref())
    }
}

/// Single review with its movie
#[derive(Debug, Serialize)]
pub struct ReviewDetailResponse {
    #[serde(flatten)]
    pub review: ReviewResponse,
    pub movie: MovieRefResponse,
}

impl ReviewDetailResponse {
    pub fn new(review: &Review, author: Option<&User>, movie: &Movie) -> Self {
        Self {
            review: ReviewResponse::new(review, author),
            movie: MovieRefResponse {
                id: movie.id,
                title: movie.title.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Request to create a review
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(alias = "review_title")]
    #[validate(
        required(message = "The review title must not be blank."),
        custom(function = "validation::review_title")
    )]
    pub review_title: Option<String>,

    #[serde(alias = "review_text")]
    #[validate(
        required(message = "The review text must not be blank."),
        custom(function = "validation::review_text")
    )]
    pub review_text: Option<String>,

    #[validate(
        required(message = "Score cannot be blank"),
        range(min = 1, max = 5, message = "Score must be between 1 and 5")
    )]
    pub score: Option<i32>,
}

impl CreateReviewRequest {
    /// Validated review for `movie_id` by `user_id`, dated today
    pub fn into_new_review(self, movie_id: i32, user_id: i32) -> Result<NewReview> {
        self.validate()?;
        Ok(NewReview {
            movie_id,
            user_id,
            review_title: self.review_title.unwrap_or_default().trim().to_string(),
            review_text: self.review_text.unwrap_or_default(),
            score: self.score.unwrap_or_default(),
            date: Utc::now().date_naive(),
        })
    }
}

/// Partial review update; absent and `null` fields are left alone
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    #[serde(default, alias = "review_title")]
    #[validate(custom(function = "validation::review_title"))]
    pub review_title: Option<String>,

    #[serde(default, alias = "review_text")]
    #[validate(custom(function = "validation::review_text"))]
    pub review_text: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, max = 5, message = "Score must be between 1 and 5"))]
    pub score: Option<i32>,
}

impl UpdateReviewRequest {
    pub fn into_changes(self) -> Result<ReviewChanges> {
        self.validate()?;
        Ok(ReviewChanges {
            review_title: self.review_title.map(|t| t.trim().to_string()),
            review_text: self.review_text,
            score: self.score,
        })
    }
}

/// Movie and one of its reviews; a review filed under another movie is not found
pub(crate) async fn find_movie_review(
    store: &dyn Store,
    movie_id: i32,
    review_id: i32,
) -> Result<(Movie, AuthoredReview)> {
    let movie = find_movie(store, movie_id).await?;
    let review = store
        .find_review(review_id)
        .await?
        .filter(|authored| authored.review.movie_id == movie_id)
        .ok_or(AppError::ReviewNotFound {
            movie_id,
            review_id,
        })?;

    Ok((movie, review))
}

fn review_location(movie_id: i32, review_id: i32) -> String {
    format!("/api/v1/movies/{}/reviews/{}", movie_id, review_id)
}

/// List the reviews of a movie
pub async fn list_reviews(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(movie_id): Path<i32>,
) -> Result<Response> {
    find_movie(state.store.as_ref(), movie_id).await?;

    let reviews = state.store.reviews_for_movie(movie_id).await?;
    if reviews.is_empty() {
        return Ok(cacheable(MessageResponse {
            message: "No reviews found for this movie".to_string(),
        }));
    }

    let body: Vec<ReviewResponse> = reviews.iter().map(ReviewResponse::from).collect();
    Ok(cacheable(body))
}

/// Get one review of a movie
pub async fn get_review(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path((movie_id, review_id)): Path<(i32, i32)>,
) -> Result<Response> {
    let (movie, authored) = find_movie_review(state.store.as_ref(), movie_id, review_id).await?;
    Ok(cacheable(ReviewDetailResponse::new(
        &authored.review,
        authored.author.as_ref(),
        &movie,
    )))
}

/// Post a review as the authenticated user
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(movie_id): Path<i32>,
    body: Bytes,
) -> Result<Response> {
    let movie = find_movie(state.store.as_ref(), movie_id).await?;
    let request: CreateReviewRequest = parse_json(&body)?;

    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "User not authenticated".to_string(),
        })?;

    let review = state
        .store
        .create_review(request.into_new_review(movie.id, user.id)?)
        .await?;
    metrics::record_review_created("api");

    tracing::info!(
        review_id = review.id,
        movie_id = movie.id,
        user_id = user.id,
        score = review.score,
        "Review created"
    );

    Ok(stored(
        StatusCode::CREATED,
        review_location(movie.id, review.id),
        ReviewDetailResponse::new(&review, Some(&user), &movie),
    ))
}

/// Update a review (PUT and PATCH both apply a partial update)
pub async fn update_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((movie_id, review_id)): Path<(i32, i32)>,
    body: Bytes,
) -> Result<Response> {
    auth.require_editor("update this review")?;
    let (movie, authored) = find_movie_review(state.store.as_ref(), movie_id, review_id).await?;

    let request: UpdateReviewRequest = parse_json(&body)?;
    let review = state
        .store
        .update_review(review_id, request.into_changes()?)
        .await?
        .ok_or(AppError::ReviewNotFound {
            movie_id,
            review_id,
        })?;

    tracing::info!(review_id, movie_id, user_id = auth.user_id, "Review updated");

    Ok(stored(
        StatusCode::OK,
        review_location(movie_id, review_id),
        ReviewDetailResponse::new(&review, authored.author.as_ref(), &movie),
    ))
}

/// Delete a review
pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((movie_id, review_id)): Path<(i32, i32)>,
) -> Result<Response> {
    auth.require_editor("delete this review")?;
    find_movie_review(state.store.as_ref(), movie_id, review_id).await?;

    state.store.delete_review(review_id).await?;
    tracing::info!(review_id, movie_id, user_id = auth.user_id, "Review deleted");

    Ok(deleted())
}
