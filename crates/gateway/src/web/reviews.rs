//! Review forms: posting, editing and deleting

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    flash::{self, Level},
    to_login, Viewer,
};
use crate::handlers::{
    movies::find_movie,
    reviews::{CreateReviewRequest, MovieRefResponse, ReviewDetailResponse, UpdateReviewRequest},
};
use crate::validation::parse_score;
use crate::AppState;
use roastingreels_common::{
    auth::AuthContext,
    db::{AuthoredReview, Store},
    errors::{field_errors, AppError, FieldErrors, Result},
    metrics,
};

#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub review_title: String,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub score: String,
}

/// Edit form; the pressed button arrives as `save` or `delete`
#[derive(Debug, Default, Deserialize)]
pub struct EditReviewForm {
    #[serde(default)]
    pub review_title: String,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub score: String,
    pub save: Option<String>,
    pub delete: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewReviewPage {
    pub viewer: Viewer,
    pub movie: MovieRefResponse,
    pub flashes: Vec<flash::Flash>,
}

#[derive(Debug, Serialize)]
pub struct EditReviewPage {
    pub viewer: Viewer,
    pub review: ReviewDetailResponse,
    pub flashes: Vec<flash::Flash>,
}

/// Validator output with the typed score's own message in place
fn form_errors(
    validated: std::result::Result<(), validator::ValidationErrors>,
    score: std::result::Result<i32, &str>,
) -> FieldErrors {
    let mut errors = field_errors(validated);
    if let Err(message) = score {
        errors.insert("score".into(), message.into());
    }
    errors
}

async fn find_review(store: &dyn Store, id: i32) -> Result<AuthoredReview> {
    store.find_review(id).await?.ok_or_else(|| AppError::NotFound {
        message: "Review not found".to_string(),
    })
}

fn movie_page(movie_id: i32) -> Redirect {
    Redirect::to(&format!("/movie/{}", movie_id))
}

pub async fn new_review(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
    Path(movie_id): Path<i32>,
) -> Result<Response> {
    let Some(auth) = auth else {
        return Ok(to_login().into_response());
    };
    let movie = find_movie(state.store.as_ref(), movie_id).await?;

    let (jar, flashes) = flash::take(jar);
    Ok((
        jar,
        Json(NewReviewPage {
            viewer: Viewer::from(&auth),
            movie: MovieRefResponse {
                id: movie.id,
                title: movie.title,
            },
            flashes,
        }),
    )
        .into_response())
}

pub async fn submit_review(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
    Path(movie_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<(CookieJar, Redirect)> {
    let Some(auth) = auth else {
        return Ok((jar, to_login()));
    };
    let movie = find_movie(state.store.as_ref(), movie_id).await?;

    let Some(user) = state.store.find_user(auth.user_id).await? else {
        return Ok((jar, to_login()));
    };

    let score = parse_score(&form.score);
    let request = CreateReviewRequest {
        review_title: Some(form.review_title),
        review_text: Some(form.review_text),
        score: score.ok(),
    };

    let errors = form_errors(request.validate(), score);
    if !errors.is_empty() {
        return Ok((
            flash::push_all(jar, Level::Error, errors.into_values()),
            Redirect::to(&format!("/movie/{}/add-review", movie.id)),
        ));
    }

    let review = state
        .store
        .create_review(request.into_new_review(movie.id, user.id)?)
        .await?;
    metrics::record_review_created("form");
    tracing::info!(review_id = review.id, movie_id = movie.id, user_id = user.id, "Review submitted from form");

    Ok((
        flash::push(jar, Level::Success, "Your review has been submitted successfully."),
        movie_page(movie.id),
    ))
}

pub async fn edit_review(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Result<Response> {
    let Some(auth) = auth else {
        return Ok(to_login().into_response());
    };
    auth.require_editor("edit this review")?;

    let authored = find_review(state.store.as_ref(), id).await?;
    let movie = find_movie(state.store.as_ref(), authored.review.movie_id).await?;

    let (jar, flashes) = flash::take(jar);
    Ok((
        jar,
        Json(EditReviewPage {
            viewer: Viewer::from(&auth),
            review: ReviewDetailResponse::new(&authored.review, authored.author.as_ref(), &movie),
            flashes,
        }),
    )
        .into_response())
}

pub async fn save_review(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
    Path(id): Path<i32>,
    Form(form): Form<EditReviewForm>,
) -> Result<(CookieJar, Redirect)> {
    let Some(auth) = auth else {
        return Ok((jar, to_login()));
    };
    auth.require_editor("edit this review")?;

    let review = find_review(state.store.as_ref(), id).await?.review;

    if form.delete.is_some() {
        state.store.delete_review(id).await?;
        tracing::info!(review_id = id, user_id = auth.user_id, "Review deleted from form");
        return Ok((
            flash::push(jar, Level::Success, "Review deleted successfully."),
            movie_page(review.movie_id),
        ));
    }

    let score = parse_score(&form.score);
    let request = UpdateReviewRequest {
        review_title: Some(form.review_title),
        review_text: Some(form.review_text),
        score: score.ok(),
    };

    let errors = form_errors(request.validate(), score);
    if !errors.is_empty() {
        return Ok((
            flash::push_all(jar, Level::Error, errors.into_values()),
            Redirect::to(&format!("/review/edit/{}", id)),
        ));
    }

    state.store.update_review(id, request.into_changes()?).await?;
    tracing::info!(review_id = id, user_id = auth.user_id, "Review updated from form");

    Ok((
        flash::push(jar, Level::Success, "Review updated successfully."),
        movie_page(review.movie_id),
    ))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_json, flash_messages, location, TestApp};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_review_form_requires_login() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let uri = format!("/movie/{}/add-review", movie.id);

        let response = app.page(&uri, None).await;
        assert_eq!(location(&response), "/login");

        let response = app.form(&uri, None, "review_title=t&review_text=x&score=3").await;
        assert_eq!(location(&response), "/login");
        assert!(app.state.store.reviews_for_movie(movie.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_review() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let token = app.member_token().await;

        let response = app
            .form(
                &format!("/movie/{}/add-review", movie.id),
                Some(&token),
                "review_title=Tense&review_text=Loved+the+shootout&score=5",
            )
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("/movie/{}", movie.id));
        assert_eq!(
            flash_messages(&response),
            vec!["Your review has been submitted successfully.".to_string()]
        );

        let reviews = app.state.store.reviews_for_movie(movie.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review.review_text, "Loved the shootout");
        assert_eq!(reviews[0].author.as_ref().unwrap().name, "Member");
    }

    #[tokio::test]
    async fn test_out_of_range_score_flashes_error() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let token = app.member_token().await;
        let uri = format!("/movie/{}/add-review", movie.id);

        let response = app
            .form(&uri, Some(&token), "review_title=Tense&review_text=x&score=7")
            .await;

        assert_eq!(location(&response), uri);
        assert_eq!(
            flash_messages(&response),
            vec!["Score must be between 1 and 5".to_string()]
        );
        assert!(app.state.store.reviews_for_movie(movie.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_score_flashes_error() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let token = app.member_token().await;

        let response = app
            .form(
                &format!("/movie/{}/add-review", movie.id),
                Some(&token),
                "review_title=Tense&review_text=x&score=",
            )
            .await;

        assert_eq!(flash_messages(&response), vec!["Score cannot be blank".to_string()]);
    }

    #[tokio::test]
    async fn test_edit_requires_editor() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let review = app.review(movie.id, 4).await;
        let token = app.member_token().await;

        let response = app.page(&format!("/review/edit/{}", review.id), Some(&token)).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_edit_page_shows_review() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let review = app.review(movie.id, 4).await;
        let token = app.editor_token().await;

        let response = app.page(&format!("/review/edit/{}", review.id), Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["review"]["score"], 4);
        assert_eq!(body["review"]["movie"]["title"], "Heat");
    }

    #[tokio::test]
    async fn test_save_review() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let review = app.review(movie.id, 4).await;
        let token = app.editor_token().await;

        let response = app
            .form(
                &format!("/review/edit/{}", review.id),
                Some(&token),
                "review_title=Edited&review_text=Still+great&score=2&save=",
            )
            .await;

        assert_eq!(location(&response), format!("/movie/{}", movie.id));
        assert_eq!(flash_messages(&response), vec!["Review updated successfully.".to_string()]);

        let stored = app.state.store.find_review(review.id).await.unwrap().unwrap();
        assert_eq!(stored.review.review_title, "Edited");
        assert_eq!(stored.review.score, 2);
    }

    #[tokio::test]
    async fn test_delete_review_from_form() {
        let app = TestApp::new().await;
        let movie = app.movie("Heat").await;
        let review = app.review(movie.id, 4).await;
        let token = app.editor_token().await;

        let response = app
            .form(
                &format!("/review/edit/{}", review.id),
                Some(&token),
                "review_title=&review_text=&score=&delete=",
            )
            .await;

        assert_eq!(location(&response), format!("/movie/{}", movie.id));
        assert_eq!(flash_messages(&response), vec!["Review deleted successfully.".to_string()]);
        assert!(app.state.store.find_review(review.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edit_unknown_review() {
        let app = TestApp::new().await;
        let token = app.editor_token().await;

        let response = app.page("/review/edit/404", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
