//! Server-side page flows
//!
//! GET handlers return the view model a template renders, with any flash
//! messages consumed along the way. POST handlers answer with a redirect
//! and leave their outcome in a flash message.

pub mod account;
pub mod add_movie;
pub mod flash;
pub mod forms;
pub mod home;
pub mod movie_detail;
pub mod reviews;

use axum::{response::Redirect, routing::get, Router};
use roastingreels_common::auth::AuthContext;
use serde::Serialize;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/movie/{id}", get(movie_detail::show))
        .route("/add-movie", get(add_movie::form).post(add_movie::submit))
        .route(
            "/movie/{id}/add-review",
            get(reviews::new_review).post(reviews::submit_review),
        )
        .route(
            "/review/edit/{id}",
            get(reviews::edit_review).post(reviews::save_review),
        )
        .route("/register", get(account::register_form).post(account::register))
        .route("/login", get(account::login_form).post(account::login))
        .route("/logout", get(account::logout))
}

/// The signed-in visitor, as far as templates care
#[derive(Debug, Serialize)]
pub struct Viewer {
    pub email: String,
    pub is_editor: bool,
}

impl From<&AuthContext> for Viewer {
    fn from(auth: &AuthContext) -> Self {
        Self {
            email: auth.email.clone(),
            is_editor: auth.is_editor(),
        }
    }
}

pub fn to_login() -> Redirect {
    Redirect::to("/login")
}

/// 1-based page number from a query string value; junk reads as page 1
pub fn page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1)
}
