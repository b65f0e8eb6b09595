//! Metadata lookups backing the add-movie form

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    pub id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `[{id, title}]` for a partial title; `[]` for an empty query
pub async fn search_movie_title(
    State(state): State<AppState>,
    Query(params): Query<TitleQuery>,
) -> Response {
    let Some(query) = non_empty(params.query) else {
        return Json(json!([])).into_response();
    };

    Json(state.metadata.search_titles(&query).await).into_response()
}

/// Details and credits of one provider movie; `[]` without an id
pub async fn get_movie_details(
    State(state): State<AppState>,
    Query(params): Query<DetailsQuery>,
) -> Response {
    // "0" is the form's placeholder option
    let Some(id) = non_empty(params.id).filter(|id| id != "0") else {
        return Json(json!([])).into_response();
    };

    Json(state.metadata.movie_details(&id).await).into_response()
}
