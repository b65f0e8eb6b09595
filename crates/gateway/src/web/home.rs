//! Movie browsing

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use super::{flash, page_number, Viewer};
use crate::handlers::movies::MovieResponse;
use crate::AppState;
use roastingreels_common::{auth::AuthContext, errors::Result};

const MOVIES_PER_PAGE: u64 = 6;

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub search: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub viewer: Option<Viewer>,
    pub search: Option<String>,
    pub movies: Vec<MovieResponse>,
    pub page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub flashes: Vec<flash::Flash>,
}

/// Paged movie list, optionally narrowed by a title or IMDb id prefix
pub async fn index(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
    Query(query): Query<HomeQuery>,
) -> Result<(CookieJar, Json<HomePage>)> {
    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let page = page_number(query.page.as_deref());

    let result = state
        .store
        .search_movies(search.as_deref(), page, MOVIES_PER_PAGE)
        .await?;

    let (jar, flashes) = flash::take(jar);

    Ok((
        jar,
        Json(HomePage {
            viewer: auth.as_ref().map(Viewer::from),
            search,
            total_pages: result.total_pages(),
            total: result.total,
            page: result.page,
            movies: result.items.iter().map(MovieResponse::from).collect(),
            flashes,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_json, TestApp};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_home_pages_six_movies() {
        let app = TestApp::new().await;
        for i in 1..=8 {
            app.movie(&format!("Movie {}", i)).await;
        }

        let first = body_json(app.page("/", None).await).await;
        assert_eq!(first["movies"].as_array().unwrap().len(), 6);
        assert_eq!(first["total"], 8);
        assert_eq!(first["total_pages"], 2);

        let second = body_json(app.page("/?page=2", None).await).await;
        assert_eq!(second["movies"].as_array().unwrap().len(), 2);
        assert_eq!(second["page"], 2);
    }

    #[tokio::test]
    async fn test_home_search_is_prefix_and_case_insensitive() {
        let app = TestApp::new().await;
        app.movie("Heat").await;
        app.movie("Heathers").await;
        app.movie("The Heat").await;

        let response = app.page("/?search=HEAT", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let titles: Vec<&str> = body["movies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Heat"));
        assert!(titles.contains(&"Heathers"));
    }

    #[tokio::test]
    async fn test_home_shows_viewer() {
        let app = TestApp::new().await;
        let token = app.editor_token().await;

        let body = body_json(app.page("/", Some(&token)).await).await;
        assert_eq!(body["viewer"]["is_editor"], true);

        let anonymous = body_json(app.page("/", None).await).await;
        assert!(anonymous["viewer"].is_null());
    }
}
