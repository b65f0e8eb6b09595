//! Movie page: details, score, trailer and paged reviews

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use super::{flash, page_number, Viewer};
use crate::handlers::{movies::find_movie, reviews::ReviewResponse};
use crate::AppState;
use roastingreels_common::{
    auth::AuthContext,
    db::models::{average_score, Movie, NameList},
    errors::Result,
};

const REVIEWS_PER_PAGE: u64 = 5;

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieView {
    pub id: i32,
    pub title: String,
    pub imdb_id: Option<String>,
    pub overview: Option<String>,
    pub poster: Option<String>,
    pub running_time: Option<i32>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
}

impl From<Movie> for MovieView {
    fn from(movie: Movie) -> Self {
        let names = |list: Option<NameList>| list.map(|l| l.0).unwrap_or_default();
        Self {
            id: movie.id,
            title: movie.title,
            imdb_id: movie.imdb_id,
            overview: movie.overview,
            poster: movie.poster,
            running_time: movie.running_time,
            actors: names(movie.actors),
            directors: names(movie.directors),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoviePage {
    pub viewer: Option<Viewer>,
    pub movie: MovieView,
    /// Mean score over every review, not just this page
    pub average_score: Option<f64>,
    pub trailer_key: Option<String>,
    pub reviews: Vec<ReviewResponse>,
    pub page: u64,
    pub total_pages: u64,
    pub flashes: Vec<flash::Flash>,
}

pub async fn show(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    jar: CookieJar,
    Path(id): Path<i32>,
    Query(query): Query<DetailQuery>,
) -> Result<(CookieJar, Json<MoviePage>)> {
    let movie = find_movie(state.store.as_ref(), id).await?;
    let page = page_number(query.page.as_deref());

    let scores = state.store.review_scores(id).await?;
    let reviews = state.store.reviews_page(id, page, REVIEWS_PER_PAGE).await?;

    let trailer_key = match movie.imdb_id.as_deref().filter(|i| !i.is_empty()) {
        Some(provider_id) => state.metadata.trailer_key(provider_id).await,
        None => None,
    };

    let (jar, flashes) = flash::take(jar);

    Ok((
        jar,
        Json(MoviePage {
            viewer: auth.as_ref().map(Viewer::from),
            average_score: average_score(&scores),
            trailer_key,
            reviews: reviews.items.iter().map(ReviewResponse::from).collect(),
            page: reviews.page,
            total_pages: reviews.total_pages(),
            movie: MovieView::from(movie),
            flashes,
        }),
    ))
}
