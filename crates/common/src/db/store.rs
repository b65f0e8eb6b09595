//! Persistence seam
//!
//! Handlers and services talk to `Store`; `Repository` backs it with
//! PostgreSQL and `InMemoryStore` with process memory.

use crate::db::models::{Movie, NameList, Review, RoleSet, User};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Fields for a movie about to be inserted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub imdb_id: Option<String>,
    pub overview: Option<String>,
    pub poster: Option<String>,
    pub running_time: Option<i32>,
    pub actors: Option<NameList>,
    pub directors: Option<NameList>,
}

/// Partial movie update
///
/// Outer `None` leaves a field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub imdb_id: Option<Option<String>>,
    pub overview: Option<Option<String>>,
    pub poster: Option<Option<String>>,
    pub running_time: Option<Option<i32>>,
    pub actors: Option<Option<NameList>>,
    pub directors: Option<Option<NameList>>,
}

impl MovieChanges {
    pub fn is_empty(&self) -> bool {
        *self == MovieChanges::default()
    }

    /// Apply the changes to an in-memory model
    pub fn apply_to(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(imdb_id) = self.imdb_id {
            movie.imdb_id = imdb_id;
        }
        if let Some(overview) = self.overview {
            movie.overview = overview;
        }
        if let Some(poster) = self.poster {
            movie.poster = poster;
        }
        if let Some(running_time) = self.running_time {
            movie.running_time = running_time;
        }
        if let Some(actors) = self.actors {
            movie.actors = actors;
        }
        if let Some(directors) = self.directors {
            movie.directors = directors;
        }
    }
}

/// Fields for a review about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub movie_id: i32,
    pub user_id: i32,
    pub review_title: String,
    pub review_text: String,
    pub score: i32,
    pub date: NaiveDate,
}

/// Partial review update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewChanges {
    pub review_title: Option<String>,
    pub review_text: Option<String>,
    pub score: Option<i32>,
}

impl ReviewChanges {
    pub fn apply_to(self, review: &mut Review) {
        if let Some(review_title) = self.review_title {
            review.review_title = review_title;
        }
        if let Some(review_text) = self.review_text {
            review.review_text = review_text;
        }
        if let Some(score) = self.score {
            review.score = score;
        }
    }
}

/// Fields for a user about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

/// Review joined with its author
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredReview {
    pub review: Review,
    pub author: Option<User>,
}

/// One page of a larger result set; `page` is 1-based
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

/// Data access used by the HTTP layer and the sync service
#[async_trait]
pub trait Store: Send + Sync {
    /// Check connectivity
    async fn ping(&self) -> Result<()>;

    // Movies

    /// All movies ordered by id
    async fn list_movies(&self) -> Result<Vec<Movie>>;

    async fn find_movie(&self, id: i32) -> Result<Option<Movie>>;

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>>;

    /// Page of movies, optionally filtered by a case-insensitive prefix
    /// on title or imdb id
    async fn search_movies(
        &self,
        term: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Movie>>;

    async fn create_movie(&self, movie: NewMovie) -> Result<Movie>;

    /// Insert all movies or none
    async fn create_movies(&self, movies: Vec<NewMovie>) -> Result<Vec<Movie>>;

    /// `None` when the movie does not exist
    async fn update_movie(&self, id: i32, changes: MovieChanges) -> Result<Option<Movie>>;

    /// Deletes the movie and its reviews; `false` when it did not exist
    async fn delete_movie(&self, id: i32) -> Result<bool>;

    // Reviews

    /// All reviews of a movie ordered by id, with authors
    async fn reviews_for_movie(&self, movie_id: i32) -> Result<Vec<AuthoredReview>>;

    /// Page of a movie's reviews, newest first
    async fn reviews_page(
        &self,
        movie_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<Page<AuthoredReview>>;

    async fn find_review(&self, id: i32) -> Result<Option<AuthoredReview>>;

    async fn create_review(&self, review: NewReview) -> Result<Review>;

    async fn update_review(&self, id: i32, changes: ReviewChanges) -> Result<Option<Review>>;

    async fn delete_review(&self, id: i32) -> Result<bool>;

    /// Scores of every review of a movie
    async fn review_scores(&self, movie_id: i32) -> Result<Vec<i32>>;

    // Users

    async fn find_user(&self, id: i32) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create_user(&self, user: NewUser) -> Result<User>;
}
