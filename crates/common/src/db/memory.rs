//! In-memory `Store` for tests and local runs without PostgreSQL
//!
//! Mirrors the table constraints the migrations declare: unique movie
//! titles, unique user emails, and cascading review deletes.

use crate::db::models::{Movie, Review, User};
use crate::db::store::{
    AuthoredReview, MovieChanges, NewMovie, NewReview, NewUser, Page, ReviewChanges, Store,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    movies: BTreeMap<i32, Movie>,
    reviews: BTreeMap<i32, Review>,
    users: BTreeMap<i32, User>,
    next_movie_id: i32,
    next_review_id: i32,
    next_user_id: i32,
}

impl Tables {
    fn title_taken(&self, title: &str, except: Option<i32>) -> bool {
        self.movies
            .values()
            .any(|m| m.title == title && Some(m.id) != except)
    }

    fn insert_movie(&mut self, movie: NewMovie) -> Result<Movie> {
        if self.title_taken(&movie.title, None) {
            return Err(duplicate("movies.title", &movie.title));
        }

        self.next_movie_id += 1;
        let model = Movie {
            id: self.next_movie_id,
            title: movie.title,
            imdb_id: movie.imdb_id,
            overview: movie.overview,
            poster: movie.poster,
            running_time: movie.running_time,
            actors: movie.actors,
            directors: movie.directors,
        };
        self.movies.insert(model.id, model.clone());
        Ok(model)
    }

    fn authored(&self, review: &Review) -> AuthoredReview {
        AuthoredReview {
            review: review.clone(),
            author: self.users.get(&review.user_id).cloned(),
        }
    }
}

fn duplicate(key: &str, value: &str) -> AppError {
    AppError::Duplicate {
        message: format!("{} already holds {:?}", key, value),
    }
}

fn paginate<T>(rows: Vec<T>, page: u64, per_page: u64) -> Page<T> {
    let total = rows.len() as u64;
    let skip = page.saturating_sub(1).saturating_mul(per_page) as usize;
    let items = rows.into_iter().skip(skip).take(per_page as usize).collect();

    Page {
        items,
        page,
        per_page,
        total,
    }
}

/// Store backed by process memory
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>> {
        Ok(self.tables.read().await.movies.values().cloned().collect())
    }

    async fn find_movie(&self, id: i32) -> Result<Option<Movie>> {
        Ok(self.tables.read().await.movies.get(&id).cloned())
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.values().find(|m| m.title == title).cloned())
    }

    async fn search_movies(
        &self,
        term: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Movie>> {
        let term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let tables = self.tables.read().await;
        let rows: Vec<Movie> = tables
            .movies
            .values()
            .filter(|movie| match &term {
                None => true,
                Some(term) => {
                    movie.title.to_lowercase().starts_with(term.as_str())
                        || movie
                            .imdb_id
                            .as_deref()
                            .is_some_and(|id| id.to_lowercase().starts_with(term.as_str()))
                }
            })
            .cloned()
            .collect();

        Ok(paginate(rows, page, per_page))
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<Movie> {
        self.tables.write().await.insert_movie(movie)
    }

    async fn create_movies(&self, movies: Vec<NewMovie>) -> Result<Vec<Movie>> {
        let mut tables = self.tables.write().await;

        // all or nothing: reject the batch before touching the table
        let mut seen: Vec<&str> = Vec::with_capacity(movies.len());
        for movie in &movies {
            if tables.title_taken(&movie.title, None) || seen.contains(&movie.title.as_str()) {
                return Err(duplicate("movies.title", &movie.title));
            }
            seen.push(&movie.title);
        }

        movies
            .into_iter()
            .map(|movie| tables.insert_movie(movie))
            .collect()
    }

    async fn update_movie(&self, id: i32, changes: MovieChanges) -> Result<Option<Movie>> {
        let mut tables = self.tables.write().await;

        if let Some(title) = &changes.title {
            if tables.title_taken(title, Some(id)) {
                return Err(duplicate("movies.title", title));
            }
        }

        let Some(movie) = tables.movies.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(movie);
        Ok(Some(movie.clone()))
    }

    async fn delete_movie(&self, id: i32) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.movies.remove(&id).is_none() {
            return Ok(false);
        }
        tables.reviews.retain(|_, review| review.movie_id != id);
        Ok(true)
    }

    async fn reviews_for_movie(&self, movie_id: i32) -> Result<Vec<AuthoredReview>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|r| r.movie_id == movie_id)
            .map(|r| tables.authored(r))
            .collect())
    }

    async fn reviews_page(
        &self,
        movie_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<Page<AuthoredReview>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<AuthoredReview> = tables
            .reviews
            .values()
            .filter(|r| r.movie_id == movie_id)
            .map(|r| tables.authored(r))
            .collect();

        // newest first
        rows.sort_by(|a, b| {
            b.review
                .date
                .cmp(&a.review.date)
                .then(b.review.id.cmp(&a.review.id))
        });

        Ok(paginate(rows, page, per_page))
    }

    async fn find_review(&self, id: i32) -> Result<Option<AuthoredReview>> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.get(&id).map(|r| tables.authored(r)))
    }

    async fn create_review(&self, review: NewReview) -> Result<Review> {
        let mut tables = self.tables.write().await;

        if !tables.movies.contains_key(&review.movie_id) {
            return Err(AppError::Internal {
                message: format!("reviews.movie_id references missing movie {}", review.movie_id),
            });
        }
        if !tables.users.contains_key(&review.user_id) {
            return Err(AppError::Internal {
                message: format!("reviews.user_id references missing user {}", review.user_id),
            });
        }

        tables.next_review_id += 1;
        let model = Review {
            id: tables.next_review_id,
            user_id: review.user_id,
            movie_id: review.movie_id,
            review_title: review.review_title,
            review_text: review.review_text,
            score: review.score,
            date: review.date,
        };
        tables.reviews.insert(model.id, model.clone());
        Ok(model)
    }

    async fn update_review(&self, id: i32, changes: ReviewChanges) -> Result<Option<Review>> {
        let mut tables = self.tables.write().await;
        let Some(review) = tables.reviews.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(review);
        Ok(Some(review.clone()))
    }

    async fn delete_review(&self, id: i32) -> Result<bool> {
        Ok(self.tables.write().await.reviews.remove(&id).is_some())
    }

    async fn review_scores(&self, movie_id: i32) -> Result<Vec<i32>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|r| r.movie_id == movie_id)
            .map(|r| r.score)
            .collect())
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(duplicate("users.email", &user.email));
        }

        tables.next_user_id += 1;
        let model = User {
            id: tables.next_user_id,
            email: user.email,
            password: user.password_hash,
            name: user.name,
            roles: user.roles,
        };
        tables.users.insert(model.id, model.clone());
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;
    use crate::db::models::RoleSet;
    use chrono::NaiveDate;

    fn movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            ..Default::default()
        }
    }

    async fn seeded_user(store: &InMemoryStore) -> User {
        store
            .create_user(NewUser {
                email: "critic@example.com".to_string(),
                name: "Critic".to_string(),
                password_hash: "hash".to_string(),
                roles: RoleSet::default(),
            })
            .await
            .unwrap()
    }

    fn review(movie_id: i32, user_id: i32, score: i32, day: u32) -> NewReview {
        NewReview {
            movie_id,
            user_id,
            review_title: format!("Take {}", score),
            review_text: "Worth a watch".to_string(),
            score,
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_title_is_rejected() {
        let store = InMemoryStore::new();
        store.create_movie(movie("Heat")).await.unwrap();

        let err = assert_err!(store.create_movie(movie("Heat")).await);
        assert!(matches!(err, AppError::Duplicate { .. }));
        assert_eq!(store.list_movies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let store = InMemoryStore::new();
        store.create_movie(movie("Heat")).await.unwrap();

        let result = store
            .create_movies(vec![movie("Ronin"), movie("Heat")])
            .await;
        assert_err!(result);
        assert!(store.find_movie_by_title("Ronin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_movie_cascades_to_reviews() {
        let store = InMemoryStore::new();
        let user = seeded_user(&store).await;
        let heat = store.create_movie(movie("Heat")).await.unwrap();
        let review = store.create_review(review(heat.id, user.id, 4, 1)).await.unwrap();

        assert!(store.delete_movie(heat.id).await.unwrap());
        assert!(store.find_review(review.id).await.unwrap().is_none());
        assert!(!store.delete_movie(heat.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_prefix_on_title_or_imdb_id() {
        let store = InMemoryStore::new();
        store.create_movie(movie("The Matrix")).await.unwrap();
        store
            .create_movie(NewMovie {
                title: "Alien".to_string(),
                imdb_id: Some("tt0078748".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store.create_movie(movie("Matrix Reloaded")).await.unwrap();

        let page = store.search_movies(Some("the m"), 1, 6).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "The Matrix");

        let page = store.search_movies(Some("TT007"), 1, 6).await.unwrap();
        assert_eq!(page.items[0].title, "Alien");

        let page = store.search_movies(None, 1, 2).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let store = InMemoryStore::new();
        store.create_movie(movie("100% Wolf")).await.unwrap();
        store.create_movie(movie("1000 Ways")).await.unwrap();

        let page = store.search_movies(Some("100%"), 1, 6).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "100% Wolf");

        let page = store.search_movies(Some("1_0"), 1, 6).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_reviews_page_is_newest_first_with_authors() {
        let store = InMemoryStore::new();
        let user = seeded_user(&store).await;
        let heat = store.create_movie(movie("Heat")).await.unwrap();
        for (score, day) in [(5, 1), (3, 3), (4, 2)] {
            store.create_review(review(heat.id, user.id, score, day)).await.unwrap();
        }

        let page = store.reviews_page(heat.id, 1, 2).await.unwrap();
        let scores: Vec<i32> = page.items.iter().map(|r| r.review.score).collect();
        assert_eq!(scores, vec![3, 4]);
        assert_eq!(page.items[0].author.as_ref().unwrap().name, "Critic");

        let mut all = store.review_scores(heat.id).await.unwrap();
        all.sort();
        assert_eq!(all, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        seeded_user(&store).await;

        let err = store
            .create_user(NewUser {
                email: "critic@example.com".to_string(),
                name: "Other".to_string(),
                password_hash: "hash".to_string(),
                roles: RoleSet::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }
}
