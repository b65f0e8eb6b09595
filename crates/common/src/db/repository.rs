//! Repository pattern for database operations
//!
//! SeaORM implementation of `Store` over PostgreSQL.

use crate::db::models::*;
use crate::db::store::{
    AuthoredReview, MovieChanges, NewMovie, NewReview, NewUser, Page, ReviewChanges, Store,
};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }
}

/// Lowercased LIKE prefix pattern; `%`, `_` and `\` in the term are escaped
/// so they match literally, as they do in the in-memory store
fn prefix_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 1);
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Unique-index violations surface as `Duplicate`, everything else as a database error
fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => AppError::Duplicate { message },
        _ => err.into(),
    }
}

fn movie_active_model(movie: NewMovie) -> MovieActiveModel {
    MovieActiveModel {
        id: NotSet,
        title: Set(movie.title),
        imdb_id: Set(movie.imdb_id),
        overview: Set(movie.overview),
        poster: Set(movie.poster),
        running_time: Set(movie.running_time),
        actors: Set(movie.actors),
        directors: Set(movie.directors),
    }
}

fn authored((review, author): (Review, Option<User>)) -> AuthoredReview {
    AuthoredReview { review, author }
}

#[async_trait]
impl Store for Repository {
    // ========================================================================
    // Health Check
    // ========================================================================

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Movie Operations
    // ========================================================================

    async fn list_movies(&self) -> Result<Vec<Movie>> {
        MovieEntity::find()
            .order_by_asc(MovieColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_movie(&self, id: i32) -> Result<Option<Movie>> {
        MovieEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>> {
        MovieEntity::find()
            .filter(MovieColumn::Title.eq(title))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn search_movies(
        &self,
        term: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Movie>> {
        let mut query = MovieEntity::find().order_by_asc(MovieColumn::Id);

        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = LikeExpr::new(prefix_pattern(term)).escape('\\');
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(MovieColumn::Title))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(MovieColumn::ImdbId))).like(pattern)),
            );
        }

        let paginator = query.paginate(self.conn(), per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(Page {
            items,
            page,
            per_page,
            total,
        })
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<Movie> {
        movie_active_model(movie)
            .insert(self.conn())
            .await
            .map_err(write_error)
    }

    async fn create_movies(&self, movies: Vec<NewMovie>) -> Result<Vec<Movie>> {
        let txn = self.conn().begin().await?;
        let mut created = Vec::with_capacity(movies.len());

        for movie in movies {
            created.push(movie_active_model(movie).insert(&txn).await.map_err(write_error)?);
        }

        txn.commit().await?;
        Ok(created)
    }

    async fn update_movie(&self, id: i32, changes: MovieChanges) -> Result<Option<Movie>> {
        let Some(movie) = MovieEntity::find_by_id(id).one(self.conn()).await? else {
            return Ok(None);
        };

        if changes.is_empty() {
            return Ok(Some(movie));
        }

        let mut active: MovieActiveModel = movie.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(imdb_id) = changes.imdb_id {
            active.imdb_id = Set(imdb_id);
        }
        if let Some(overview) = changes.overview {
            active.overview = Set(overview);
        }
        if let Some(poster) = changes.poster {
            active.poster = Set(poster);
        }
        if let Some(running_time) = changes.running_time {
            active.running_time = Set(running_time);
        }
        if let Some(actors) = changes.actors {
            active.actors = Set(actors);
        }
        if let Some(directors) = changes.directors {
            active.directors = Set(directors);
        }

        active.update(self.conn()).await.map(Some).map_err(write_error)
    }

    async fn delete_movie(&self, id: i32) -> Result<bool> {
        // reviews go with it through ON DELETE CASCADE
        let result = MovieEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Review Operations
    // ========================================================================

    async fn reviews_for_movie(&self, movie_id: i32) -> Result<Vec<AuthoredReview>> {
        let rows = ReviewEntity::find()
            .filter(ReviewColumn::MovieId.eq(movie_id))
            .order_by_asc(ReviewColumn::Id)
            .find_also_related(UserEntity)
            .all(self.conn())
            .await?;

        Ok(rows.into_iter().map(authored).collect())
    }

    async fn reviews_page(
        &self,
        movie_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<Page<AuthoredReview>> {
        let paginator = ReviewEntity::find()
            .filter(ReviewColumn::MovieId.eq(movie_id))
            .order_by_desc(ReviewColumn::Date)
            .order_by_desc(ReviewColumn::Id)
            .find_also_related(UserEntity)
            .paginate(self.conn(), per_page);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(Page {
            items: rows.into_iter().map(authored).collect(),
            page,
            per_page,
            total,
        })
    }

    async fn find_review(&self, id: i32) -> Result<Option<AuthoredReview>> {
        let row = ReviewEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(self.conn())
            .await?;

        Ok(row.map(authored))
    }

    async fn create_review(&self, review: NewReview) -> Result<Review> {
        ReviewActiveModel {
            id: NotSet,
            user_id: Set(review.user_id),
            movie_id: Set(review.movie_id),
            review_title: Set(review.review_title),
            review_text: Set(review.review_text),
            score: Set(review.score),
            date: Set(review.date),
        }
        .insert(self.conn())
        .await
        .map_err(write_error)
    }

    async fn update_review(&self, id: i32, changes: ReviewChanges) -> Result<Option<Review>> {
        let Some(review) = ReviewEntity::find_by_id(id).one(self.conn()).await? else {
            return Ok(None);
        };

        if changes == ReviewChanges::default() {
            return Ok(Some(review));
        }

        let mut active: ReviewActiveModel = review.into();
        if let Some(review_title) = changes.review_title {
            active.review_title = Set(review_title);
        }
        if let Some(review_text) = changes.review_text {
            active.review_text = Set(review_text);
        }
        if let Some(score) = changes.score {
            active.score = Set(score);
        }

        active.update(self.conn()).await.map(Some).map_err(write_error)
    }

    async fn delete_review(&self, id: i32) -> Result<bool> {
        let result = ReviewEntity::delete_by_id(id).exec(self.conn()).await?;
        Ok(result.rows_affected > 0)
    }

    async fn review_scores(&self, movie_id: i32) -> Result<Vec<i32>> {
        ReviewEntity::find()
            .select_only()
            .column(ReviewColumn::Score)
            .filter(ReviewColumn::MovieId.eq(movie_id))
            .into_tuple::<i32>()
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    async fn find_user(&self, id: i32) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        UserActiveModel {
            id: NotSet,
            email: Set(user.email),
            password: Set(user.password_hash),
            name: Set(user.name),
            roles: Set(user.roles),
        }
        .insert(self.conn())
        .await
        .map_err(write_error)
    }
}
