use cinevault_core::{models::Movie, AppError};
use sqlx::{PgPool, Postgres};

/// Hard cap on page size for movie listings.
pub const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Clamp pagination parameters to sane bounds: offset is non-negative and
/// limit is between 1 and `MAX_PAGE_SIZE`.
pub fn clamp_page(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let offset = offset.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (offset, limit)
}

/// Repository for movie catalog metadata
#[derive(Clone)]
pub struct MovieRepository {
    pool: PgPool,
}

impl MovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a movie record. Called only after the blob write is confirmed.
    #[tracing::instrument(skip(self), fields(db.table = "movies", db.operation = "insert"))]
    pub async fn create_movie(
        &self,
        title: &str,
        description: Option<&str>,
        storage_key: &str,
    ) -> Result<Movie, AppError> {
        let movie = sqlx::query_as::<Postgres, Movie>(
            r#"
            INSERT INTO movies (title, description, storage_key)
            VALUES ($1, $2, $3)
            ON CONFLICT (storage_key) DO UPDATE
                SET title = EXCLUDED.title, description = EXCLUDED.description
            RETURNING id, title, description, storage_key, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(storage_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(movie)
    }

    #[tracing::instrument(skip(self), fields(db.table = "movies", db.operation = "select", db.record_id = %id))]
    pub async fn get_movie(&self, id: i64) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<Postgres, Movie>(
            "SELECT id, title, description, storage_key, created_at FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    #[tracing::instrument(skip(self), fields(db.table = "movies", db.operation = "select"))]
    pub async fn list_movies(&self, offset: i64, limit: i64) -> Result<Vec<Movie>, AppError> {
        let (offset, limit) = clamp_page(Some(offset), Some(limit));

        let movies = sqlx::query_as::<Postgres, Movie>(
            r#"
            SELECT id, title, description, storage_key, created_at
            FROM movies ORDER BY id OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    /// Update title and/or description. The storage key is immutable.
    #[tracing::instrument(skip(self), fields(db.table = "movies", db.operation = "update", db.record_id = %id))]
    pub async fn update_movie(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<Postgres, Movie>(
            r#"
            UPDATE movies
            SET title = COALESCE($2, title),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, title, description, storage_key, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    /// Delete a movie record. Returns whether a row was removed.
    #[tracing::instrument(skip(self), fields(db.table = "movies", db.operation = "delete", db.record_id = %id))]
    pub async fn delete_movie(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
