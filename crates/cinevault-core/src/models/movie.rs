//! Movie catalog entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Movie metadata row. `storage_key` points at the blob in the object store
/// and is immutable once set.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

/// Movie representation returned by the API. The storage key is internal.
#[derive(Debug, Clone, Serialize)]
pub struct MovieResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            created_at: movie.created_at,
        }
    }
}

/// Metadata update payload. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMovieRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
}
