//! Streaming pipeline
//!
//! Couples the movie catalog, the blob store, and the analytics sink. All
//! clients are injected at construction so the pipeline can be exercised
//! against the local backend and a memory sink in tests.

use cinevault_core::models::{AnalyticsEvent, EventKind, Movie};
use cinevault_core::AppError;
use cinevault_db::MovieRepository;
use cinevault_events::EventSink;
use cinevault_storage::{ByteStream, Storage};
use std::path::Path;
use std::sync::Arc;

const MOVIE_CONTENT_TYPE: &str = "video/mp4";

#[derive(Clone)]
pub struct MovieService {
    movies: MovieRepository,
    storage: Arc<dyn Storage>,
    events: Arc<dyn EventSink>,
}

/// Storage key for an uploaded movie: `{owner_id}/{filename}`. Not
/// content-addressed; a re-upload of the same filename by the same owner
/// overwrites the blob.
pub fn derive_key(owner_id: i64, filename: &str) -> String {
    format!("{}/{}", owner_id, filename)
}

/// Download filename derived from the movie title. Characters that would
/// break the Content-Disposition header are replaced.
pub fn attachment_filename(title: &str) -> String {
    let safe: String = title
        .chars()
        .map(|c| {
            if c == '"' || c == '\\' || c == '/' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{}.mp4", safe.trim())
}

impl MovieService {
    pub fn new(
        movies: MovieRepository,
        storage: Arc<dyn Storage>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            movies,
            storage,
            events,
        }
    }

    /// Upload a staged movie file and record its metadata.
    ///
    /// The metadata row is created only after the blob write is confirmed, so
    /// a storage failure leaves no catalog entry behind. Cleaning up the
    /// staging file is the caller's concern (temp-file RAII in the handler).
    pub async fn upload(
        &self,
        owner_id: i64,
        title: &str,
        description: Option<&str>,
        filename: &str,
        staged: &Path,
    ) -> Result<Movie, AppError> {
        let key = derive_key(owner_id, filename);

        let size = self
            .storage
            .put_file(&key, staged, MOVIE_CONTENT_TYPE)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let movie = self.movies.create_movie(title, description, &key).await?;

        tracing::info!(
            movie_id = movie.id,
            key = %key,
            size_bytes = size,
            "Movie uploaded"
        );

        Ok(movie)
    }

    /// Fetch movie metadata for the detail page, emitting a best-effort
    /// `video_visit` event.
    pub async fn visit(
        &self,
        movie_id: i64,
        user_id: i64,
        user_ip: &str,
    ) -> Result<Movie, AppError> {
        let movie = self.get(movie_id).await?;

        self.events
            .emit(&AnalyticsEvent::new(
                EventKind::VideoVisit,
                movie.id,
                movie.title.clone(),
                user_id,
                user_ip,
            ))
            .await;

        Ok(movie)
    }

    /// Open a movie for streaming, emitting a best-effort `video_streamed`
    /// event. A blob missing for existing metadata (orphaned record) and a
    /// transport failure both surface as a generic storage failure.
    pub async fn download(
        &self,
        movie_id: i64,
        user_id: i64,
        user_ip: &str,
    ) -> Result<(Movie, ByteStream), AppError> {
        let movie = self.get(movie_id).await?;

        let stream = self
            .storage
            .open_stream(&movie.storage_key)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.events
            .emit(&AnalyticsEvent::new(
                EventKind::VideoStreamed,
                movie.id,
                movie.title.clone(),
                user_id,
                user_ip,
            ))
            .await;

        Ok((movie, stream))
    }

    /// Delete a movie: blob first, then metadata. If the blob removal fails
    /// the metadata stays, so the record can be retried; the reverse order
    /// would strand an unreachable blob with no record pointing at it.
    pub async fn delete(&self, movie_id: i64) -> Result<(), AppError> {
        let movie = self.get(movie_id).await?;

        self.storage
            .delete(&movie.storage_key)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.movies.delete_movie(movie_id).await?;

        tracing::info!(movie_id = movie_id, key = %movie.storage_key, "Movie deleted");

        Ok(())
    }

    pub async fn update(
        &self,
        movie_id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Movie, AppError> {
        self.movies
            .update_movie(movie_id, title, description)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
    }

    pub async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Movie>, AppError> {
        self.movies.list_movies(offset, limit).await
    }

    pub async fn get(&self, movie_id: i64) -> Result<Movie, AppError> {
        self.movies
            .get_movie(movie_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key() {
        assert_eq!(derive_key(7, "night_train.mp4"), "7/night_train.mp4");
    }

    #[test]
    fn test_attachment_filename_plain() {
        assert_eq!(attachment_filename("Night Train"), "Night Train.mp4");
    }

    #[test]
    fn test_attachment_filename_strips_header_breakers() {
        assert_eq!(attachment_filename("a\"b\\c/d"), "a_b_c_d.mp4");
        assert_eq!(attachment_filename("tab\there"), "tab_here.mp4");
        assert_eq!(attachment_filename("  padded  "), "padded.mp4");
    }
}
