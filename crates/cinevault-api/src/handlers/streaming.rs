//! Movie byte streaming

use crate::auth::{ClientIp, Credential};
use crate::error::HttpAppError;
use crate::services::movies::attachment_filename;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use cinevault_core::AppError;
use futures::StreamExt;
use std::sync::Arc;

/// GET /streaming/get/{id}
///
/// Streams the blob in chunks without buffering it in memory. The response
/// carries a Content-Disposition filename derived from the movie title, and
/// opening the stream emits a best-effort `video_streamed` event.
pub async fn stream_movie(
    State(state): State<Arc<AppState>>,
    credential: Credential,
    ClientIp(client_ip): ClientIp,
    Path(id): Path<i64>,
) -> Result<Response, HttpAppError> {
    let (movie, stream) = state
        .movie_service
        .download(id, credential.user_id, &client_ip)
        .await?;

    let body_stream = stream.map(|result| result.map_err(std::io::Error::other));

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", attachment_filename(&movie.title)),
        )
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
