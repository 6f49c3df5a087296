//! Authenticated catalog browsing

use crate::auth::{ClientIp, Credential};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use cinevault_core::models::MovieResponse;
use cinevault_db::movies::clamp_page;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /movies/{id}
///
/// Emits a best-effort `video_visit` event alongside the metadata fetch.
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    credential: Credential,
    ClientIp(client_ip): ClientIp,
    Path(id): Path<i64>,
) -> Result<Json<MovieResponse>, HttpAppError> {
    let movie = state
        .movie_service
        .visit(id, credential.user_id, &client_ip)
        .await?;

    Ok(Json(MovieResponse::from(movie)))
}

/// GET /movies?offset=&limit=
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    _credential: Credential,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MovieResponse>>, HttpAppError> {
    let (offset, limit) = clamp_page(query.offset, query.limit);
    let movies = state.movie_service.list(offset, limit).await?;

    Ok(Json(movies.into_iter().map(MovieResponse::from).collect()))
}
