//! Admin-only catalog management

use crate::auth::Credential;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use cinevault_core::models::{MovieResponse, UpdateMovieRequest, UserResponse};
use cinevault_core::AppError;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use validator::Validate;

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, HttpAppError> {
    let users = state.users.list_users().await?;

    let mut responses = Vec::with_capacity(users.len());
    for user in &users {
        let roles = state.users.roles_of(user.id).await?;
        responses.push(UserResponse::from_user(user, roles));
    }

    Ok(Json(responses))
}

/// POST /admin/upload_movie (multipart)
///
/// Expects `title`, optional `description`, and a `file` part. The file is
/// staged to a temp file before the blob write so peak memory stays bounded
/// regardless of upload size; the temp file is removed on every exit path.
pub async fn upload_movie(
    State(state): State<Arc<AppState>>,
    credential: Credential,
    mut multipart: Multipart,
) -> Result<Json<MovieResponse>, HttpAppError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut staged: Option<tempfile::NamedTempFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("title") => {
                title = Some(read_text_field(field).await?);
            }
            Some("description") => {
                description = Some(read_text_field(field).await?);
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .map(sanitize_filename)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        AppError::InvalidInput("File part is missing a filename".to_string())
                    })?;

                let tmp = tempfile::NamedTempFile::new()
                    .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;
                let mut out = tokio::fs::File::create(tmp.path())
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;

                while let Some(chunk) = field.chunk().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read upload: {}", e))
                })? {
                    out.write_all(&chunk)
                        .await
                        .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;
                }
                out.flush()
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))?;

                filename = Some(name);
                staged = Some(tmp);
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| AppError::InvalidInput("Missing 'title' field".to_string()))?;
    let filename =
        filename.ok_or_else(|| AppError::InvalidInput("Missing 'file' field".to_string()))?;
    let staged =
        staged.ok_or_else(|| AppError::InvalidInput("Missing 'file' field".to_string()))?;

    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()).into());
    }

    // The temp file is deleted when `staged` drops, whether the blob write
    // succeeds or fails.
    let movie = state
        .movie_service
        .upload(
            credential.user_id,
            title.trim(),
            description.as_deref(),
            &filename,
            staged.path(),
        )
        .await?;

    Ok(Json(MovieResponse::from(movie)))
}

/// GET /admin/download_movie/{id}
pub async fn download_movie(
    state: State<Arc<AppState>>,
    credential: Credential,
    client_ip: crate::auth::ClientIp,
    id: Path<i64>,
) -> Result<axum::response::Response, HttpAppError> {
    crate::handlers::streaming::stream_movie(state, credential, client_ip, id).await
}

/// DELETE /admin/delete_movie/{id}
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpAppError> {
    state.movie_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /admin/update_movie/{id}
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateMovieRequest>,
) -> Result<Json<MovieResponse>, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let movie = state
        .movie_service
        .update(id, request.title.as_deref(), request.description.as_deref())
        .await?;

    Ok(Json(MovieResponse::from(movie)))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart field: {}", e)))
}

/// Keep only the final path component and drop separator characters, so a
/// hostile filename cannot steer the derived storage key.
fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    base.chars()
        .filter(|c| !c.is_control() && *c != '/' && *c != '\\')
        .collect::<String>()
        .replace("..", "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_plain() {
        assert_eq!(sanitize_filename("night_train.mp4"), "night_train.mp4");
    }

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir/inner.mp4"), "inner.mp4");
        assert_eq!(sanitize_filename("c:\\videos\\clip.mp4"), "clip.mp4");
    }

    #[test]
    fn test_sanitize_filename_neutralizes_dotdot() {
        assert_eq!(sanitize_filename("a..b.mp4"), "a_b.mp4");
    }
}
