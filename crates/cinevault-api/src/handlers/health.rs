//! Liveness probe

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct LivenessResponse {
    status: String,
    problems: Vec<String>,
}

/// GET /liveness
///
/// Unauthenticated. Reports degradations in the database and the blob store
/// without failing the probe body; the status code flips to 503 only when a
/// dependency is unreachable.
pub async fn liveness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut problems = Vec::new();

    match tokio::time::timeout(CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(&state.db_pool))
        .await
    {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database liveness check failed");
            problems.push("database unreachable".to_string());
        }
        Err(_) => {
            tracing::error!("Database liveness check timed out");
            problems.push("database timeout".to_string());
        }
    }

    // Lightweight connectivity check with a key that never exists.
    match tokio::time::timeout(
        CHECK_TIMEOUT,
        state.storage.exists("liveness/non-existent-key"),
    )
    .await
    {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage liveness check failed");
            problems.push("storage unreachable".to_string());
        }
        Err(_) => {
            tracing::warn!("Storage liveness check timed out");
            problems.push("storage timeout".to_string());
        }
    }

    let status_code = if problems.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status = if problems.is_empty() { "ok" } else { "degraded" };

    (
        status_code,
        Json(LivenessResponse {
            status: status.to_string(),
            problems,
        }),
    )
}
