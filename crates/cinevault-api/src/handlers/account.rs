//! Registration and login

use crate::auth::password::{hash_password, verify_password};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Form, Json};
use cinevault_core::models::{RegisterRequest, Role};
use cinevault_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /register
///
/// Creates an account with the default `user` role and returns a bearer
/// token. A duplicate username, including one lost to a concurrent insert,
/// returns 409.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .users
        .create_user(&request.username, request.full_name.as_deref(), &password_hash)
        .await?;

    state.users.assign_role(user.id, Role::User).await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let token = state.codec.issue(user.id, &user.username, &[Role::User])?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// POST /login
///
/// Form-encoded credential exchange. Wrong username and wrong password are
/// indistinguishable; a disabled account is rejected after the password
/// check so the response does not reveal whether the password was right.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, HttpAppError> {
    let user = state
        .users
        .find_by_username(&form.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Incorrect username or password".to_string()))?;

    if !verify_password(&form.password, &user.password_hash) {
        return Err(
            AppError::Unauthorized("Incorrect username or password".to_string()).into(),
        );
    }

    if user.disabled {
        return Err(AppError::Forbidden("Account is disabled".to_string()).into());
    }

    let roles = state.users.roles_of(user.id).await?;
    let token = state.codec.issue(user.id, &user.username, &roles)?;

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(TokenResponse::bearer(token)))
}
