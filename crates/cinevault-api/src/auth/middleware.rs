//! Access control guard chain
//!
//! `auth_middleware` verifies the bearer credential and re-checks the account's
//! disabled flag against the database on every request; role checks read the
//! role set embedded in the credential, so revoked roles stay effective until
//! the token expires. `require_admin` layers the role check on admin routes.

use crate::auth::jwt::{Credential, TokenCodec};
use crate::error::HttpAppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use cinevault_core::models::Role;
use cinevault_core::AppError;
use cinevault_db::UserRepository;
use std::sync::Arc;

/// Best-effort client address, for analytics events.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

#[derive(Clone)]
pub struct AuthState {
    pub codec: TokenCodec,
    pub users: UserRepository,
}

/// First value of X-Forwarded-For when present, otherwise the socket address.
fn extract_client_ip(headers: &HeaderMap, socket_addr: Option<&std::net::SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| socket_addr.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0);
    let client_ip = extract_client_ip(request.headers(), socket_addr.as_ref());

    let token = match bearer_token(request.headers()) {
        Some(token) => token,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing or malformed authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let credential = match auth_state.codec.verify(token) {
        Ok(credential) => credential,
        Err(e) => return HttpAppError(e).into_response(),
    };

    // Disabled is checked live so that locking an account takes effect
    // immediately, without waiting for outstanding tokens to expire.
    let user = match auth_state.users.find_by_id(credential.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpAppError(AppError::Unauthorized(
                "Could not validate credentials".to_string(),
            ))
            .into_response();
        }
        Err(e) => return HttpAppError(e).into_response(),
    };

    if user.disabled {
        tracing::debug!(user_id = user.id, "Rejected request from disabled account");
        return HttpAppError(AppError::Forbidden("Account is disabled".to_string()))
            .into_response();
    }

    request.extensions_mut().insert(ClientIp(client_ip));
    request.extensions_mut().insert(credential);
    next.run(request).await
}

/// Role gate for admin routes. Runs after `auth_middleware`, reading the
/// credential it inserted.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let has_admin = request
        .extensions()
        .get::<Credential>()
        .map(|c| c.has_role(Role::Admin))
        .unwrap_or(false);

    if !has_admin {
        return HttpAppError(AppError::Forbidden("Admin role required".to_string()))
            .into_response();
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Credential>().cloned().ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "Could not validate credentials".to_string(),
            ))
        })
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ClientIp>()
            .cloned()
            .unwrap_or_else(|| ClientIp("unknown".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.remove("Authorization");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.1, 172.16.0.1"),
        );
        let socket: std::net::SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(extract_client_ip(&headers, Some(&socket)), "10.0.0.1");
    }

    #[test]
    fn test_client_ip_falls_back_to_socket() {
        let headers = HeaderMap::new();
        let socket: std::net::SocketAddr = "192.168.1.5:1234".parse().unwrap();
        assert_eq!(extract_client_ip(&headers, Some(&socket)), "192.168.1.5");
        assert_eq!(extract_client_ip(&headers, None), "unknown");
    }
}
