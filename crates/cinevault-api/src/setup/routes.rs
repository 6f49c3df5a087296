//! Route surface and middleware stack

use crate::auth::{auth_middleware, require_admin, AuthState};
use crate::handlers;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::delete, routing::get, routing::post, routing::put, Router};
use cinevault_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the full router: public routes, authenticated routes, and an
/// admin sub-router gated by the role check on top of the auth layer.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router> {
    let auth_state = Arc::new(AuthState {
        codec: state.codec.clone(),
        users: state.users.clone(),
    });

    let public_routes = Router::new()
        .route("/register", post(handlers::account::register))
        .route("/login", post(handlers::account::login))
        .route("/liveness", get(handlers::health::liveness));

    let admin_routes = Router::new()
        .route("/admin/users", get(handlers::admin::list_users))
        .route("/admin/upload_movie", post(handlers::admin::upload_movie))
        .route(
            "/admin/download_movie/{id}",
            get(handlers::admin::download_movie),
        )
        .route(
            "/admin/delete_movie/{id}",
            delete(handlers::admin::delete_movie),
        )
        .route(
            "/admin/update_movie/{id}",
            put(handlers::admin::update_movie),
        )
        .layer(middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/movies", get(handlers::movies::list_movies))
        .route("/movies/{id}", get(handlers::movies::get_movie))
        .route("/streaming/get/{id}", get(handlers::streaming::stream_movie))
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let cors = build_cors_layer(config)?;

    let app = public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(config.max_upload_size_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes))
        .with_state(state);

    Ok(app)
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer> {
    // A wildcard entry means any origin; a list must not contain "*".
    if config.cors_origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let mut origins = Vec::with_capacity(config.cors_origins.len());
    for origin in &config.cors_origins {
        let value = HeaderValue::from_str(origin)
            .with_context(|| format!("Invalid CORS origin: {}", origin))?;
        origins.push(value);
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}
