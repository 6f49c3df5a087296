//! Application setup and initialization
//!
//! All startup logic lives here so main.rs stays a thin entry point.

pub mod database;
pub mod events;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::TokenCodec;
use crate::services::MovieService;
use crate::state::AppState;
use anyhow::{Context, Result};
use cinevault_core::Config;
use cinevault_db::{MovieRepository, UserRepository};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    // Bucket ensure is part of startup: a store we cannot write to is fatal.
    let storage = storage::setup_storage(&config).await?;

    let events = events::setup_events(&config)?;

    let users = UserRepository::new(pool.clone());
    let movies = MovieRepository::new(pool.clone());
    let movie_service = MovieService::new(movies.clone(), storage.clone(), events.clone());
    let codec = TokenCodec::new(&config.secret_key, config.token_ttl_minutes);

    let state = Arc::new(AppState {
        config: config.clone(),
        db_pool: pool,
        users,
        movies,
        movie_service,
        storage,
        events,
        codec,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
