//! Shared application state

use crate::auth::TokenCodec;
use crate::services::MovieService;
use cinevault_core::Config;
use cinevault_db::{MovieRepository, UserRepository};
use cinevault_events::EventSink;
use cinevault_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Process-wide handles, constructed once at startup and injected everywhere.
pub struct AppState {
    pub config: Config,
    pub db_pool: PgPool,
    pub users: UserRepository,
    pub movies: MovieRepository,
    pub movie_service: MovieService,
    pub storage: Arc<dyn Storage>,
    pub events: Arc<dyn EventSink>,
    pub codec: TokenCodec,
}
