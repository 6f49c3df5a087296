mod auth;
mod error;
mod handlers;
mod services;
mod setup;
mod state;
mod telemetry;

use anyhow::Result;
use cinevault_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    let (state, app) = setup::initialize_app(config).await?;

    setup::server::start_server(state, app).await
}
