//! Tally Record API
//!
//! An HTTP interface over the record store with five order endpoints:
//!
//! | Method | Path | Result |
//! |---|---|---|
//! | GET | `/orders` | all orders |
//! | GET | `/order/{order_id}` | one order or 404 |
//! | POST | `/order` | 201, or 400 if the id exists |
//! | PATCH | `/order/{order_id}` | 200 or 404 |
//! | DELETE | `/order/{order_id}` | 200 or 404 |
//!
//! `GET /health` is also served. This is the API the chat assistant drives.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ApiConfig;
use handlers::{create_router, AppState};
use tally_store::{SqliteStore, StoreError};
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The database could not be opened
    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start the Record API server
///
/// Opens the database named in `config`, binds, and serves until the process
/// is terminated.
pub async fn start_server(config: ApiConfig) -> Result<(), ServerError> {
    info!("Starting Tally Record API");
    info!("Database: {}", config.database_path.display());

    let store = SqliteStore::new(&config.database_path)?;
    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Record API listening on {}", config.bind_addr());

    serve(listener, AppState::new(store)).await
}

/// Serve the Record API on an already bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    axum::serve(listener, create_router(state))
        .await
        .map_err(|e| ServerError::Server(e.to_string()))
}
