//! Web front end: an upload form, a compress action and download links.

pub mod page;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use log::info;

pub use state::{AppState, FinishedBatch, SharedCompressor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Upper bound on one request body, all files included.
    pub max_upload_bytes: usize,
    /// Finished batches kept for download before the oldest is dropped.
    pub retained_batches: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_upload_bytes: 200 * 1024 * 1024,
            retained_batches: 16,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config().max_upload_bytes;
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route(
            "/compress",
            post(routes::compress).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download/:batch/:index", get(routes::download))
        .with_state(state)
}

/// Binds `config.bind` and serves until the process is stopped.
pub async fn serve(config: ServerConfig, compressor: SharedCompressor) -> std::io::Result<()> {
    let addr = config.bind;
    let app = router(AppState::new(config, compressor));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
