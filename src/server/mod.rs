//! # HTTP Server for Chart Rendering
//!
//! Renders charts posted as JSON.
//!
//! ## Usage
//!
//! ```bash
//! topster serve --listen 0.0.0.0:8080 --font-file UbuntuMono-Regular.ttf --font-family "Ubuntu Mono"
//! curl -X POST localhost:8080/api/chart/preview -H 'content-type: application/json' -d @chart.json > chart.png
//! ```

mod handlers;
mod state;

pub use state::{AppState, CACHE_EXPIRATION_SECS, ServerConfig};

use axum::{Router, routing::post};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::error::{Result, TopsterError};

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chart/preview", post(handlers::chart::preview))
        .route("/api/chart/layout", post(handlers::chart::layout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use topster::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), topster::TopsterError> {
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<()> {
    let app_state = Arc::new(AppState::new(config.clone())?);

    // Spawn background cache cleanup task
    tokio::spawn(cleanup_cache(app_state.clone()));

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            TopsterError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", config.listen_addr, e),
            ))
        })?;

    tracing::info!(
        listen = %config.listen_addr,
        cell_size = config.cell_size,
        local_paths = config.allow_local_paths,
        "topster HTTP server started"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Background task that drops cached covers nobody has used for a while.
async fn cleanup_cache(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(CACHE_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let removed = state.loader.evict_expired(expiration).await;
        if removed > 0 {
            let remaining = state.loader.cache().read().await.len();
            tracing::debug!(removed, remaining, "evicted expired cover images");
        }
    }
}
