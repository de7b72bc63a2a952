//! Server state and configuration.

use crate::error::Result;
use crate::layout::DEFAULT_CELL_SIZE;
use crate::loader::HttpImageLoader;

/// Decoded covers unused for this long are dropped from the cache.
pub const CACHE_EXPIRATION_SECS: u64 = 10 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Cell size used when a request does not ask for one.
    pub cell_size: u32,
    /// Let posted charts reference files on the server's disk.
    pub allow_local_paths: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            cell_size: DEFAULT_CELL_SIZE,
            allow_local_paths: false,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Cover loader; its decoded-image cache lives for the whole server.
    pub loader: HttpImageLoader,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let loader = HttpImageLoader::with_default_client()?.with_local_paths(config.allow_local_paths);
        Ok(Self { config, loader })
    }

    pub fn with_loader(config: ServerConfig, loader: HttpImageLoader) -> Self {
        Self { config, loader }
    }
}
