//! Image acquisition for covers and backgrounds.
//!
//! The render sequencer only knows the [`ImageLoader`] trait. The stock
//! implementation, [`HttpImageLoader`], downloads `http(s)://` sources with a
//! shared `reqwest` client and keeps decoded images in a cache keyed by URL,
//! so a chart that repeats a cover (or a server rendering the same chart
//! twice) fetches it once. Entries record when they were last used so a
//! long-running process can drop stale ones with
//! [`HttpImageLoader::evict_expired`].
//!
//! Local paths are read with `tokio::fs` only when the loader allows it
//! ([`HttpImageLoader::with_local_paths`]). They are never cached.
//!
//! There are no retries and no timeouts at this layer; a loader that wants
//! them should configure its HTTP client accordingly.

use async_trait::async_trait;
use image::DynamicImage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::{Result, TopsterError};

/// A decoded image plus the last time a render used it.
#[derive(Clone)]
pub struct CachedImage {
    pub image: Arc<DynamicImage>,
    pub last_accessed: Instant,
}

impl CachedImage {
    pub fn new(image: Arc<DynamicImage>) -> Self {
        Self {
            image,
            last_accessed: Instant::now(),
        }
    }

    /// Mark the entry as used now.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Shared decoded-image cache, keyed by URL.
pub type ImageCache = Arc<RwLock<HashMap<String, CachedImage>>>;

/// Resolves a source reference (URL or path) into a decoded image.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, source: &str) -> Result<Arc<DynamicImage>>;
}

/// Loads `http://`/`https://` URLs over the network and, when enabled,
/// everything else from disk.
#[derive(Clone)]
pub struct HttpImageLoader {
    http_client: reqwest::Client,
    cache: ImageCache,
    allow_local_paths: bool,
}

impl HttpImageLoader {
    /// Loader with its own, initially empty, cache. Local paths are allowed.
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_cache(http_client, Arc::new(RwLock::new(HashMap::new())))
    }

    /// Loader sharing an existing cache (e.g. server-wide).
    pub fn with_cache(http_client: reqwest::Client, cache: ImageCache) -> Self {
        Self {
            http_client,
            cache,
            allow_local_paths: true,
        }
    }

    /// Loader with a default client (`topster/0.1` user agent).
    pub fn with_default_client() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("topster/0.1")
            .build()
            .map_err(|e| TopsterError::Image(format!("HTTP client error: {}", e)))?;
        Ok(Self::new(client))
    }

    /// Whether sources that are not URLs may be read from the local disk.
    pub fn with_local_paths(mut self, allow: bool) -> Self {
        self.allow_local_paths = allow;
        self
    }

    pub fn allows_local_paths(&self) -> bool {
        self.allow_local_paths
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Drop cache entries unused for at least `max_age`. Returns how many
    /// were removed.
    pub async fn evict_expired(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|_, entry| now.duration_since(entry.last_accessed) < max_age);
        before - cache.len()
    }

    async fn read_local(&self, source: &str) -> Result<Vec<u8>> {
        if !self.allow_local_paths {
            return Err(TopsterError::image_load(source, "only http(s) URLs are allowed"));
        }
        tokio::fs::read(source)
            .await
            .map_err(|e| TopsterError::image_load(source, e.to_string()))
    }

    async fn download(&self, source: &str) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(source)
            .send()
            .await
            .map_err(|e| TopsterError::image_load(source, format!("download failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(TopsterError::image_load(
                source,
                format!("HTTP {}", response.status()),
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TopsterError::image_load(source, format!("failed to read body: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, source: &str) -> Result<Arc<DynamicImage>> {
        if !is_url(source) {
            let bytes = self.read_local(source).await?;
            return decode(source, &bytes).map(Arc::new);
        }

        {
            let mut cache = self.cache.write().await;
            if let Some(entry) = cache.get_mut(source) {
                entry.touch();
                tracing::trace!(source, "image cache hit");
                return Ok(entry.image.clone());
            }
        }

        let bytes = self.download(source).await?;
        let image = Arc::new(decode(source, &bytes)?);

        {
            let mut cache = self.cache.write().await;
            cache.insert(source.to_string(), CachedImage::new(image.clone()));
        }

        Ok(image)
    }
}

fn decode(source: &str, bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| TopsterError::image_load(source, format!("failed to decode: {}", e)))?;
    tracing::debug!(source, width = image.width(), height = image.height(), "loaded image");
    Ok(image)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/a.jpg"));
        assert!(is_url("http://example.com/a.jpg"));
        assert!(!is_url("covers/a.jpg"));
        assert!(!is_url("/abs/https://weird.png"));
    }

    fn cached(image: Arc<DynamicImage>, age: Duration) -> CachedImage {
        let mut entry = CachedImage::new(image);
        if let Some(earlier) = entry.last_accessed.checked_sub(age) {
            entry.last_accessed = earlier;
        }
        entry
    }

    #[tokio::test]
    async fn test_local_path_is_read_fresh() {
        let path = write_png("topster-loader-fresh.png", 3, 2);
        let source = path.to_string_lossy().to_string();
        let loader = HttpImageLoader::with_default_client().unwrap();

        let image = loader.load(&source).await.unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert!(loader.cache().read().await.is_empty());

        // An edited file is picked up on the next load
        write_png("topster-loader-fresh.png", 5, 4);
        let again = loader.load(&source).await.unwrap();
        assert_eq!((again.width(), again.height()), (5, 4));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_local_paths_can_be_refused() {
        let path = write_png("topster-loader-refused.png", 2, 2);
        let loader = HttpImageLoader::with_default_client()
            .unwrap()
            .with_local_paths(false);
        assert!(!loader.allows_local_paths());

        let err = loader.load(&path.to_string_lossy()).await.unwrap_err();
        assert!(err.to_string().contains("only http(s) URLs are allowed"));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_cache_hit_touches_entry() {
        let loader = HttpImageLoader::with_default_client().unwrap();
        let url = "https://example.invalid/cover.png";
        let image = Arc::new(DynamicImage::ImageRgba8(RgbaImage::new(4, 4)));
        loader
            .cache()
            .write()
            .await
            .insert(url.to_string(), cached(image.clone(), Duration::from_secs(120)));

        // Served from the cache, no request goes out
        let hit = loader.load(url).await.unwrap();
        assert!(Arc::ptr_eq(&image, &hit));

        let cache = loader.cache().read().await;
        assert!(cache[url].last_accessed.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_evict_expired_keeps_recent_entries() {
        let loader = HttpImageLoader::with_default_client().unwrap();
        let image = Arc::new(DynamicImage::ImageRgba8(RgbaImage::new(1, 1)));
        {
            let mut cache = loader.cache().write().await;
            cache.insert("https://a.example/old.png".to_string(), cached(image.clone(), Duration::from_secs(3600)));
            cache.insert("https://a.example/new.png".to_string(), CachedImage::new(image));
        }

        let removed = loader.evict_expired(Duration::from_secs(600)).await;

        let cache = loader.cache().read().await;
        // checked_sub can fail right after boot; then nothing is old enough
        if removed == 1 {
            assert!(!cache.contains_key("https://a.example/old.png"));
        }
        assert!(cache.contains_key("https://a.example/new.png"));
        drop(cache);

        assert_eq!(loader.evict_expired(Duration::ZERO).await, 2 - removed);
        assert!(loader.cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let loader = HttpImageLoader::with_default_client().unwrap();
        let err = loader.load("/nonexistent/cover.png").await.unwrap_err();
        assert!(
            matches!(err, TopsterError::ImageLoad { ref source_ref, .. } if source_ref == "/nonexistent/cover.png")
        );
    }

    #[tokio::test]
    async fn test_undecodable_file_is_load_error() {
        let path = std::env::temp_dir().join("topster-loader-garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let loader = HttpImageLoader::with_default_client().unwrap();

        let err = loader.load(&path.to_string_lossy()).await.unwrap_err();
        assert!(err.to_string().contains("failed to decode"));
        let _ = std::fs::remove_file(path);
    }
}
