//! Offline cache for static UI assets.
//!
//! Network-first with cache fallback: every successful download refreshes the
//! cached copy, and when the network is down the cached copy serves instead.
//! The cache directory carries a version suffix; activating a new version
//! deletes every sibling cache from older versions.

use std::path::PathBuf;

/// Current cache generation. Bump to invalidate everything on next activate.
const CACHE_VERSION: &str = "assets-v1";

/// Asset shell files fetched ahead of need.
pub const PRECACHE_PATHS: &[&str] = &[
    "/index.html",
    "/styles.css",
    "/manifest.webmanifest",
    "/icons/icon.svg",
];

/// Asset cache errors
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not available from network or cache: {0}")]
    Unavailable(String),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Versioned on-disk cache in front of a single asset origin.
pub struct AssetCache {
    client: reqwest::Client,
    base_url: String,
    cache_dir: PathBuf,
}

impl AssetCache {
    /// Create a cache rooted under `cache_root`; the actual cache directory
    /// is the versioned `assets-v1` subdirectory.
    pub fn new(base_url: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache_dir: cache_root.into().join(CACHE_VERSION),
        }
    }

    /// Fetch one asset: network first, falling back to the cached copy.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        match self.fetch_remote(path).await {
            Ok(bytes) => {
                self.store(path, &bytes);
                Ok(bytes)
            }
            Err(e) => {
                tracing::debug!("Network fetch failed for {}: {}", path, e);
                match self.load_cached(path) {
                    Some(bytes) => Ok(bytes),
                    None => Err(AssetError::Unavailable(path.to_string())),
                }
            }
        }
    }

    /// Warm the cache with the fixed shell assets. Failures are logged and
    /// skipped; a partial prefetch is fine.
    pub async fn prefetch(&self, paths: &[&str]) {
        for path in paths {
            match self.fetch_remote(path).await {
                Ok(bytes) => self.store(path, &bytes),
                Err(e) => tracing::warn!("Prefetch of {} failed: {}", path, e),
            }
        }
    }

    /// Delete sibling cache directories from other versions.
    pub fn activate(&self) -> Result<(), AssetError> {
        let Some(parent) = self.cache_dir.parent() else {
            return Ok(());
        };
        if !parent.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("assets-") && name != CACHE_VERSION {
                tracing::info!("Evicting stale asset cache {}", name);
                std::fs::remove_dir_all(entry.path())?;
            }
        }
        Ok(())
    }

    async fn fetch_remote(&self, path: &str) -> Result<Vec<u8>, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn cached_path(&self, path: &str) -> PathBuf {
        self.cache_dir.join(path.trim_start_matches('/'))
    }

    fn store(&self, path: &str, bytes: &[u8]) {
        let target = self.cached_path(path);
        if let Some(parent) = target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create cache directory: {}", e);
                return;
            }
        }
        if let Err(e) = std::fs::write(&target, bytes) {
            tracing::warn!("Failed to cache {}: {}", path, e);
        }
    }

    fn load_cached(&self, path: &str) -> Option<Vec<u8>> {
        let target = self.cached_path(path);
        match std::fs::read(&target) {
            Ok(bytes) => Some(bytes),
            Err(_) => None,
        }
    }

    #[cfg(test)]
    fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_caches_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/styles.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body { margin: 0 }"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = AssetCache::new(server.uri(), dir.path());
        let bytes = cache.fetch("/styles.css").await.unwrap();
        assert_eq!(bytes, b"body { margin: 0 }");

        // Point the same cache directory at a dead origin.
        drop(server);
        let offline = AssetCache::new("http://127.0.0.1:1", dir.path());
        let bytes = offline.fetch("/styles.css").await.unwrap();
        assert_eq!(bytes, b"body { margin: 0 }");
    }

    #[tokio::test]
    async fn test_fetch_refreshes_cached_copy() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("v2"))
            .mount(&server)
            .await;

        let cache = AssetCache::new(server.uri(), dir.path());
        let stale = cache.cached_path("/app.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"v1").unwrap();

        let bytes = cache.fetch("/app.txt").await.unwrap();
        assert_eq!(bytes, b"v2");
        assert_eq!(std::fs::read(&stale).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_fetch_without_network_or_cache_errors() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::new("http://127.0.0.1:1", dir.path());
        let result = cache.fetch("/missing.css").await;
        assert!(matches!(result, Err(AssetError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let cache = AssetCache::new(server.uri(), dir.path());
        let result = cache.fetch("/broken.css").await;
        assert!(matches!(result, Err(AssetError::Unavailable(_))));
        assert!(!cache.cached_path("/broken.css").exists());
    }

    #[tokio::test]
    async fn test_prefetch_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad.css"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = AssetCache::new(server.uri(), dir.path());
        cache.prefetch(&["/good.css", "/bad.css"]).await;

        assert!(cache.cached_path("/good.css").exists());
        assert!(!cache.cached_path("/bad.css").exists());
    }

    #[test]
    fn test_activate_evicts_only_stale_versions() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::new("http://localhost", dir.path());

        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        std::fs::create_dir_all(dir.path().join("assets-v0")).unwrap();
        std::fs::create_dir_all(dir.path().join("state")).unwrap();

        cache.activate().unwrap();

        assert!(cache.cache_dir().exists());
        assert!(!dir.path().join("assets-v0").exists());
        assert!(dir.path().join("state").exists());
    }
}
