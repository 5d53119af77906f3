//! On-disk cache of summary responses, one JSON file per prompt hash.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    response: String,
}

/// Summary response cache.
///
/// Read and write failures are logged at debug level and otherwise
/// ignored; a broken cache never fails generation.
#[derive(Debug, Clone)]
pub struct SummaryCache {
    dir: PathBuf,
}

impl SummaryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `sha256("{model}:{system}:{user}")` as lower-case hex.
    pub fn key(model: &str, system: &str, user: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}:{}", model, system, user).as_bytes());
        hex::encode(hasher.finalize())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(_) => return None,
        };
        match serde_json::from_slice::<CachedResponse>(&bytes) {
            Ok(cached) if !cached.response.trim().is_empty() => {
                debug!(key, "Summary cache hit");
                Some(cached.response)
            }
            Ok(_) => None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, response: &str) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            debug!(dir = %self.dir.display(), error = %e, "Cannot create summary cache directory");
            return;
        }
        let entry = CachedResponse {
            response: response.to_string(),
        };
        let body = match serde_json::to_vec(&entry) {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Cannot encode cache entry");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(self.path_for(key), body).await {
            debug!(key, error = %e, "Cannot write summary cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_is_stable_hex() {
        let a = SummaryCache::key("gpt-4o-mini", "sys", "user");
        let b = SummaryCache::key("gpt-4o-mini", "sys", "user");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, SummaryCache::key("llama3", "sys", "user"));
    }

    #[test]
    fn test_key_matches_sha256_of_joined_parts() {
        // sha256("m:s:u")
        let expected = hex::encode(Sha256::digest(b"m:s:u"));
        assert_eq!(SummaryCache::key("m", "s", "u"), expected);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = SummaryCache::new(dir.path().join("nested"));

        assert_eq!(cache.get("abc").await, None);
        cache.put("abc", "Erfahrene Fachperson.").await;
        assert_eq!(cache.get("abc").await.as_deref(), Some("Erfahrene Fachperson."));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "not json").unwrap();
        let cache = SummaryCache::new(dir.path());
        assert_eq!(cache.get("bad").await, None);
    }
}
