use super::CacheStore;
use crate::errors::CacheError;
use crate::paths::results_cache_dir;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    stored_at: String,
    value: String, // base64
}

/// One JSON file per key under a directory, shared across processes.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// ~/.local/share/Kubesig/cache/results
    pub fn default_location() -> Self {
        Self::new(results_cache_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let path = self.path_for(key);
        let buf = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let entry: StoredEntry = serde_json::from_slice(&buf)?;
        if entry.key != key {
            return Err(CacheError::NotFound(key.to_string()));
        }
        STANDARD
            .decode(entry.value)
            .map_err(|e| CacheError::Inconsistent {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let entry = StoredEntry {
            key: key.to_string(),
            stored_at: Utc::now().to_rfc3339(),
            value: STANDARD.encode(value),
        };
        let path = self.path_for(key);
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{seq}.tmp", std::process::id()));
        let bytes = serde_json::to_vec_pretty(&entry)?;
        if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}
