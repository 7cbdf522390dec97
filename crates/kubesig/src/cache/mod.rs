//! Best-effort memoization of image fetches and image verifications.
//!
//! Records are stored as fixed-length JSON arrays; an entry that does not decode
//! as the record the caller asked for is reported as inconsistent.

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use crate::errors::CacheError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use kubesig_abi::{VerificationOutcome, VerifiedSignature};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Byte-level key/value store. Implementations must be safe to share across threads.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError>;
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;
}

pub fn verify_image_key(image_ref: &str, key: Option<&str>) -> String {
    format!("cache/verify-image/{}/{}", image_ref, key.unwrap_or(""))
}

pub fn fetch_manifest_key(image_ref: &str) -> String {
    format!("cache/fetch-manifest/{image_ref}")
}

type VerifyImageTuple = (bool, String, Option<i64>, Option<String>);

/// Outcome of one image verification: verified, signer, timestamp, error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VerifyImageTuple", into = "VerifyImageTuple")]
pub struct VerifyImageRecord(pub VerificationOutcome);

impl From<VerifyImageTuple> for VerifyImageRecord {
    fn from((verified, signer, signed_at, error): VerifyImageTuple) -> Self {
        Self(VerificationOutcome {
            verified,
            signer,
            signed_at,
            error,
        })
    }
}

impl From<VerifyImageRecord> for VerifyImageTuple {
    fn from(r: VerifyImageRecord) -> Self {
        let o = r.0;
        (o.verified, o.signer, o.signed_at, o.error)
    }
}

impl VerifyImageRecord {
    pub fn from_result<E: fmt::Display>(result: &Result<VerifiedSignature, E>) -> Self {
        Self(VerificationOutcome::from_result(result))
    }
}

type FetchManifestTuple = (Option<String>, Option<String>);

/// Outcome of one image pull: the concatenated YAML text, or the error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FetchManifestTuple", into = "FetchManifestTuple")]
pub struct FetchManifestRecord {
    pub payload: Vec<u8>,
    pub error: Option<String>,
}

impl TryFrom<FetchManifestTuple> for FetchManifestRecord {
    type Error = base64::DecodeError;

    fn try_from((payload, error): FetchManifestTuple) -> Result<Self, Self::Error> {
        let payload = match payload {
            Some(p) => STANDARD.decode(p)?,
            None => Vec::new(),
        };
        Ok(Self { payload, error })
    }
}

impl From<FetchManifestRecord> for FetchManifestTuple {
    fn from(r: FetchManifestRecord) -> Self {
        (Some(STANDARD.encode(&r.payload)), r.error)
    }
}

impl FetchManifestRecord {
    pub fn payload(payload: Vec<u8>) -> Self {
        Self {
            payload,
            error: None,
        }
    }
}

/// Typed view over a shared [`CacheStore`].
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache").finish_non_exhaustive()
    }
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// A private in-memory cache.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// The process-wide in-memory cache.
    pub fn shared() -> Self {
        Self::new(MemoryCache::shared())
    }

    /// Any store failure reads as a miss; an undecodable entry does not.
    pub fn lookup<R: DeserializeOwned>(&self, key: &str) -> Result<Option<R>, CacheError> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key, error = %e, "cache miss");
                return Ok(None);
            }
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| CacheError::Inconsistent {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Write failures are logged, never returned.
    pub fn store<R: Serialize>(&self, key: &str, record: &R) {
        let res = serde_json::to_vec(record)
            .map_err(CacheError::from)
            .and_then(|bytes| self.store.set(key, bytes));
        if let Err(e) = res {
            warn!(key, error = %e, "cache set error");
        }
    }

    pub fn get_verify_image(
        &self,
        image_ref: &str,
        key: Option<&str>,
    ) -> Result<Option<VerifyImageRecord>, CacheError> {
        self.lookup(&verify_image_key(image_ref, key))
    }

    pub fn set_verify_image(&self, image_ref: &str, key: Option<&str>, record: &VerifyImageRecord) {
        self.store(&verify_image_key(image_ref, key), record)
    }

    pub fn get_fetch_manifest(
        &self,
        image_ref: &str,
    ) -> Result<Option<FetchManifestRecord>, CacheError> {
        self.lookup(&fetch_manifest_key(image_ref))
    }

    pub fn set_fetch_manifest(&self, image_ref: &str, record: &FetchManifestRecord) {
        self.store(&fetch_manifest_key(image_ref), record)
    }

    /// Raw access for callers that manage their own records.
    pub fn raw_store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }
}
