use crate::cache::VerifyImageRecord;
use crate::collaborators::Collaborators;
use crate::errors::{KubesigError, Result};
use crate::keys::PublicKeyList;
use kubesig_abi::VerifiedSignature;
use tracing::{debug, warn};

/// Verifies the signature attached to an OCI image, trying each configured key.
pub struct ImageSignatureVerifier {
    image_ref: String,
    public_key: Option<String>,
    cache_enabled: bool,
    collab: Collaborators,
}

impl ImageSignatureVerifier {
    pub fn new<S: Into<String>>(image_ref: S, public_key: Option<&str>, collab: Collaborators) -> Self {
        Self {
            image_ref: image_ref.into(),
            public_key: public_key.map(str::to_string),
            cache_enabled: true,
            collab,
        }
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    pub fn image_ref(&self) -> &str {
        &self.image_ref
    }

    pub fn verify(&self) -> Result<VerifiedSignature> {
        if self.image_ref.is_empty() {
            return Err(KubesigError::ReferenceMissing("image"));
        }
        let keys = PublicKeyList::parse(self.public_key.as_deref());

        if self.cache_enabled {
            if let Some(cached) = self.verify_from_cache(&keys) {
                return cached;
            }
        }

        debug!(image_ref = %self.image_ref, "image signature cache not found");
        let mut reasons = Vec::new();
        for key in keys.iter() {
            let result = self.collab.schemes.image.verify_image(&self.image_ref, key);
            if self.cache_enabled {
                self.collab.cache.set_verify_image(
                    &self.image_ref,
                    key,
                    &VerifyImageRecord::from_result(&result),
                );
            }
            match result {
                Ok(sig) => return Ok(sig),
                Err(e) => {
                    debug!(image_ref = %self.image_ref, key = key.unwrap_or(""), error = %e, "image verification failed");
                    reasons.push(format!("{e:#}"));
                }
            }
        }
        Err(KubesigError::VerificationFailed { reasons })
    }

    /// `Some` only when the cache settles the question: a cached success, or a
    /// cached failure for every key.
    fn verify_from_cache(&self, keys: &PublicKeyList) -> Option<Result<VerifiedSignature>> {
        let mut hits = 0;
        let mut reasons = Vec::new();
        for key in keys.iter() {
            match self.collab.cache.get_verify_image(&self.image_ref, key) {
                Ok(Some(VerifyImageRecord(outcome))) => {
                    hits += 1;
                    if let Some(sig) = outcome.signature() {
                        return Some(Ok(sig));
                    }
                    if let Some(e) = outcome.error {
                        reasons.push(e);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(image_ref = %self.image_ref, error = %e, "ignoring cached verification result");
                    reasons.push(e.to_string());
                }
            }
        }
        (hits == keys.len()).then_some(Err(KubesigError::VerificationFailed { reasons }))
    }
}
