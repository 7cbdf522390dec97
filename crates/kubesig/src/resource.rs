use crate::collaborators::Collaborators;
use crate::config::VerifyOptions;
use crate::errors::{KubesigError, Result};
use crate::fetch::ManifestFetcher;
use crate::verify::SignatureVerifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Externally visible outcome for one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub verified: bool,
    pub signer: String,
    pub diff: Option<serde_json::Value>,
}

impl fmt::Display for VerifyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

/// Verify the signature for `object_yaml`, then check the live object against
/// the signed manifest.
///
/// An object that carries no signature at all is reported as unverified with an
/// empty signer, not as an error. Otherwise `verified` holds only when the
/// signature verifies, a signed manifest matches the object, and the differ
/// reports no drift.
pub fn verify_resource(
    object_yaml: &[u8],
    sig_ref: Option<&str>,
    options: &VerifyOptions,
    collab: &Collaborators,
) -> Result<VerifyResult> {
    let fetched =
        ManifestFetcher::new(object_yaml, sig_ref, options, collab.clone()).fetch(object_yaml)?;
    let Some(fetched) = fetched else {
        debug!("object carries no signature");
        return Ok(VerifyResult::default());
    };

    let signature =
        SignatureVerifier::new(object_yaml, sig_ref, options, collab.clone()).verify()?;

    let Some(manifest) = fetched.manifests.first() else {
        return Ok(VerifyResult {
            verified: false,
            signer: signature.signer,
            diff: None,
        });
    };

    let diff = collab
        .differ
        .diff(manifest, object_yaml, &options.ignore_fields)
        .map_err(|e| KubesigError::collaborator("failed to compute manifest diff", e))?;
    Ok(VerifyResult {
        verified: diff.is_none(),
        signer: signature.signer,
        diff,
    })
}
