use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Data keys a signature config object carries.
pub const MESSAGE_KEY: &str = "message";
pub const SIGNATURE_KEY: &str = "signature";
pub const CERTIFICATE_KEY: &str = "certificate";
pub const BUNDLE_KEY: &str = "bundle";

/// Who signed, and when (if the scheme records it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSignature {
    pub signer: String,
    #[serde(default)]
    pub signed_at: Option<i64>, // unix seconds
}

impl VerifiedSignature {
    pub fn new<S: Into<String>>(signer: S, signed_at: Option<i64>) -> Self {
        Self {
            signer: signer.into(),
            signed_at,
        }
    }
}

/// Flattened outcome of a single verification attempt.
///
/// This is the shape callers that do not want a `Result` consume, and the shape
/// the engine memoizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub signer: String,
    #[serde(default)]
    pub signed_at: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl VerificationOutcome {
    pub fn from_result<E: fmt::Display>(result: &Result<VerifiedSignature, E>) -> Self {
        match result {
            Ok(sig) => Self {
                verified: true,
                signer: sig.signer.clone(),
                signed_at: sig.signed_at,
                error: None,
            },
            Err(e) => Self {
                verified: false,
                signer: String::new(),
                signed_at: None,
                error: Some(format!("{e:#}")),
            },
        }
    }

    /// The signature part, if this outcome is a success.
    pub fn signature(&self) -> Option<VerifiedSignature> {
        self.verified
            .then(|| VerifiedSignature::new(self.signer.clone(), self.signed_at))
    }
}

/// Raw signature material, still in its carried encoding (base64 text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBundle {
    pub message: Vec<u8>,
    pub signature: Vec<u8>,
    pub certificate: Option<Vec<u8>>,
    pub bundle: Option<Vec<u8>>,
}

/// A cluster-resident key/value object (a ConfigMap) used as an out-of-band
/// signature carrier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigObject {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl ConfigObject {
    pub fn new<N: Into<String>, S: Into<String>>(namespace: N, name: S) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_entry<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}
