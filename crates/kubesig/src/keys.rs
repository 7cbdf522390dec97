//! Public key configuration: the ordered key list and signature-scheme sniffing.

use crate::reference::{split_comma_separated, IN_CLUSTER_PREFIX};
use std::fs;
use tracing::debug;

const KMS_PREFIXES: [&str; 4] = ["awskms://", "gcpkms://", "azurekms://", "hashivault://"];

/// Ordered keys to try. `None` stands for keyless verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyList(Vec<Option<String>>);

impl PublicKeyList {
    /// Unset or blank configuration yields a single keyless entry.
    pub fn parse(config: Option<&str>) -> Self {
        let keys = config.map(split_comma_separated).unwrap_or_default();
        if keys.is_empty() {
            Self(vec![None])
        } else {
            Self(keys.into_iter().map(Some).collect())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.0.iter().map(|k| k.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_keyless(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigScheme {
    Cosign,
    Pgp,
    X509,
    Unknown,
}

impl SigScheme {
    /// Judge the scheme from the key configuration.
    ///
    /// No key means cosign keyless. KMS URIs and in-cluster secret references are
    /// cosign keys. Anything else is treated as a path and sniffed by PEM armor;
    /// only the first configured key is inspected.
    pub fn classify(public_key: Option<&str>) -> Self {
        let Some(first) = public_key.and_then(|c| split_comma_separated(c).into_iter().next())
        else {
            return SigScheme::Cosign;
        };
        if first.starts_with(IN_CLUSTER_PREFIX) || KMS_PREFIXES.iter().any(|p| first.starts_with(p))
        {
            return SigScheme::Cosign;
        }
        match fs::read(&first) {
            Ok(bytes) => Self::from_pem(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!(key = %first, error = %e, "public key is not readable");
                SigScheme::Unknown
            }
        }
    }

    pub fn from_pem(text: &str) -> Self {
        if text.contains("-----BEGIN PGP PUBLIC KEY BLOCK-----") {
            SigScheme::Pgp
        } else if text.contains("-----BEGIN CERTIFICATE-----") {
            SigScheme::X509
        } else if text.contains("PUBLIC KEY-----") {
            SigScheme::Cosign
        } else {
            SigScheme::Unknown
        }
    }
}
