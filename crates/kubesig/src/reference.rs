//! Signature references: where the signed material for an object lives.

use crate::config::AnnotationConfig;
use crate::errors::RefError;
use std::collections::BTreeMap;
use std::fmt;

/// Marker meaning "read signature material from the object's own annotations".
pub const EMBEDDED_IN_ANNOTATION: &str = "__embedded_in_annotation__";

/// Prefix of in-cluster object references.
pub const IN_CLUSTER_PREFIX: &str = "k8s://";

const CONFIG_MAP_KINDS: [&str; 3] = ["ConfigMap", "configmaps", "cm"];

/// Which source governs a verifier or fetcher. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigRef {
    /// OCI image reference, possibly a comma-separated list tried in order.
    Image(String),
    /// `k8s://KIND/NS/NAME`, possibly a comma-separated list (fetchers only).
    Resource(String),
    /// Signature lives in the target object's annotations.
    Embedded,
}

impl SigRef {
    /// Classify an explicit reference argument. Blank input yields `None`.
    pub fn parse(s: &str) -> Option<SigRef> {
        let s = s.trim();
        if s.is_empty() {
            None
        } else if s == EMBEDDED_IN_ANNOTATION {
            Some(SigRef::Embedded)
        } else if is_in_cluster_ref(s) {
            Some(SigRef::Resource(s.to_string()))
        } else {
            Some(SigRef::Image(s.to_string()))
        }
    }

    /// Explicit reference first, then the image-ref annotation, then embedded.
    pub fn resolve(
        explicit: Option<&str>,
        annotations: &BTreeMap<String, String>,
        config: &AnnotationConfig,
    ) -> SigRef {
        if let Some(r) = explicit.and_then(SigRef::parse) {
            return r;
        }
        match annotations.get(&config.image_ref_key()).map(|s| s.trim()) {
            Some(anno) if !anno.is_empty() && anno != EMBEDDED_IN_ANNOTATION => {
                SigRef::Image(anno.to_string())
            }
            _ => SigRef::Embedded,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SigRef::Image(s) | SigRef::Resource(s) => s,
            SigRef::Embedded => EMBEDDED_IN_ANNOTATION,
        }
    }
}

impl fmt::Display for SigRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_in_cluster_ref(s: &str) -> bool {
    s.starts_with(IN_CLUSTER_PREFIX)
}

/// A single `k8s://KIND/NAMESPACE/NAME` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn parse(s: &str) -> Result<Self, RefError> {
        let rest = s
            .trim()
            .strip_prefix(IN_CLUSTER_PREFIX)
            .ok_or_else(|| RefError::Malformed(s.to_string()))?;
        let parts: Vec<&str> = rest.split('/').collect();
        match parts.as_slice() {
            [kind, namespace, name]
                if !kind.is_empty() && !name.is_empty() && !name.contains(',') =>
            {
                Ok(Self {
                    kind: kind.to_string(),
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(RefError::Malformed(s.to_string())),
        }
    }

    /// Like [`ResourceRef::parse`], but only ConfigMaps are accepted.
    pub fn config_map(s: &str) -> Result<Self, RefError> {
        let r = Self::parse(s)?;
        if !CONFIG_MAP_KINDS.contains(&r.kind.as_str()) {
            return Err(RefError::NotConfigMap(s.to_string()));
        }
        Ok(r)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{IN_CLUSTER_PREFIX}{}/{}/{}",
            self.kind, self.namespace, self.name
        )
    }
}

/// Split on commas, trim, drop blanks. Order is preserved.
pub fn split_comma_separated(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
