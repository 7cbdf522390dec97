use thiserror::Error;

/// Malformed in-cluster references.
#[derive(Debug, Error)]
pub enum RefError {
    #[error("in-cluster reference must be \"k8s://KIND/NAMESPACE/NAME\", but got {0}")]
    Malformed(String),

    #[error("configmap reference must be \"k8s://ConfigMap/[NAMESPACE]/[NAME]\", but got {0}")]
    NotConfigMap(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache entry not found: {0}")]
    NotFound(String),

    #[error("cache lock poisoned")]
    Poisoned,

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encode error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cache returns inconsistent data for {key}: {reason}")]
    Inconsistent { key: String, reason: String },
}

/// Failures unpacking a signed message.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to decode base64 message: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to read archive: {0}")]
    Archive(#[from] std::io::Error),

    #[error("no YAML files found in the archive")]
    Empty,

    #[error("decompressed message exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// Coarse classification of [`KubesigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ReferenceMissing,
    InvalidReference,
    ManifestNotFound,
    RequiredFieldMissing,
    Decode,
    SchemeUnknown,
    CacheInconsistent,
    VerificationFailed,
    Collaborator,
}

#[derive(Debug, Error)]
pub enum KubesigError {
    #[error("no {0} reference is found")]
    ReferenceMissing(&'static str),

    #[error("invalid reference: {0}")]
    InvalidReference(#[from] RefError),

    #[error("failed to find a YAML manifest in the {origin}{}", fmt_attempts(.attempts))]
    ManifestNotFound {
        origin: String,
        attempts: Vec<String>,
    },

    #[error("`{field}` is not found in the {origin}")]
    RequiredFieldMissing { field: String, origin: String },

    #[error("failed to read YAMLs in the {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: ArtifactError,
    },

    #[error("failed to judge signature type from public key configuration")]
    SchemeUnknown,

    #[error("cache returns inconsistent data for {key}: {reason}")]
    CacheInconsistent { key: String, reason: String },

    #[error("{}", .reasons.join("; "))]
    VerificationFailed { reasons: Vec<String> },

    #[error("{context}: {cause:#}")]
    Collaborator {
        context: String,
        cause: anyhow::Error,
    },
}

fn fmt_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        String::new()
    } else {
        format!(" ({})", attempts.join("; "))
    }
}

impl KubesigError {
    pub fn collaborator<C: Into<String>>(context: C, cause: anyhow::Error) -> Self {
        KubesigError::Collaborator {
            context: context.into(),
            cause,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KubesigError::ReferenceMissing(_) => ErrorKind::ReferenceMissing,
            KubesigError::InvalidReference(_) => ErrorKind::InvalidReference,
            KubesigError::ManifestNotFound { .. } => ErrorKind::ManifestNotFound,
            KubesigError::RequiredFieldMissing { .. } => ErrorKind::RequiredFieldMissing,
            KubesigError::Decode { .. } => ErrorKind::Decode,
            KubesigError::SchemeUnknown => ErrorKind::SchemeUnknown,
            KubesigError::CacheInconsistent { .. } => ErrorKind::CacheInconsistent,
            KubesigError::VerificationFailed { .. } => ErrorKind::VerificationFailed,
            KubesigError::Collaborator { .. } => ErrorKind::Collaborator,
        }
    }
}

impl From<CacheError> for KubesigError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Inconsistent { key, reason } => {
                KubesigError::CacheInconsistent { key, reason }
            }
            other => KubesigError::collaborator("cache", anyhow::Error::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, KubesigError>;
