use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANNOTATION_DOMAIN: &str = "cosign.sigstore.dev";
pub const ANNOTATION_DOMAIN_ENV: &str = "KUBESIG_ANNOTATION_DOMAIN";

const IMAGE_REF_BASE: &str = "imageRef";
const MESSAGE_BASE: &str = "message";
const SIGNATURE_BASE: &str = "signature";
const CERTIFICATE_BASE: &str = "certificate";
const BUNDLE_BASE: &str = "bundle";

/// Annotation keys live under a single domain, e.g. `cosign.sigstore.dev/message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationConfig {
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_domain() -> String {
    DEFAULT_ANNOTATION_DOMAIN.to_string()
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
        }
    }
}

impl AnnotationConfig {
    pub fn new<S: Into<String>>(domain: S) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Domain from `KUBESIG_ANNOTATION_DOMAIN`, falling back to the default.
    pub fn from_env() -> Self {
        std::env::var(ANNOTATION_DOMAIN_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    fn key(&self, base: &str) -> String {
        format!("{}/{}", self.domain, base)
    }

    pub fn image_ref_key(&self) -> String {
        self.key(IMAGE_REF_BASE)
    }
    pub fn message_key(&self) -> String {
        self.key(MESSAGE_BASE)
    }
    pub fn signature_key(&self) -> String {
        self.key(SIGNATURE_BASE)
    }
    pub fn certificate_key(&self) -> String {
        self.key(CERTIFICATE_BASE)
    }
    pub fn bundle_key(&self) -> String {
        self.key(BUNDLE_BASE)
    }
}

/// Knobs shared by verifiers and fetchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    #[serde(default)]
    pub annotation: AnnotationConfig,

    /// Comma-separated key references. Unset means keyless.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Dotted field paths the matcher and differ skip.
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    #[serde(default)]
    pub max_resource_manifests: Option<usize>,
}

impl VerifyOptions {
    /// Parse options from YAML (JSON is accepted too).
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let opts: VerifyOptions =
            serde_yaml::from_str(text).context("invalid verify options")?;
        Ok(opts)
    }

    pub fn with_public_key<S: Into<String>>(mut self, key: S) -> Self {
        self.public_key = Some(key.into());
        self
    }

    pub fn with_ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_resource_manifests(mut self, max: usize) -> Self {
        self.max_resource_manifests = Some(max);
        self
    }

    /// Key configuration with blanks normalized away.
    pub fn public_key(&self) -> Option<&str> {
        self.public_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Candidate cap; zero means uncapped.
    pub fn max_candidates(&self) -> Option<usize> {
        self.max_resource_manifests.filter(|&n| n > 0)
    }
}
