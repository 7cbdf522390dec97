use crate::signature::{SignatureBundle, VerifiedSignature};

/// Cosign-style image signature verification.
pub trait ImageVerifier: Send + Sync {
    /// `key` is a key reference; `None` asks for keyless (identity-based) verification.
    fn verify_image(&self, image_ref: &str, key: Option<&str>) -> anyhow::Result<VerifiedSignature>;
}

/// Cosign-style blob verification. Uses every field of the bundle.
pub trait CosignBlobVerifier: Send + Sync {
    fn verify_blob(
        &self,
        bundle: &SignatureBundle,
        key: Option<&str>,
    ) -> anyhow::Result<VerifiedSignature>;
}

pub trait PgpBlobVerifier: Send + Sync {
    fn verify_blob(
        &self,
        message: &[u8],
        signature: &[u8],
        key: Option<&str>,
    ) -> anyhow::Result<VerifiedSignature>;
}

pub trait X509BlobVerifier: Send + Sync {
    fn verify_blob(
        &self,
        message: &[u8],
        signature: &[u8],
        certificate: Option<&[u8]>,
        key: Option<&str>,
    ) -> anyhow::Result<VerifiedSignature>;
}
