//! Signature verification, image path or blob path.

mod blob;
mod image;

pub use blob::BlobSignatureVerifier;
pub use image::ImageSignatureVerifier;

use crate::collaborators::Collaborators;
use crate::config::VerifyOptions;
use crate::errors::Result;
use crate::reference::SigRef;
use crate::yaml::annotations_in_yaml;
use kubesig_abi::{VerificationOutcome, VerifiedSignature};

pub enum SignatureVerifier {
    Image(ImageSignatureVerifier),
    Blob(BlobSignatureVerifier),
}

impl SignatureVerifier {
    /// Pick the verifier for `object_yaml`.
    ///
    /// An explicit image reference wins, then an explicit `k8s://` reference,
    /// then the object's image-ref annotation. Otherwise the signature is
    /// expected in the object's own annotations.
    pub fn new(
        object_yaml: &[u8],
        sig_ref: Option<&str>,
        options: &VerifyOptions,
        collab: Collaborators,
    ) -> Self {
        let annotations = annotations_in_yaml(object_yaml);
        match SigRef::resolve(sig_ref, &annotations, &options.annotation) {
            SigRef::Image(image_ref) => SignatureVerifier::Image(ImageSignatureVerifier::new(
                image_ref,
                options.public_key(),
                collab,
            )),
            SigRef::Resource(resource_ref) => SignatureVerifier::Blob(BlobSignatureVerifier::new(
                annotations,
                Some(resource_ref),
                options,
                collab,
            )),
            SigRef::Embedded => SignatureVerifier::Blob(BlobSignatureVerifier::new(
                annotations,
                None,
                options,
                collab,
            )),
        }
    }

    pub fn verify(&self) -> Result<VerifiedSignature> {
        match self {
            SignatureVerifier::Image(v) => v.verify(),
            SignatureVerifier::Blob(v) => v.verify(),
        }
    }

    /// [`SignatureVerifier::verify`] flattened to `(verified, signer, signed_at, error)`.
    pub fn verify_outcome(&self) -> VerificationOutcome {
        VerificationOutcome::from_result(&self.verify())
    }

    /// The reference this verifier is bound to.
    pub fn sig_ref(&self) -> SigRef {
        match self {
            SignatureVerifier::Image(v) => SigRef::Image(v.image_ref().to_string()),
            SignatureVerifier::Blob(v) => match v.resource_ref() {
                Some(r) => SigRef::Resource(r.to_string()),
                None => SigRef::Embedded,
            },
        }
    }
}
