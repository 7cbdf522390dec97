use crate::collaborators::Collaborators;
use crate::config::{AnnotationConfig, VerifyOptions};
use crate::errors::{KubesigError, Result};
use crate::keys::SigScheme;
use kubesig_abi::{
    SignatureBundle, VerifiedSignature, BUNDLE_KEY, CERTIFICATE_KEY, MESSAGE_KEY, SIGNATURE_KEY,
};
use std::collections::BTreeMap;

/// Verifies a detached signature carried in annotations or in a ConfigMap.
pub struct BlobSignatureVerifier {
    annotations: BTreeMap<String, String>,
    resource_ref: Option<String>,
    public_key: Option<String>,
    annotation: AnnotationConfig,
    collab: Collaborators,
}

struct FieldKeys<'a> {
    message: &'a str,
    signature: &'a str,
    certificate: &'a str,
    bundle: &'a str,
}

impl BlobSignatureVerifier {
    pub fn new(
        annotations: BTreeMap<String, String>,
        resource_ref: Option<String>,
        options: &VerifyOptions,
        collab: Collaborators,
    ) -> Self {
        Self {
            annotations,
            resource_ref: resource_ref.filter(|r| !r.is_empty()),
            public_key: options.public_key().map(str::to_string),
            annotation: options.annotation.clone(),
            collab,
        }
    }

    pub fn resource_ref(&self) -> Option<&str> {
        self.resource_ref.as_deref()
    }

    pub fn verify(&self) -> Result<VerifiedSignature> {
        let bundle = self.signature_bundle()?;
        let key = self.public_key.as_deref();
        let schemes = &self.collab.schemes;
        match SigScheme::classify(key) {
            SigScheme::Unknown => Err(KubesigError::SchemeUnknown),
            SigScheme::Cosign => schemes
                .cosign
                .verify_blob(&bundle, key)
                .map_err(|e| KubesigError::collaborator("cosign blob verification failed", e)),
            SigScheme::Pgp => schemes
                .pgp
                .verify_blob(&bundle.message, &bundle.signature, key)
                .map_err(|e| KubesigError::collaborator("pgp blob verification failed", e)),
            SigScheme::X509 => schemes
                .x509
                .verify_blob(
                    &bundle.message,
                    &bundle.signature,
                    bundle.certificate.as_deref(),
                    key,
                )
                .map_err(|e| KubesigError::collaborator("x509 blob verification failed", e)),
        }
    }

    fn signature_bundle(&self) -> Result<SignatureBundle> {
        match &self.resource_ref {
            Some(r) => {
                let cm = self.collab.config_map(r)?;
                let keys = FieldKeys {
                    message: MESSAGE_KEY,
                    signature: SIGNATURE_KEY,
                    certificate: CERTIFICATE_KEY,
                    bundle: BUNDLE_KEY,
                };
                bundle_from(&cm.data, &keys, &format!("configmap {r}"))
            }
            None => {
                let (message, signature, certificate, bundle) = (
                    self.annotation.message_key(),
                    self.annotation.signature_key(),
                    self.annotation.certificate_key(),
                    self.annotation.bundle_key(),
                );
                let keys = FieldKeys {
                    message: &message,
                    signature: &signature,
                    certificate: &certificate,
                    bundle: &bundle,
                };
                bundle_from(&self.annotations, &keys, "annotations")
            }
        }
    }
}

fn bundle_from(
    source: &BTreeMap<String, String>,
    keys: &FieldKeys<'_>,
    origin: &str,
) -> Result<SignatureBundle> {
    let optional = |k: &str| {
        source
            .get(k)
            .filter(|v| !v.is_empty())
            .map(|v| v.as_bytes().to_vec())
    };
    let required = |k: &str| {
        optional(k).ok_or_else(|| KubesigError::RequiredFieldMissing {
            field: k.to_string(),
            origin: origin.to_string(),
        })
    };
    Ok(SignatureBundle {
        message: required(keys.message)?,
        signature: required(keys.signature)?,
        certificate: optional(keys.certificate),
        bundle: optional(keys.bundle),
    })
}
