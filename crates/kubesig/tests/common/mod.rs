//! In-memory collaborators that record how the engine drives them.

#![allow(dead_code)]

use anyhow::anyhow;
use kubesig::abi::{
    ClusterClient, ConfigObject, CosignBlobVerifier, ImageSource, ImageVerifier, ManifestDiffer,
    ManifestMatcher, PgpBlobVerifier, SignatureBundle, VerifiedSignature, X509BlobVerifier,
};
use kubesig::yaml::split_concat_yamls;
use kubesig::{Collaborators, ResultCache, SignatureSchemes};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const DOMAIN: &str = "sigstore.example";
pub const IMAGE_REF_ANNO: &str = "sigstore.example/imageRef";
pub const MESSAGE_ANNO: &str = "sigstore.example/message";
pub const SIGNATURE_ANNO: &str = "sigstore.example/signature";
pub const CERTIFICATE_ANNO: &str = "sigstore.example/certificate";

pub fn object(kind: &str, name: &str, annotations: &[(&str, &str)]) -> Vec<u8> {
    let mut y = format!("apiVersion: v1\nkind: {kind}\nmetadata:\n  name: {name}\n");
    if !annotations.is_empty() {
        y.push_str("  annotations:\n");
        for (k, v) in annotations {
            y.push_str(&format!("    {k}: \"{v}\"\n"));
        }
    }
    y.into_bytes()
}

#[derive(Default)]
pub struct FakeImages {
    pub images: HashMap<String, Vec<u8>>,
    pub pulls: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn with(mut self, image_ref: &str, docs: &[&str]) -> Self {
        self.images
            .insert(image_ref.to_string(), docs.join("\n---\n").into_bytes());
        self
    }

    pub fn pulls(&self) -> Vec<String> {
        self.pulls.lock().unwrap().clone()
    }
}

impl ImageSource for FakeImages {
    fn concat_yamls(&self, image_ref: &str) -> anyhow::Result<Vec<u8>> {
        self.pulls.lock().unwrap().push(image_ref.to_string());
        self.images
            .get(image_ref)
            .cloned()
            .ok_or_else(|| anyhow!("MANIFEST_UNKNOWN: {image_ref}"))
    }
}

#[derive(Default)]
pub struct FakeCluster {
    pub objects: HashMap<(String, String), ConfigObject>,
}

impl FakeCluster {
    pub fn with(mut self, cm: ConfigObject) -> Self {
        self.objects
            .insert((cm.namespace.clone(), cm.name.clone()), cm);
        self
    }
}

impl ClusterClient for FakeCluster {
    fn get_config_object(
        &self,
        _kind: &str,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<ConfigObject> {
        self.objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("configmaps \"{name}\" not found"))
    }
}

/// Matches documents with the same kind and metadata.name as the needle.
pub struct KindNameMatcher;

fn kind_and_name(doc: &[u8]) -> Option<(String, String)> {
    let v: serde_yaml::Value = serde_yaml::from_slice(doc).ok()?;
    let kind = v.get("kind")?.as_str()?.to_string();
    let name = v.get("metadata")?.get("name")?.as_str()?.to_string();
    Some((kind, name))
}

impl ManifestMatcher for KindNameMatcher {
    fn find_manifests(
        &self,
        haystack: &[u8],
        needle: &[u8],
        max_candidates: Option<usize>,
        _ignore_fields: &[String],
    ) -> Option<Vec<Vec<u8>>> {
        let want = kind_and_name(needle)?;
        let found: Vec<Vec<u8>> = split_concat_yamls(haystack)
            .into_iter()
            .filter(|d| kind_and_name(d).as_ref() == Some(&want))
            .take(max_candidates.unwrap_or(usize::MAX))
            .collect();
        (!found.is_empty()).then_some(found)
    }
}

/// Reports drift when kind or name differ.
pub struct LineDiffer;

impl ManifestDiffer for LineDiffer {
    fn diff(
        &self,
        manifest: &[u8],
        object: &[u8],
        _ignore_fields: &[String],
    ) -> anyhow::Result<Option<serde_json::Value>> {
        let m = kind_and_name(manifest);
        let o = kind_and_name(object);
        if m == o {
            Ok(None)
        } else {
            Ok(Some(serde_json::json!({"manifest": format!("{m:?}"), "object": format!("{o:?}")})))
        }
    }
}

/// Image verifier with a fixed answer per key; records every call.
#[derive(Default)]
pub struct FakeImageVerifier {
    pub answers: HashMap<String, Result<VerifiedSignature, String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeImageVerifier {
    pub fn answer(mut self, key: &str, answer: Result<(&str, i64), &str>) -> Self {
        let answer = answer
            .map(|(signer, ts)| VerifiedSignature::new(signer, Some(ts)))
            .map_err(str::to_string);
        self.answers.insert(key.to_string(), answer);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageVerifier for FakeImageVerifier {
    fn verify_image(&self, image_ref: &str, key: Option<&str>) -> anyhow::Result<VerifiedSignature> {
        let key = key.unwrap_or("");
        self.calls.lock().unwrap().push(key.to_string());
        match self.answers.get(key) {
            Some(Ok(sig)) => Ok(sig.clone()),
            Some(Err(e)) => Err(anyhow!("{e}")),
            None => Err(anyhow!("no signatures found for {image_ref}")),
        }
    }
}

/// Records which blob scheme ran, and with which inputs.
#[derive(Default)]
pub struct SchemeLog {
    pub calls: Mutex<Vec<(String, SignatureBundle, Option<String>)>>,
}

impl SchemeLog {
    fn record(
        &self,
        scheme: &str,
        bundle: SignatureBundle,
        key: Option<&str>,
    ) -> anyhow::Result<VerifiedSignature> {
        self.calls
            .lock()
            .unwrap()
            .push((scheme.to_string(), bundle, key.map(str::to_string)));
        if key.is_some_and(|k| k.ends_with("reject")) {
            return Err(anyhow!("{scheme}: invalid signature"));
        }
        Ok(VerifiedSignature::new(format!("{scheme}-signer"), None))
    }

    pub fn schemes(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(s, _, _)| s.clone())
            .collect()
    }

    pub fn last_bundle(&self) -> Option<SignatureBundle> {
        self.calls.lock().unwrap().last().map(|(_, b, _)| b.clone())
    }
}

impl CosignBlobVerifier for SchemeLog {
    fn verify_blob(
        &self,
        bundle: &SignatureBundle,
        key: Option<&str>,
    ) -> anyhow::Result<VerifiedSignature> {
        self.record("cosign", bundle.clone(), key)
    }
}

impl PgpBlobVerifier for SchemeLog {
    fn verify_blob(
        &self,
        message: &[u8],
        signature: &[u8],
        key: Option<&str>,
    ) -> anyhow::Result<VerifiedSignature> {
        let bundle = SignatureBundle {
            message: message.to_vec(),
            signature: signature.to_vec(),
            certificate: None,
            bundle: None,
        };
        self.record("pgp", bundle, key)
    }
}

impl X509BlobVerifier for SchemeLog {
    fn verify_blob(
        &self,
        message: &[u8],
        signature: &[u8],
        certificate: Option<&[u8]>,
        key: Option<&str>,
    ) -> anyhow::Result<VerifiedSignature> {
        let bundle = SignatureBundle {
            message: message.to_vec(),
            signature: signature.to_vec(),
            certificate: certificate.map(<[u8]>::to_vec),
            bundle: None,
        };
        self.record("x509", bundle, key)
    }
}

/// Handles onto the fakes, so tests can inspect them after the engine ran.
pub struct Harness {
    pub images: Arc<FakeImages>,
    pub verifier: Arc<FakeImageVerifier>,
    pub schemes: Arc<SchemeLog>,
    pub cache: ResultCache,
    pub collab: Collaborators,
}

pub fn harness(images: FakeImages, cluster: FakeCluster, verifier: FakeImageVerifier) -> Harness {
    let images = Arc::new(images);
    let verifier = Arc::new(verifier);
    let schemes = Arc::new(SchemeLog::default());
    let cache = ResultCache::in_memory();
    let collab = Collaborators {
        images: images.clone(),
        cluster: Arc::new(cluster),
        matcher: Arc::new(KindNameMatcher),
        differ: Arc::new(LineDiffer),
        schemes: SignatureSchemes {
            image: verifier.clone(),
            cosign: schemes.clone(),
            pgp: schemes.clone(),
            x509: schemes.clone(),
        },
        cache: cache.clone(),
    };
    Harness {
        images,
        verifier,
        schemes,
        cache,
        collab,
    }
}
