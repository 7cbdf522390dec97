use crate::cache::ResultCache;
use crate::errors::{KubesigError, Result};
use crate::reference::ResourceRef;
use kubesig_abi::{
    ClusterClient, ConfigObject, CosignBlobVerifier, ImageSource, ImageVerifier, ManifestDiffer,
    ManifestMatcher, PgpBlobVerifier, X509BlobVerifier,
};
use std::sync::Arc;

/// Per-scheme verification dispatchers.
#[derive(Clone)]
pub struct SignatureSchemes {
    pub image: Arc<dyn ImageVerifier>,
    pub cosign: Arc<dyn CosignBlobVerifier>,
    pub pgp: Arc<dyn PgpBlobVerifier>,
    pub x509: Arc<dyn X509BlobVerifier>,
}

/// Everything the engine talks to, injected once and shared by every
/// verifier and fetcher built from it.
#[derive(Clone)]
pub struct Collaborators {
    pub images: Arc<dyn ImageSource>,
    pub cluster: Arc<dyn ClusterClient>,
    pub matcher: Arc<dyn ManifestMatcher>,
    pub differ: Arc<dyn ManifestDiffer>,
    pub schemes: SignatureSchemes,
    pub cache: ResultCache,
}

impl Collaborators {
    /// Resolve a `k8s://ConfigMap/NS/NAME` reference to its object.
    pub fn config_map(&self, reference: &str) -> Result<ConfigObject> {
        let r = ResourceRef::config_map(reference)?;
        self.cluster
            .get_config_object(&r.kind, &r.namespace, &r.name)
            .map_err(|e| KubesigError::collaborator("failed to get a configmap", e))
    }
}
