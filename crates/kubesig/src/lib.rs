//! kubesig
//!
//! Decides whether a live cluster object matches a signed manifest, and who
//! signed it.
//! - Picks where the signature lives: an OCI image, a ConfigMap, or the object's
//!   own annotations.
//! - Verifies it with the right scheme (cosign, PGP, X.509), trying each key.
//! - Finds the signed manifest that corresponds to the object.
//! - Memoizes image pulls and image verifications in a shared cache.
//!
//! All calls block. Registry, cluster and crypto work happens in the injected
//! [`Collaborators`].

pub mod artifact;
pub mod cache;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod keys;
pub mod paths;
pub mod reference;
pub mod resource;
pub mod verify;
pub mod yaml;

pub use cache::{CacheStore, FileCache, MemoryCache, ResultCache};
pub use collaborators::{Collaborators, SignatureSchemes};
pub use config::{AnnotationConfig, VerifyOptions};
pub use errors::{ErrorKind, KubesigError, Result};
pub use fetch::{BlobManifestFetcher, FetchedManifests, ImageManifestFetcher, ManifestFetcher};
pub use keys::{PublicKeyList, SigScheme};
pub use reference::{SigRef, EMBEDDED_IN_ANNOTATION, IN_CLUSTER_PREFIX};
pub use resource::{verify_resource, VerifyResult};
pub use verify::{BlobSignatureVerifier, ImageSignatureVerifier, SignatureVerifier};

pub use kubesig_abi as abi;
