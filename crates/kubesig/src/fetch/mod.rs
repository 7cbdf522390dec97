//! Locating the signed manifest that corresponds to a live object.

mod blob;
mod image;

pub use blob::BlobManifestFetcher;
pub use image::ImageManifestFetcher;

use crate::collaborators::Collaborators;
use crate::config::VerifyOptions;
use crate::errors::{KubesigError, Result};
use crate::reference::SigRef;
use crate::yaml::annotations_in_yaml;
use kubesig_abi::ManifestMatcher;
use tracing::debug;

/// Matched candidate manifests and the single reference they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedManifests {
    pub manifests: Vec<Vec<u8>>,
    pub reference: String,
}

/// Matcher knobs carried by every fetcher.
#[derive(Debug, Clone, Default)]
pub(crate) struct MatchSettings {
    ignore_fields: Vec<String>,
    max_candidates: Option<usize>,
}

impl MatchSettings {
    pub(crate) fn from_options(options: &VerifyOptions) -> Self {
        Self {
            ignore_fields: options.ignore_fields.clone(),
            max_candidates: options.max_candidates(),
        }
    }

    pub(crate) fn find(
        &self,
        matcher: &dyn ManifestMatcher,
        concat_yamls: &[u8],
        object_yaml: &[u8],
    ) -> Option<Vec<Vec<u8>>> {
        matcher
            .find_manifests(
                concat_yamls,
                object_yaml,
                self.max_candidates,
                &self.ignore_fields,
            )
            .filter(|found| !found.is_empty())
    }

    /// Try each reference in order and return the first one whose documents
    /// match `object_yaml`.
    ///
    /// A reference that cannot be loaded is skipped. If no reference could be
    /// loaded at all, the last load error is returned as is; `ManifestNotFound`
    /// is reserved for "searched, nothing matched".
    pub(crate) fn first_match<F>(
        &self,
        matcher: &dyn ManifestMatcher,
        refs: Vec<String>,
        origin: &str,
        object_yaml: &[u8],
        mut load: F,
    ) -> Result<FetchedManifests>
    where
        F: FnMut(&str) -> Result<Vec<u8>>,
    {
        let mut attempts = Vec::new();
        let mut last_err = None;
        let mut searched = false;
        for reference in refs {
            let concat = match load(&reference) {
                Ok(c) => c,
                Err(e) => {
                    debug!(reference = %reference, error = %e, "trying next reference");
                    attempts.push(format!("{reference}: {e}"));
                    last_err = Some(e);
                    continue;
                }
            };
            searched = true;
            match self.find(matcher, &concat, object_yaml) {
                Some(manifests) => {
                    return Ok(FetchedManifests {
                        manifests,
                        reference,
                    })
                }
                None => attempts.push(format!("{reference}: no matching manifest")),
            }
        }
        match last_err {
            Some(e) if !searched => Err(e),
            _ => Err(KubesigError::ManifestNotFound {
                origin: origin.to_string(),
                attempts,
            }),
        }
    }
}

pub enum ManifestFetcher {
    Image(ImageManifestFetcher),
    Blob(BlobManifestFetcher),
}

impl ManifestFetcher {
    /// Same precedence as [`crate::SignatureVerifier::new`].
    pub fn new(
        object_yaml: &[u8],
        sig_ref: Option<&str>,
        options: &VerifyOptions,
        collab: Collaborators,
    ) -> Self {
        let annotations = annotations_in_yaml(object_yaml);
        match SigRef::resolve(sig_ref, &annotations, &options.annotation) {
            SigRef::Image(image_ref) => {
                ManifestFetcher::Image(ImageManifestFetcher::new(image_ref, options, collab))
            }
            SigRef::Resource(resource_ref) => {
                ManifestFetcher::Blob(BlobManifestFetcher::new(Some(resource_ref), options, collab))
            }
            SigRef::Embedded => ManifestFetcher::Blob(BlobManifestFetcher::new(None, options, collab)),
        }
    }

    /// `Ok(None)` means the object carries no signature at all.
    pub fn fetch(&self, object_yaml: &[u8]) -> Result<Option<FetchedManifests>> {
        match self {
            ManifestFetcher::Image(f) => f.fetch(object_yaml).map(Some),
            ManifestFetcher::Blob(f) => f.fetch(object_yaml),
        }
    }

    pub fn as_image(&self) -> Option<&ImageManifestFetcher> {
        match self {
            ManifestFetcher::Image(f) => Some(f),
            ManifestFetcher::Blob(_) => None,
        }
    }

    pub fn sig_ref(&self) -> SigRef {
        match self {
            ManifestFetcher::Image(f) => SigRef::Image(f.image_ref().to_string()),
            ManifestFetcher::Blob(f) => match f.resource_ref() {
                Some(r) => SigRef::Resource(r.to_string()),
                None => SigRef::Embedded,
            },
        }
    }
}
