use super::{FetchedManifests, MatchSettings};
use crate::cache::FetchManifestRecord;
use crate::collaborators::Collaborators;
use crate::config::{AnnotationConfig, VerifyOptions};
use crate::errors::{KubesigError, Result};
use crate::reference::split_comma_separated;
use crate::yaml::{annotations_in_yaml, split_concat_yamls};
use tracing::{debug, warn};

const IMAGE_CONTEXT: &str = "failed to get YAMLs in the image";

/// Finds signed manifests inside OCI images.
pub struct ImageManifestFetcher {
    image_ref: String,
    annotation: AnnotationConfig,
    matching: MatchSettings,
    cache_enabled: bool,
    collab: Collaborators,
}

impl ImageManifestFetcher {
    /// `image_ref` may be a comma-separated list, or empty to defer to the
    /// object's image-ref annotation at fetch time.
    pub fn new<S: Into<String>>(image_ref: S, options: &VerifyOptions, collab: Collaborators) -> Self {
        Self {
            image_ref: image_ref.into(),
            annotation: options.annotation.clone(),
            matching: MatchSettings::from_options(options),
            cache_enabled: true,
            collab,
        }
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    pub fn image_ref(&self) -> &str {
        &self.image_ref
    }

    pub fn fetch(&self, object_yaml: &[u8]) -> Result<FetchedManifests> {
        let image_refs = if self.image_ref.is_empty() {
            annotations_in_yaml(object_yaml)
                .remove(&self.annotation.image_ref_key())
                .map(|s| split_comma_separated(&s))
                .unwrap_or_default()
        } else {
            split_comma_separated(&self.image_ref)
        };
        if image_refs.is_empty() {
            return Err(KubesigError::ReferenceMissing("image"));
        }

        self.matching.first_match(
            self.collab.matcher.as_ref(),
            image_refs,
            "image",
            object_yaml,
            |image_ref| self.manifest_in_single_image(image_ref),
        )
    }

    /// Every document of every configured image, in image order.
    ///
    /// Only the explicitly configured reference is used; with none configured
    /// the result is empty.
    pub fn fetch_all(&self) -> Result<Vec<Vec<u8>>> {
        let mut yamls = Vec::new();
        for image_ref in split_comma_separated(&self.image_ref) {
            let concat = self.manifest_in_single_image(&image_ref)?;
            yamls.extend(split_concat_yamls(&concat));
        }
        Ok(yamls)
    }

    fn manifest_in_single_image(&self, image_ref: &str) -> Result<Vec<u8>> {
        if self.cache_enabled {
            match self.collab.cache.get_fetch_manifest(image_ref) {
                Ok(Some(FetchManifestRecord { error: Some(e), .. })) => {
                    return Err(KubesigError::collaborator(IMAGE_CONTEXT, anyhow::anyhow!(e)))
                }
                Ok(Some(record)) => return Ok(record.payload),
                Ok(None) => {}
                Err(e) => warn!(image_ref, error = %e, "ignoring cached manifest"),
            }
            debug!(image_ref, "image manifest cache not found");
        }

        let concat = self
            .collab
            .images
            .concat_yamls(image_ref)
            .map_err(|e| KubesigError::collaborator(IMAGE_CONTEXT, e))?;
        if self.cache_enabled {
            self.collab
                .cache
                .set_fetch_manifest(image_ref, &FetchManifestRecord::payload(concat.clone()));
        }
        Ok(concat)
    }
}
