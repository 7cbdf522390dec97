use super::{FetchedManifests, MatchSettings};
use crate::artifact::decode_message;
use crate::collaborators::Collaborators;
use crate::config::{AnnotationConfig, VerifyOptions};
use crate::errors::{KubesigError, Result};
use crate::reference::{split_comma_separated, EMBEDDED_IN_ANNOTATION};
use crate::yaml::{annotations_in_yaml, concatenate_yamls};
use kubesig_abi::MESSAGE_KEY;
use tracing::debug;

/// Finds signed manifests inside a signed message, carried either by ConfigMaps
/// or by the object's own annotations.
pub struct BlobManifestFetcher {
    resource_ref: Option<String>,
    annotation: AnnotationConfig,
    matching: MatchSettings,
    collab: Collaborators,
}

impl BlobManifestFetcher {
    pub fn new(resource_ref: Option<String>, options: &VerifyOptions, collab: Collaborators) -> Self {
        Self {
            resource_ref: resource_ref.filter(|r| !r.is_empty()),
            annotation: options.annotation.clone(),
            matching: MatchSettings::from_options(options),
            collab,
        }
    }

    pub fn resource_ref(&self) -> Option<&str> {
        self.resource_ref.as_deref()
    }

    pub fn fetch(&self, object_yaml: &[u8]) -> Result<Option<FetchedManifests>> {
        if let Some(refs) = &self.resource_ref {
            return self.fetch_from_resources(refs, object_yaml).map(Some);
        }

        let annotations = annotations_in_yaml(object_yaml);
        let Some(message) = annotations.get(&self.annotation.message_key()) else {
            debug!("no signature found in the annotations");
            return Ok(None);
        };
        let yamls = decode_message(message.as_bytes()).map_err(|e| KubesigError::Decode {
            origin: "annotation message".into(),
            source: e,
        })?;
        let concat = concatenate_yamls(&yamls);
        match self
            .matching
            .find(self.collab.matcher.as_ref(), &concat, object_yaml)
        {
            Some(manifests) => Ok(Some(FetchedManifests {
                manifests,
                reference: EMBEDDED_IN_ANNOTATION.to_string(),
            })),
            None => Err(KubesigError::ManifestNotFound {
                origin: "gzipped message".into(),
                attempts: Vec::new(),
            }),
        }
    }

    fn fetch_from_resources(&self, refs: &str, object_yaml: &[u8]) -> Result<FetchedManifests> {
        let refs = split_comma_separated(refs);
        if refs.is_empty() {
            return Err(KubesigError::ReferenceMissing("signature resource"));
        }

        self.matching.first_match(
            self.collab.matcher.as_ref(),
            refs,
            "specified signature configmaps",
            object_yaml,
            |resource_ref| self.manifest_in_single_config_map(resource_ref),
        )
    }

    fn manifest_in_single_config_map(&self, resource_ref: &str) -> Result<Vec<u8>> {
        let cm = self.collab.config_map(resource_ref)?;
        let origin = format!("configmap {}", cm.name);
        let message = cm
            .data
            .get(MESSAGE_KEY)
            .ok_or_else(|| KubesigError::RequiredFieldMissing {
                field: MESSAGE_KEY.to_string(),
                origin: origin.clone(),
            })?;
        let yamls = decode_message(message.as_bytes())
            .map_err(|e| KubesigError::Decode { origin, source: e })?;
        Ok(concatenate_yamls(&yamls))
    }
}
