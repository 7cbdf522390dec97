use crate::signature::ConfigObject;

/// Registry access: pull an image and flatten the YAML files found in its layers.
pub trait ImageSource: Send + Sync {
    /// Every YAML file inside `image_ref`, joined with `---` document separators.
    fn concat_yamls(&self, image_ref: &str) -> anyhow::Result<Vec<u8>>;
}

/// Read-only cluster access.
pub trait ClusterClient: Send + Sync {
    fn get_config_object(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<ConfigObject>;
}

/// Decides which candidate documents correspond to a live object.
pub trait ManifestMatcher: Send + Sync {
    /// Search `haystack` (concatenated YAML) for documents that describe `needle`.
    ///
    /// Returns `None` when nothing matches. `max_candidates` caps how many
    /// documents are considered; `ignore_fields` are dotted paths skipped when
    /// comparing.
    fn find_manifests(
        &self,
        haystack: &[u8],
        needle: &[u8],
        max_candidates: Option<usize>,
        ignore_fields: &[String],
    ) -> Option<Vec<Vec<u8>>>;
}

/// Computes the drift between a signed manifest and the live object.
pub trait ManifestDiffer: Send + Sync {
    /// `Ok(None)` means no difference outside `ignore_fields`.
    fn diff(
        &self,
        manifest: &[u8],
        object: &[u8],
        ignore_fields: &[String],
    ) -> anyhow::Result<Option<serde_json::Value>>;
}
