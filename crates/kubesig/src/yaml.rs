use serde::Deserialize;
use std::collections::BTreeMap;

pub const DOCUMENT_SEPARATOR: &str = "---";

#[derive(Deserialize)]
struct ObjectHead {
    #[serde(default)]
    metadata: Option<MetadataHead>,
}

#[derive(Deserialize)]
struct MetadataHead {
    #[serde(default)]
    annotations: Option<BTreeMap<String, String>>,
}

/// `metadata.annotations` of a YAML object; empty when absent or unparsable.
pub fn annotations_in_yaml(object_yaml: &[u8]) -> BTreeMap<String, String> {
    serde_yaml::from_slice::<ObjectHead>(object_yaml)
        .ok()
        .and_then(|o| o.metadata)
        .and_then(|m| m.annotations)
        .unwrap_or_default()
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end();
    line == DOCUMENT_SEPARATOR || line.starts_with("--- ")
}

/// Split concatenated YAML into its documents, dropping blank ones.
pub fn split_concat_yamls(concat: &[u8]) -> Vec<Vec<u8>> {
    let text = String::from_utf8_lossy(concat);
    let mut docs = Vec::new();
    let mut current = String::new();
    for line in text.split_inclusive('\n') {
        if is_separator(line) {
            push_doc(&mut docs, &mut current);
        } else {
            current.push_str(line);
        }
    }
    push_doc(&mut docs, &mut current);
    docs
}

fn push_doc(docs: &mut Vec<Vec<u8>>, current: &mut String) {
    let doc = std::mem::take(current);
    if !doc.trim().is_empty() {
        docs.push(doc.into_bytes());
    }
}

/// Join documents with `\n---\n`.
pub fn concatenate_yamls<D: AsRef<[u8]>>(docs: &[D]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, d) in docs.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\n---\n");
        }
        out.extend_from_slice(d.as_ref());
    }
    out
}
