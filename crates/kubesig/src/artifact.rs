//! Signed-message artifacts.
//!
//! A message is base64 text wrapping a gzip of a `.tar.gz` whose YAML files are
//! the signed manifests.

use crate::errors::ArtifactError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Cursor, Read, Write};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MAX_GZIP_LAYERS: usize = 4;
/// Upper bound on what a single gzip layer may expand to.
pub const MAX_DECOMPRESSED_BYTES: u64 = 64 * 1024 * 1024;

/// Decode a message into the YAML files it carries, in archive order.
pub fn decode_message(base64_text: &[u8]) -> Result<Vec<Vec<u8>>, ArtifactError> {
    let compact: Vec<u8> = base64_text
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let raw = STANDARD.decode(compact)?;
    let tarball = strip_gzip(raw, MAX_DECOMPRESSED_BYTES)?;
    yamls_in_tar(&tarball)
}

fn strip_gzip(mut data: Vec<u8>, limit: u64) -> Result<Vec<u8>, ArtifactError> {
    for _ in 0..MAX_GZIP_LAYERS {
        if !data.starts_with(&GZIP_MAGIC) {
            break;
        }
        let mut out = Vec::new();
        GzDecoder::new(&data[..])
            .take(limit + 1)
            .read_to_end(&mut out)?;
        if out.len() as u64 > limit {
            return Err(ArtifactError::TooLarge { limit });
        }
        data = out;
    }
    Ok(data)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn yamls_in_tar(tarball: &[u8]) -> Result<Vec<Vec<u8>>, ArtifactError> {
    let mut archive = tar::Archive::new(Cursor::new(tarball));
    let mut yamls = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() || !is_yaml(&entry.path()?) {
            continue;
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        yamls.push(buf);
    }
    if yamls.is_empty() {
        return Err(ArtifactError::Empty);
    }
    Ok(yamls)
}

/// Inverse of [`decode_message`]: tar the files, gzip twice, base64.
pub fn encode_message<P: AsRef<str>, D: AsRef<[u8]>>(
    files: &[(P, D)],
) -> Result<String, ArtifactError> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in files {
        let data = data.as_ref();
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        builder.append_data(&mut header, path.as_ref(), data)?;
    }
    let tarball = builder.into_inner()?;
    let targz = gzip(&tarball)?;
    Ok(STANDARD.encode(gzip(&targz)?))
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, ArtifactError> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}
