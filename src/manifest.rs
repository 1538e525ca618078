//! Manifest generation.
//!
//! After a successful commit the engine writes a lock-file-shaped YAML
//! document under the destination's reserved directory describing what
//! was rendered from where with which inputs, anchored to SHA-256
//! content hashes. Field order is fixed for determinism; two renders
//! with the same template, inputs, and clock produce byte-identical
//! manifests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::SecondsFormat;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::form_urlencoded;
use walkdir::WalkDir;

use crate::clock::Clock;
use crate::constants::RESERVED_DIR;
use crate::error::{Error, Result};
use crate::scratch::hash_file;
use crate::source::DownloadMetadata;
use crate::walk::slash_path;

/// The manifest document's own schema version, independent of the spec
/// document versions.
pub const MANIFEST_API_VERSION: &str = "cli.abcxyz.dev/v1beta3";

pub const KIND_MANIFEST: &str = "Manifest";

const MANIFEST_HEADER: &str = "# Generated by the stencil render command. Do not modify.\n";

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub creation_time: String,
    pub modification_time: String,
    pub template_location: String,
    pub location_type: String,
    pub template_version: String,
    pub template_dirhash: String,
    pub inputs: Vec<ManifestInput>,
    pub output_hashes: Vec<OutputHash>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestInput {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputHash {
    pub file: String,
    pub hash: String,
}

/// Writes the manifest for a completed render and returns its path.
pub fn write_manifest(
    dest_dir: &Path,
    template_dir: &Path,
    meta: &DownloadMetadata,
    inputs: &BTreeMap<String, String>,
    output_hashes: &BTreeMap<String, [u8; 32]>,
    clock: &dyn Clock,
) -> Result<PathBuf> {
    let now = clock
        .now_utc()
        .to_rfc3339_opts(SecondsFormat::Nanos, true);

    let manifest = Manifest {
        api_version: MANIFEST_API_VERSION.to_string(),
        kind: KIND_MANIFEST.to_string(),
        creation_time: now.clone(),
        modification_time: now.clone(),
        template_location: meta.canonical_source.clone(),
        location_type: meta
            .location_type
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        template_version: meta.version.clone(),
        template_dirhash: dir_hash(template_dir)?,
        inputs: inputs
            .iter()
            .map(|(name, value)| ManifestInput { name: name.clone(), value: value.clone() })
            .collect(),
        output_hashes: output_hashes
            .iter()
            .map(|(file, digest)| OutputHash {
                file: file.clone(),
                hash: encode_hash(digest),
            })
            .collect(),
    };

    let body = serde_yaml::to_string(&manifest).map_err(|e| {
        Error::io_msg(std::io::ErrorKind::InvalidData, format!("serializing manifest: {}", e))
    })?;

    let reserved = dest_dir.join(RESERVED_DIR);
    fs::create_dir_all(&reserved)?;
    let path = reserved.join(format!(
        "manifest_{}_{}.lock.yaml",
        location_slug(&manifest.template_location),
        now
    ));
    debug!("writing manifest {}", path.display());
    fs::write(&path, format!("{}{}", MANIFEST_HEADER, body))?;
    Ok(path)
}

/// `h1:` followed by the base64 of a SHA-256 digest.
pub fn encode_hash(digest: &[u8; 32]) -> String {
    format!("h1:{}", BASE64.encode(digest))
}

/// Percent-encoded canonical source, or `nolocation` when there is
/// none, for the manifest file name.
fn location_slug(canonical_source: &str) -> String {
    if canonical_source.is_empty() {
        return "nolocation".to_string();
    }
    form_urlencoded::byte_serialize(canonical_source.as_bytes()).collect()
}

/// Deterministic hash of the template input tree, excluding the
/// reserved directory: the sorted `<sha256-hex>  <slash-relpath>`
/// lines, each newline-terminated, hashed once more with SHA-256 and
/// base64-encoded.
pub fn dir_hash(template_dir: &Path) -> Result<String> {
    let mut lines = Vec::new();
    for entry in WalkDir::new(template_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(template_dir)
            .expect("walkdir yields paths under its root");
        if rel.starts_with(RESERVED_DIR) {
            continue;
        }
        let digest = hash_file(entry.path())?;
        lines.push(format!("{}  {}\n", hex_encode(&digest), slash_path(rel)));
    }
    lines.sort();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
    }
    let digest: [u8; 32] = hasher.finalize().into();
    Ok(encode_hash(&digest))
}

fn hex_encode(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
