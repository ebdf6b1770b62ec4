//! Hashing System - SHA-256 for generated artifacts
//!
//! A manifest of content hashes lets two runs be compared for
//! reproducibility without diffing every file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::file::GeneratedArtifact;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    serde_json::to_string(&sort_value(v))
}

fn sort_value(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_value(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_value).collect()),
        other => other,
    }
}

pub fn artifact_hash(artifact: &GeneratedArtifact) -> String {
    sha256_hex(artifact.content.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationManifest {
    pub generator: String,
    pub version: String,
    pub files: Vec<ManifestEntry>,
    pub manifest_hash: String,
}

impl GenerationManifest {
    /// manifest_hash = sha256(canonical json of generator, version and files)
    pub fn build(
        generator: &str,
        version: &str,
        artifacts: &[GeneratedArtifact],
    ) -> Result<Self, serde_json::Error> {
        let files: Vec<ManifestEntry> = artifacts
            .iter()
            .map(|a| ManifestEntry {
                name: a.name.clone(),
                hash: artifact_hash(a),
            })
            .collect();
        let canonical = canonical_json(&serde_json::json!({
            "generator": generator,
            "version": version,
            "files": files,
        }))?;
        Ok(Self {
            generator: generator.to_string(),
            version: version.to_string(),
            files,
            manifest_hash: sha256_hex(canonical.as_bytes()),
        })
    }
}
