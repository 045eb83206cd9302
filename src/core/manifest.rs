//! Manifest building.
//!
//! The manifest maps each archive entry name to the SHA-1 of its bytes. Its
//! serialized form is what gets signed, so the bytes written to
//! `manifest.json` and the bytes handed to the signer are the same buffer.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Entry name to lowercase hex SHA-1 digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Digest recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Record a digest. A repeated name replaces the earlier digest.
    pub fn insert(&mut self, name: impl Into<String>, digest: impl Into<String>) {
        self.entries.insert(name.into(), digest.into());
    }

    /// Serialize to the JSON bytes that are written and signed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse `manifest.json` bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the bytes are not a JSON object of strings.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Lowercase hex SHA-1 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Read `path` and digest it, attributing failures to entry `name`.
///
/// # Errors
///
/// Returns `Error::FileRead` if the file cannot be read.
pub fn digest_file(name: &str, path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::FileRead {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    let hash = digest(&bytes);
    trace!(name, len = bytes.len(), digest = %hash, "hashed entry");
    Ok(hash)
}

/// Build a manifest over `(entry name, path)` pairs.
///
/// Every file is read fresh; nothing is cached between calls.
///
/// # Errors
///
/// Returns `Error::FileRead` naming the first unreadable entry. No partial
/// manifest is returned.
pub fn build<N, P>(entries: &[(N, P)]) -> Result<Manifest>
where
    N: AsRef<str>,
    P: AsRef<Path>,
{
    let mut manifest = Manifest::default();
    for (name, path) in entries {
        let name = name.as_ref();
        manifest.insert(name, digest_file(name, path.as_ref())?);
    }
    debug!(entries = manifest.len(), "manifest built");
    Ok(manifest)
}
