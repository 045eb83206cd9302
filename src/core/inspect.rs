//! Archive inspection.
//!
//! Re-hashes every entry of a built archive and compares it against the
//! shipped manifest. The signature's presence is reported but it is not
//! cryptographically verified.

use std::path::Path;

use tracing::debug;

use crate::core::archive;
use crate::core::constants::{MANIFEST_FILE, SIGNATURE_FILE};
use crate::core::manifest::{self, Manifest};
use crate::error::Result;

/// An archive entry whose digest disagrees with the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub name: String,
    pub expected: String,
    pub actual: String,
}

/// What [`inspect`] found in an archive.
#[derive(Debug, Clone, Default)]
pub struct Inspection {
    /// Every entry name with its size in bytes, sorted by name.
    pub entries: Vec<(String, u64)>,
    /// Parsed manifest, if the archive has one.
    pub manifest: Option<Manifest>,
    pub mismatched: Vec<Mismatch>,
    /// Listed in the manifest but absent from the archive.
    pub missing: Vec<String>,
    /// Present in the archive but not listed in the manifest.
    pub unlisted: Vec<String>,
    /// `signature` exists and is non-empty.
    pub signature_present: bool,
}

impl Inspection {
    /// True when the manifest covers exactly the archive's content and a
    /// signature is present.
    pub fn is_valid(&self) -> bool {
        self.manifest.is_some()
            && self.signature_present
            && self.mismatched.is_empty()
            && self.missing.is_empty()
            && self.unlisted.is_empty()
    }
}

/// Inspect the archive at `path`.
///
/// # Errors
///
/// Returns `Error::FileRead` or `Error::ArchiveRead` if the archive cannot be
/// read, and `Error::Manifest` if `manifest.json` is not a valid manifest.
pub fn inspect(path: &Path) -> Result<Inspection> {
    debug!(path = %path.display(), "inspecting archive");
    let contents = archive::read_entries(path)?;

    let manifest = contents
        .get(MANIFEST_FILE)
        .map(|bytes| Manifest::from_json(bytes))
        .transpose()?;

    let mut inspection = Inspection {
        entries: contents
            .iter()
            .map(|(name, bytes)| (name.clone(), bytes.len() as u64))
            .collect(),
        signature_present: contents
            .get(SIGNATURE_FILE)
            .is_some_and(|sig| !sig.is_empty()),
        ..Default::default()
    };

    if let Some(manifest) = &manifest {
        for (name, expected) in manifest.iter() {
            match contents.get(name) {
                Some(bytes) => {
                    let actual = manifest::digest(bytes);
                    if actual != expected {
                        inspection.mismatched.push(Mismatch {
                            name: name.to_string(),
                            expected: expected.to_string(),
                            actual,
                        });
                    }
                }
                None => inspection.missing.push(name.to_string()),
            }
        }
    }

    inspection.unlisted = contents
        .keys()
        .filter(|name| name.as_str() != MANIFEST_FILE && name.as_str() != SIGNATURE_FILE)
        .filter(|name| manifest.as_ref().map_or(true, |m| m.get(name).is_none()))
        .cloned()
        .collect();
    inspection.manifest = manifest;

    debug!(
        entries = inspection.entries.len(),
        mismatched = inspection.mismatched.len(),
        missing = inspection.missing.len(),
        unlisted = inspection.unlisted.len(),
        "inspection complete"
    );
    Ok(inspection)
}
