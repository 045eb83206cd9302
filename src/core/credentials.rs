//! Signing credential resolution.
//!
//! Certificates and keys arrive either as paths on disk or as inline bytes.
//! The signer only understands paths, so inline material is written to
//! owner-only temp files which [`ResolvedCredentials`] owns and deletes on
//! [`dispose`](ResolvedCredentials::dispose) or drop, whichever comes first.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::Deserialize;
use tempfile::TempPath;
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::core::constants::CREDENTIAL_PREFIX;
use crate::error::{Error, Result};

/// Where a certificate or private key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A PEM file on disk, owned by the caller.
    FilePath(PathBuf),
    /// PEM bytes held in memory.
    InlineContent(Vec<u8>),
}

impl CredentialSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::FilePath(path.into())
    }

    pub fn inline(bytes: impl Into<Vec<u8>>) -> Self {
        Self::InlineContent(bytes.into())
    }
}

// Inline content may be a private key; never print it.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilePath(path) => f.debug_tuple("FilePath").field(path).finish(),
            Self::InlineContent(bytes) => write!(f, "InlineContent(<{} bytes>)", bytes.len()),
        }
    }
}

/// A credential as written in a config file, before validation.
///
/// Exactly one of the fields must be set.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCredentialSource {
    pub path: Option<PathBuf>,
    pub pem: Option<String>,
    pub base64: Option<String>,
}

impl RawCredentialSource {
    /// Validate into a [`CredentialSource`].
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCredentialSource` unless exactly one of
    /// `path`, `pem` or `base64` is set, or if `base64` does not decode.
    pub fn validate(&self, role: &str) -> Result<CredentialSource> {
        match (&self.path, &self.pem, &self.base64) {
            (Some(path), None, None) => Ok(CredentialSource::FilePath(path.clone())),
            (None, Some(pem), None) => Ok(CredentialSource::InlineContent(pem.as_bytes().to_vec())),
            (None, None, Some(encoded)) => base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map(CredentialSource::InlineContent)
                .map_err(|e| {
                    Error::InvalidCredentialSource(format!("{}: invalid base64: {}", role, e))
                }),
            (None, None, None) => Err(Error::InvalidCredentialSource(format!(
                "{}: expected one of `path`, `pem` or `base64`",
                role
            ))),
            _ => Err(Error::InvalidCredentialSource(format!(
                "{}: `path`, `pem` and `base64` are mutually exclusive",
                role
            ))),
        }
    }
}

/// Credentials needed to sign a manifest.
pub struct SigningCredentials {
    /// Intermediate (WWDR) certificate appended to the signature's chain.
    pub wwdr: CredentialSource,
    /// Leaf signing certificate.
    pub signer_cert: CredentialSource,
    /// Private key matching `signer_cert`.
    pub signer_key: CredentialSource,
    password: Option<Zeroizing<String>>,
}

impl SigningCredentials {
    pub fn new(
        wwdr: CredentialSource,
        signer_cert: CredentialSource,
        signer_key: CredentialSource,
    ) -> Self {
        Self {
            wwdr,
            signer_cert,
            signer_key,
            password: None,
        }
    }

    /// Set the private key decryption password.
    pub fn with_password(self, password: impl Into<String>) -> Self {
        self.with_zeroizing_password(Zeroizing::new(password.into()))
    }

    /// Set the password from a buffer that is already wiped on drop.
    pub fn with_zeroizing_password(mut self, password: Zeroizing<String>) -> Self {
        self.password = Some(password);
        self
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("wwdr", &self.wwdr)
            .field("signer_cert", &self.signer_cert)
            .field("signer_key", &self.signer_key)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Credentials with every source backed by a file.
///
/// Temp files created for inline sources are deleted by [`dispose`] and,
/// as a backstop, when the value is dropped.
///
/// [`dispose`]: ResolvedCredentials::dispose
pub struct ResolvedCredentials {
    pub wwdr: PathBuf,
    pub signer_cert: PathBuf,
    pub signer_key: PathBuf,
    password: Option<Zeroizing<String>>,
    owned: Vec<TempPath>,
}

impl ResolvedCredentials {
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }

    /// Temp files this value will delete.
    pub fn owned_paths(&self) -> Vec<&Path> {
        self.owned.iter().map(|p| &**p).collect()
    }

    /// Delete every owned temp file.
    ///
    /// Files that are already gone count as cleaned. Calling this more than
    /// once is a no-op after the first call.
    pub fn dispose(&mut self) {
        if self.owned.is_empty() {
            return;
        }
        debug!(files = self.owned.len(), "disposing credential temp files");
        for temp in self.owned.drain(..) {
            let path = temp.to_path_buf();
            match temp.close() {
                Ok(()) => trace!(path = %path.display(), "removed credential file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove credential file")
                }
            }
        }
    }
}

impl Drop for ResolvedCredentials {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("wwdr", &self.wwdr)
            .field("signer_cert", &self.signer_cert)
            .field("signer_key", &self.signer_key)
            .field("owned", &self.owned_paths())
            .finish_non_exhaustive()
    }
}

/// Turn every credential source into a file path.
///
/// `FilePath` sources pass through untouched. `InlineContent` sources are
/// written to fresh temp files in the system temp directory. If any write
/// fails, files created so far are removed before returning.
///
/// # Errors
///
/// Returns `Error::FileWrite` if a temp file cannot be created or written.
pub fn resolve(credentials: &SigningCredentials) -> Result<ResolvedCredentials> {
    let mut owned = Vec::new();

    let wwdr = materialize(&credentials.wwdr, &mut owned)?;
    let signer_cert = materialize(&credentials.signer_cert, &mut owned)?;
    let signer_key = materialize(&credentials.signer_key, &mut owned)?;

    debug!(temp_files = owned.len(), "credentials resolved");

    Ok(ResolvedCredentials {
        wwdr,
        signer_cert,
        signer_key,
        password: credentials.password.clone(),
        owned,
    })
}

/// Path of a file-backed source.
///
/// # Errors
///
/// Returns `Error::InvalidCredentialSource` for inline content, which must go
/// through [`resolve`] first.
pub fn path_of(source: &CredentialSource) -> Result<&Path> {
    match source {
        CredentialSource::FilePath(path) => Ok(path),
        other => Err(Error::InvalidCredentialSource(format!(
            "{:?} is not file-backed",
            other
        ))),
    }
}

fn materialize(source: &CredentialSource, owned: &mut Vec<TempPath>) -> Result<PathBuf> {
    let bytes = match source {
        CredentialSource::FilePath(_) => return path_of(source).map(Path::to_path_buf),
        CredentialSource::InlineContent(bytes) => bytes,
    };

    let temp_dir = std::env::temp_dir();
    let write_err = |source| Error::FileWrite {
        path: temp_dir.clone(),
        source,
    };

    let mut file = tempfile::Builder::new()
        .prefix(CREDENTIAL_PREFIX)
        .tempfile_in(&temp_dir)
        .map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    let temp = file.into_temp_path();
    let path = temp.to_path_buf();
    trace!(path = %path.display(), len = bytes.len(), "materialized inline credential");
    owned.push(temp);
    Ok(path)
}
