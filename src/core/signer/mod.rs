//! Manifest signing.
//!
//! Produces a detached, DER-encoded PKCS#7 signature over the exact bytes of
//! `manifest.json`, with the signer certificate as leaf and the intermediate
//! (WWDR) certificate added to the signature's certificate set.
//!
//! ## Backends
//!
//! - **openssl CLI**: Default. Runs `openssl smime` as a subprocess.
//! - **native**: Feature-gated (`native`). Uses the `openssl` crate in-process.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Signer` trait
//! 2. Add the implementation in a new file
//! 3. Call [`ensure_signature`] before returning `Ok`
//! 4. Re-export from this module

use std::path::Path;

use tracing::warn;

use crate::core::credentials::ResolvedCredentials;
use crate::error::{Result, SigningError};

mod cli;

#[cfg(feature = "native")]
pub mod native;

pub use cli::OpensslCli;

/// Everything a backend needs to sign one manifest.
#[derive(Clone, Copy)]
pub struct SignRequest<'a> {
    /// File whose exact bytes are signed.
    pub manifest: &'a Path,
    /// Where the DER signature is written.
    pub signature: &'a Path,
    pub signer_cert: &'a Path,
    pub signer_key: &'a Path,
    /// Intermediate certificate appended to the chain.
    pub wwdr: &'a Path,
    /// Private key password. `None` or empty means an unencrypted key.
    pub password: Option<&'a str>,
}

impl<'a> SignRequest<'a> {
    /// Build a request from resolved credentials.
    pub fn new(manifest: &'a Path, signature: &'a Path, creds: &'a ResolvedCredentials) -> Self {
        Self {
            manifest,
            signature,
            signer_cert: &creds.signer_cert,
            signer_key: &creds.signer_key,
            wwdr: &creds.wwdr,
            password: creds.password(),
        }
    }
}

// Never expose the password through Debug.
impl std::fmt::Debug for SignRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignRequest")
            .field("manifest", &self.manifest)
            .field("signature", &self.signature)
            .field("signer_cert", &self.signer_cert)
            .field("signer_key", &self.signer_key)
            .field("wwdr", &self.wwdr)
            .field("password", &self.password.map(|_| "<redacted>"))
            .finish()
    }
}

/// Signature backend trait.
///
/// Implementations write a detached DER signature to `request.signature`.
/// Returning `Ok` means the signature file exists and is non-empty.
pub trait Signer {
    /// Sign `request.manifest`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Signing` on any failure. The signature file is then
    /// absent or empty, never a partial signature.
    fn sign(&self, request: &SignRequest<'_>) -> Result<()>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

impl<S: Signer + ?Sized> Signer for &S {
    fn sign(&self, request: &SignRequest<'_>) -> Result<()> {
        (**self).sign(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<S: Signer + ?Sized> Signer for Box<S> {
    fn sign(&self, request: &SignRequest<'_>) -> Result<()> {
        (**self).sign(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Check that a backend actually produced a signature.
///
/// Some tools report success and write nothing when handed a wrong password,
/// so an empty or missing file is a failure regardless of exit status.
///
/// # Errors
///
/// Returns `SigningError::EmptySignature` if the file is missing or empty.
pub fn ensure_signature(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => {
            discard_signature(path);
            Err(SigningError::EmptySignature(path.to_path_buf()).into())
        }
    }
}

/// Remove whatever a failed backend left at the signature path.
pub(crate) fn discard_signature(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove signature file"),
    }
}
