//! Fake signing backend.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pkpass::core::signer::{ensure_signature, SignRequest, Signer};
use pkpass::error::Result;

/// Signature bytes written by [`FakeSigner`].
pub const FAKE_SIGNATURE: &[u8] = b"0\x82fake-der-signature";

/// Writes a fixed signature and records what it was asked to sign.
#[derive(Default)]
pub struct FakeSigner {
    calls: Mutex<Vec<Call>>,
}

/// One recorded `sign` call.
#[derive(Debug, Clone)]
pub struct Call {
    pub manifest: Vec<u8>,
    pub staging_dir: PathBuf,
    pub credential_files: Vec<PathBuf>,
    pub password: Option<String>,
}

impl FakeSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Signer for FakeSigner {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn sign(&self, request: &SignRequest<'_>) -> Result<()> {
        for path in [request.wwdr, request.signer_cert, request.signer_key] {
            assert!(path.exists(), "{} should exist while signing", path.display());
        }

        self.calls.lock().unwrap().push(Call {
            manifest: std::fs::read(request.manifest).unwrap(),
            staging_dir: request.manifest.parent().map(Path::to_path_buf).unwrap(),
            credential_files: vec![
                request.wwdr.to_path_buf(),
                request.signer_cert.to_path_buf(),
                request.signer_key.to_path_buf(),
            ],
            password: request.password.map(str::to_string),
        });

        std::fs::write(request.signature, FAKE_SIGNATURE).unwrap();
        ensure_signature(request.signature)
    }
}
