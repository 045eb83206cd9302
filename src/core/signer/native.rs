//! In-process signing backend.
//!
//! Builds the detached PKCS#7 signature with the `openssl` crate instead of
//! spawning the CLI. Enable with `--features native`.

use std::path::Path;

use openssl::error::ErrorStack;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::X509;
use tracing::trace;
use zeroize::Zeroizing;

use super::{discard_signature, ensure_signature, SignRequest, Signer};
use crate::error::{Error, Result, SigningError};

/// Signer backed by libcrypto.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSigner;

impl Signer for NativeSigner {
    fn name(&self) -> &'static str {
        "native"
    }

    fn sign(&self, request: &SignRequest<'_>) -> Result<()> {
        trace!(manifest = %request.manifest.display(), "signing in-process");

        let der = signature_der(request)?;
        std::fs::write(request.signature, der).map_err(|source| {
            discard_signature(request.signature);
            Error::FileWrite {
                path: request.signature.to_path_buf(),
                source,
            }
        })?;

        ensure_signature(request.signature)
    }
}

fn signature_der(request: &SignRequest<'_>) -> std::result::Result<Vec<u8>, SigningError> {
    let cert = X509::from_pem(&read(request.signer_cert)?).map_err(backend)?;
    let key = load_key(request.signer_key, request.password)?;

    let mut chain = Stack::new().map_err(backend)?;
    chain
        .push(X509::from_pem(&read(request.wwdr)?).map_err(backend)?)
        .map_err(backend)?;

    let manifest = read(request.manifest)?;
    let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY;
    let pkcs7 = Pkcs7::sign(&cert, &key, &chain, &manifest, flags).map_err(backend)?;
    pkcs7.to_der().map_err(backend)
}

fn load_key(
    path: &Path,
    password: Option<&str>,
) -> std::result::Result<PKey<Private>, SigningError> {
    let pem = Zeroizing::new(read(path)?);
    match password.filter(|p| !p.is_empty()) {
        Some(password) => PKey::private_key_from_pem_passphrase(&pem, password.as_bytes()),
        None => PKey::private_key_from_pem(&pem),
    }
    .map_err(backend)
}

fn read(path: &Path) -> std::result::Result<Vec<u8>, SigningError> {
    std::fs::read(path)
        .map_err(|e| SigningError::Backend(format!("{}: {}", path.display(), e)))
}

fn backend(e: ErrorStack) -> SigningError {
    SigningError::Backend(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::hash::MessageDigest;
    use openssl::rsa::Rsa;
    use openssl::symm::Cipher;
    use openssl::x509::store::X509StoreBuilder;
    use openssl::x509::{X509Builder, X509NameBuilder};
    use tempfile::TempDir;

    fn self_signed(cn: &str) -> (X509, PKey<Private>) {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", cn).unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        (builder.build(), key)
    }

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new(password: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let (wwdr, _) = self_signed("Test WWDR");
            let (cert, key) = self_signed("Pass Type ID: pass.test");
            let key_pem = key
                .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), password.as_bytes())
                .unwrap();

            std::fs::write(dir.path().join("wwdr.pem"), wwdr.to_pem().unwrap()).unwrap();
            std::fs::write(dir.path().join("signer.pem"), cert.to_pem().unwrap()).unwrap();
            std::fs::write(dir.path().join("key.pem"), key_pem).unwrap();
            std::fs::write(dir.path().join("manifest.json"), b"{\"pass.json\":\"00\"}").unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> std::path::PathBuf {
            self.dir.path().join(name)
        }
    }

    #[test]
    fn test_native_sign_with_correct_password() {
        let fx = Fixture::new("correct horse");
        let (manifest, signature) = (fx.path("manifest.json"), fx.path("signature"));
        let (cert, key, wwdr) = (fx.path("signer.pem"), fx.path("key.pem"), fx.path("wwdr.pem"));
        let request = SignRequest {
            manifest: &manifest,
            signature: &signature,
            signer_cert: &cert,
            signer_key: &key,
            wwdr: &wwdr,
            password: Some("correct horse"),
        };

        NativeSigner.sign(&request).unwrap();

        let der = std::fs::read(&signature).unwrap();
        assert!(!der.is_empty());
        let parsed = Pkcs7::from_der(&der).unwrap();
        let store = X509StoreBuilder::new().unwrap().build();
        let content = std::fs::read(&manifest).unwrap();
        parsed
            .verify(
                &Stack::<X509>::new().unwrap(),
                &store,
                Some(content.as_slice()),
                None,
                Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
            )
            .unwrap();
    }

    #[test]
    fn test_native_sign_with_wrong_password() {
        let fx = Fixture::new("correct horse");
        let (manifest, signature) = (fx.path("manifest.json"), fx.path("signature"));
        let (cert, key, wwdr) = (fx.path("signer.pem"), fx.path("key.pem"), fx.path("wwdr.pem"));
        let request = SignRequest {
            manifest: &manifest,
            signature: &signature,
            signer_cert: &cert,
            signer_key: &key,
            wwdr: &wwdr,
            password: Some("battery staple"),
        };

        let err = NativeSigner.sign(&request).unwrap_err();
        assert!(matches!(err, Error::Signing(SigningError::Backend(_))));
        assert!(std::fs::metadata(&signature).map(|m| m.len() == 0).unwrap_or(true));
    }
}
