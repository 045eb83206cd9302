//! Constants used throughout pkpass.
//!
//! Centralizes archive entry names and default settings.

use std::time::Duration;

/// Archive entry holding the serialized pass document.
pub const PASS_FILE: &str = "pass.json";

/// Archive entry holding the digest manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Archive entry holding the detached signature over the manifest.
pub const SIGNATURE_FILE: &str = "signature";

/// Extension of the produced archive.
pub const ARCHIVE_EXTENSION: &str = "pkpass";

/// Default configuration file name.
pub const CONFIG_FILE: &str = "pkpass.toml";

/// Prefix of per-invocation staging directories.
pub const STAGING_PREFIX: &str = "pkpass-staging-";

/// Prefix of temp files holding inline credential material.
pub const CREDENTIAL_PREFIX: &str = "pkpass-cred-";

/// Default openssl binary.
pub const OPENSSL_BIN: &str = "openssl";

/// Upper bound on a single signing invocation.
pub const SIGNING_TIMEOUT: Duration = Duration::from_secs(30);

/// Bytes of OS randomness behind each generated token.
pub const TOKEN_BYTES: usize = 16;
