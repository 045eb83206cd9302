//! Random token generation.
//!
//! Staging directories and default archive names are derived from tokens
//! drawn from the operating system CSPRNG, so concurrent invocations never
//! need to coordinate.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::core::constants::TOKEN_BYTES;

/// Generate a lowercase hex token with 128 bits of entropy.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
