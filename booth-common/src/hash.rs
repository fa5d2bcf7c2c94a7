//! Session hash derivation and access tokens
//!
//! The session hash is the registry key and appears in public URLs, so it is
//! short and stable across restarts. It is NOT normalised: callers that want
//! `20240101_120000` and `20240101120000` to meet must resolve that themselves.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest (one length for the whole registry)
pub const HASH_LEN: usize = 12;

/// Bytes of randomness in an access token
const ACCESS_TOKEN_BYTES: usize = 32;

/// Derive the session hash for an identifier
///
/// **Algorithm:** SHA-256 over the UTF-8 bytes, lowercase hex, first
/// [`HASH_LEN`] characters.
pub fn derive_hash(identifier: &str) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Generate a random access token for gated result pages
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
