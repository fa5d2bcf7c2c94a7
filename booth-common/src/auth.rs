//! Admin credential check
//!
//! Admin endpoints carry the password as an `auth` query parameter. The
//! comparison runs over SHA-256 digests so its timing does not depend on how
//! many leading characters matched.

use sha2::{Digest, Sha256};

/// Outcome of an admin credential check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuth {
    Granted,
    /// Credential missing or wrong
    Denied,
    /// No admin password configured; every admin request is refused
    Disabled,
}

/// Check a provided credential against the configured admin password
pub fn check_admin_password(configured: Option<&str>, provided: Option<&str>) -> AdminAuth {
    let Some(configured) = configured else {
        return AdminAuth::Disabled;
    };
    let Some(provided) = provided else {
        return AdminAuth::Denied;
    };

    let expected = Sha256::digest(configured.as_bytes());
    let actual = Sha256::digest(provided.as_bytes());
    let diff = expected
        .iter()
        .zip(actual.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));

    if diff == 0 {
        AdminAuth::Granted
    } else {
        AdminAuth::Denied
    }
}
