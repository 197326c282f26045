//! Pre-shared key authentication

use tracing::{info, warn};

pub trait AuthService: Send + Sync {
    /// Whether `key` grants access; blank keys never do
    fn is_valid_key(&self, key: &str) -> bool;
}

/// Compares the caller's key with a single configured secret
#[derive(Clone)]
pub struct PresharedKeyAuth {
    secret_key: String,
}

impl PresharedKeyAuth {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
        }
    }
}

impl std::fmt::Debug for PresharedKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresharedKeyAuth")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl AuthService for PresharedKeyAuth {
    fn is_valid_key(&self, key: &str) -> bool {
        if key.trim().is_empty() {
            warn!("Authentication failed: provided key is empty");
            return false;
        }

        let valid = constant_time_eq(key.as_bytes(), self.secret_key.as_bytes());
        if valid {
            info!("Authentication successful");
        } else {
            warn!("Authentication failed: invalid key provided");
        }
        valid
    }
}

/// Byte comparison whose duration depends only on the lengths
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
