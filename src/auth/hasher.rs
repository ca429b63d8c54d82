//! One-way password hashing.

use anyhow::{Context, Result};

/// Bcrypt-backed hasher. The salt and cost factor are embedded in each
/// hash, so `verify` stays correct across cost changes.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    #[must_use]
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password.
    ///
    /// # Errors
    ///
    /// Fails only when the system entropy source is unavailable.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::hash(plaintext, self.cost).context("failed to hash password")
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A malformed hash yields `false`, the same signal as a wrong
    /// password, so callers cannot tell the two cases apart.
    #[must_use]
    pub fn verify(&self, stored_hash: &str, plaintext: &str) -> bool {
        bcrypt::verify(plaintext, stored_hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // MIN_COST keeps the hashing rounds cheap in tests
    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(4)
    }

    #[test]
    fn test_verify_roundtrip() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse battery staple").unwrap();

        assert!(hasher.verify(&hash, "correct horse battery staple"));
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse battery staple").unwrap();

        assert!(!hasher.verify(&hash, "incorrect horse battery staple"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let hasher = hasher();

        assert!(!hasher.verify("not-a-bcrypt-hash", "whatever"));
        assert!(!hasher.verify("", "whatever"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("same password").unwrap();
        let second = hasher.hash("same password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify(&first, "same password"));
        assert!(hasher.verify(&second, "same password"));
    }
}
