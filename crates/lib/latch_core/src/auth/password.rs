//! Password hashing via bcrypt.

use super::AuthError;

/// Default bcrypt cost factor. Tunable through `hash_password`'s `cost`
/// so deployments (and tests) can trade hashing time for hardness.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A mismatch is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 is the bcrypt minimum; production cost makes these tests crawl.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("Password@123", TEST_COST).unwrap();
        assert_ne!(hash, "Password@123");
        assert!(verify_password("Password@123", &hash).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let hash = hash_password("correct horse", TEST_COST).unwrap();
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        // Salted: two hashes of the same input must differ.
        let a = hash_password("Password@123", TEST_COST).unwrap();
        let b = hash_password("Password@123", TEST_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_error() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }
}
