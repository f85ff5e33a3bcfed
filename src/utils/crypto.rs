// Cryptographic helpers for API key secrets

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Size of a stored secret digest (SHA-256)
pub const SECRET_HASH_SIZE: usize = 32;

/// Hash a plaintext API key secret into the digest stored on the session record
#[must_use]
pub fn hash_secret(secret: &str) -> [u8; SECRET_HASH_SIZE] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Verify a plaintext secret against a stored digest
///
/// The digest comparison goes through `subtle::ConstantTimeEq`, which examines
/// every byte regardless of where the first difference is. A stored digest of
/// the wrong length never matches.
#[must_use]
pub fn verify_secret(secret: &str, stored_hash: &[u8]) -> bool {
    if stored_hash.len() != SECRET_HASH_SIZE {
        return false;
    }

    let computed = hash_secret(secret);
    computed[..].ct_eq(stored_hash).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_secret_is_deterministic() {
        let first = hash_secret("abcdefghijklmnopqrstuv");
        let second = hash_secret("abcdefghijklmnopqrstuv");
        assert_eq!(first, second);
        assert_ne!(first, hash_secret("abcdefghijklmnopqrstuw"));
    }

    #[test]
    fn test_hash_secret_matches_sha256() {
        // echo -n "secret" | sha256sum
        let digest = hash_secret("secret");
        assert_eq!(digest[0], 0x2b);
        assert_eq!(digest[1], 0xb8);
        assert_eq!(digest[31], 0x5b);
    }

    #[test]
    fn test_verify_secret() {
        let stored = hash_secret("correct-secret");
        assert!(verify_secret("correct-secret", &stored));
        assert!(!verify_secret("wrong-secret", &stored));
        assert!(!verify_secret("", &stored));
    }

    #[test]
    fn test_verify_secret_rejects_truncated_digest() {
        let stored = hash_secret("correct-secret");
        assert!(!verify_secret("correct-secret", &stored[..16]));
        assert!(!verify_secret("correct-secret", &[]));
    }
}
