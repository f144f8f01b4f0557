//! Password Hashing
//! Mission: One-way salted hashes that verify without a separate salt column

use anyhow::{Context, Result};
use tracing::debug;

pub use bcrypt::DEFAULT_COST;

/// Hash a plaintext password with a fresh random salt.
///
/// The salt and cost are embedded in the returned string, so
/// [`verify_password`] needs nothing else.
pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    bcrypt::hash(plain, cost).context("Failed to hash password")
}

/// Check a plaintext password against a stored hash.
///
/// A malformed hash counts as a mismatch.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    match bcrypt::verify(plain, hashed) {
        Ok(valid) => valid,
        Err(e) => {
            debug!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}

/// [`hash_password`] on the blocking pool so the runtime keeps serving other tasks
pub async fn hash_password_async(plain: &str, cost: u32) -> Result<String> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || hash_password(&plain, cost))
        .await
        .context("Password hashing task failed")?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_password_async(plain: &str, hashed: &str) -> Result<bool> {
    let plain = plain.to_string();
    let hashed = hashed.to_string();
    tokio::task::spawn_blocking(move || verify_password(&plain, &hashed))
        .await
        .context("Password verification task failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("letmein", TEST_COST).unwrap();
        assert_ne!(hashed, "letmein");
        assert!(verify_password("letmein", &hashed));
        assert!(!verify_password("letmeout", &hashed));
    }

    #[test]
    fn test_salt_differs_per_call() {
        let a = hash_password("same", TEST_COST).unwrap();
        let b = hash_password("same", TEST_COST).unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn test_empty_password_does_not_panic() {
        let hashed = hash_password("", TEST_COST).unwrap();
        assert!(verify_password("", &hashed));
        assert!(!verify_password("x", &hashed));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "not-a-bcrypt-hash"));
        assert!(!verify_password("pw", "$2b$99$short"));
    }

    #[tokio::test]
    async fn test_async_variants_agree_with_sync() {
        let hashed = hash_password_async("letmein", TEST_COST).await.unwrap();
        assert!(verify_password("letmein", &hashed));
        assert!(verify_password_async("letmein", &hashed).await.unwrap());
        assert!(!verify_password_async("nope", &hashed).await.unwrap());
        assert!(!verify_password_async("letmein", "garbage").await.unwrap());
    }
}
