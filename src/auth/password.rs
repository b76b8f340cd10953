use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

fn argon2_failure(stage: &'static str, e: argon2::password_hash::Error) -> anyhow::Error {
    error!(error = %e, stage, "argon2 failure");
    anyhow::anyhow!("{stage}: {e}")
}

/// Produces a salted argon2 PHC string for storage.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| argon2_failure("hash", e))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| argon2_failure("parse", e))?;
    let matches = Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok();
    Ok(matches)
}

lazy_static! {
    static ref DUMMY_HASH: Option<String> = hash_password("sweetshop-dummy-password").ok();
}

/// Builds the dummy hash up front so the first unknown-email login is not slower
/// than the rest.
pub fn warm_dummy_hash() -> bool {
    DUMMY_HASH.is_some()
}

/// Runs a full verification against a throwaway hash so that a login for an
/// unknown email costs the same as one for a known email.
pub fn verify_dummy(plain: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_accepts_only_the_hashed_password() {
        let hash = hash_password("ladoo-lover").unwrap();
        assert!(verify_password("ladoo-lover", &hash).unwrap());
        assert!(!verify_password("barfi-lover", &hash).unwrap());
    }

    #[test]
    fn dummy_hash_is_ready_after_warm_up() {
        assert!(warm_dummy_hash());
        assert!(DUMMY_HASH.as_deref().is_some_and(|h| h.starts_with("$argon2")));
    }

    #[test]
    fn hash_is_salted_and_never_plaintext() {
        let a = hash_password("password").unwrap();
        let b = hash_password("password").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("password"));
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(err.to_string().starts_with("parse"));
    }

    #[test]
    fn dummy_verify_does_not_panic() {
        verify_dummy("whatever");
    }
}
