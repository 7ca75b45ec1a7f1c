use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use plagifree_core::{PlagiError, PlagiResult};

/// Salted Argon2id hash in PHC string format.
pub fn hash_password(password: &str) -> PlagiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PlagiError::Crypto(format!("password hashing failed: {e}")))
}

/// Check a login attempt against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only a corrupt stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> PlagiResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| PlagiError::Crypto(format!("invalid password hash: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PlagiError::Crypto(format!("password verification failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_verifies() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("battery-staple", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted_argon2id() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert!(first.starts_with("$argon2id$"), "got: {first}");
        assert_ne!(first, second);
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
