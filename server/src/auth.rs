use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::errors::BackendError;

/// Hashes a credential with argon2id and a fresh salt. Only the PHC
/// string leaves this module; the raw secret is never stored.
pub fn hash_credential(secret: &str) -> Result<String, BackendError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| BackendError::CredentialHash)
}

/// Verifies a claimed credential against a stored PHC string. An
/// unparseable stored hash verifies as false rather than erroring, so a
/// corrupt row reads as a failed login, not a 500.
pub fn verify_credential(secret: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
