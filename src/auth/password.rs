use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;

/// Salt length in bytes (16 bytes = 22 base64 chars, well within argon2 limits).
const SALT_LEN: usize = 16;

/// Hash a plaintext password using argon2id with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = generate_salt()?;
    let hash = Argon2::default().hash_password(plaintext.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored argon2 hash.
///
/// A stored value that is not a valid PHC string counts as a mismatch.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Run one verification against a throwaway hash so an unknown username costs
/// the same as a wrong password.
pub fn verify_dummy(plaintext: &str) {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    if let Some(hash) = DUMMY.get_or_init(|| hash_password("psdash-dummy-password").ok()) {
        let _ = verify_password(plaintext, hash);
    }
}

/// Generate a random salt string for argon2 using `rand`.
fn generate_salt() -> Result<SaltString, argon2::password_hash::Error> {
    let mut rng = rand::rng();
    let mut salt_bytes = [0u8; SALT_LEN];
    rng.fill(&mut salt_bytes);
    SaltString::encode_b64(&salt_bytes)
}
