use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;

/// Stand-in hash checked when no account matches, so both login failures pay for
/// one argon2 verification.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    let filler = SaltString::generate(&mut OsRng);
    hash_password(filler.as_str()).unwrap_or_default()
});

/// Hashes a password with argon2id and a random salt (PHC string format).
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Password hashing failed: {e}"))
}

/// Returns false for a wrong password and for a malformed stored hash.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hashing is CPU-bound; keep it off the async workers.
pub async fn hash_password_blocking(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

/// Verifies against the account's hash, or against `DUMMY_HASH` when there is no
/// account. The missing-account case is always false.
pub async fn verify_login_password(plain: String, hash: Option<String>) -> bool {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&plain, &hash),
        None => {
            verify_password(&plain, &DUMMY_HASH);
            false
        }
    })
    .await
    .unwrap_or(false)
}
