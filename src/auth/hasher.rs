//! Argon2id password hashing with a random per-user salt.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const SALT_LEN: usize = 16;
pub const ARGON_TIME: u32 = 1;
pub const ARGON_MEMORY_KIB: u32 = 64 * 1024;
pub const ARGON_THREADS: u32 = 4;
pub const ARGON_LENGTH: usize = 32;

// Used to spend the same derivation cost when a login names an unknown user.
const TIMING_SALT: [u8; SALT_LEN] = *b"monty-no-account";

#[derive(Debug, Error)]
pub enum HashError {
    #[error("entropy source failure: {0}")]
    Entropy(#[from] rand::Error),
    #[error("key derivation failed: {0}")]
    Derivation(String),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Digest and salt, always produced and stored together.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub digest: Vec<u8>,
    pub salt: Vec<u8>,
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordDigest")
            .field("digest", &"***")
            .field("salt", &"***")
            .finish()
    }
}

fn argon2() -> Result<Argon2<'static>, HashError> {
    let params = Params::new(
        ARGON_MEMORY_KIB,
        ARGON_TIME,
        ARGON_THREADS,
        Some(ARGON_LENGTH),
    )
    .map_err(|err| HashError::Derivation(err.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn derive(password: &str, salt: &[u8]) -> Result<Vec<u8>, HashError> {
    let mut output = vec![0u8; ARGON_LENGTH];
    argon2()?
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|err| HashError::Derivation(err.to_string()))?;
    Ok(output)
}

/// Hash a password with a fresh random salt.
///
/// # Errors
/// Returns an error if the OS entropy source fails.
pub fn hash(password: &str) -> Result<PasswordDigest, HashError> {
    let mut salt = vec![0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt)?;
    let digest = derive(password, &salt)?;
    Ok(PasswordDigest { digest, salt })
}

/// Recompute the digest for `password` and compare it to the stored one in constant time.
///
/// A mismatch is `false`, as is a salt the KDF refuses.
#[must_use]
pub fn verify(password: &str, stored_digest: &[u8], stored_salt: &[u8]) -> bool {
    match derive(password, stored_salt) {
        Ok(candidate) => candidate.ct_eq(stored_digest).into(),
        Err(_) => false,
    }
}

/// [`hash`] on the blocking pool.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_blocking(password: String) -> Result<PasswordDigest, HashError> {
    tokio::task::spawn_blocking(move || hash(&password)).await?
}

/// [`verify`] on the blocking pool.
///
/// # Errors
/// Returns an error only if the blocking task panics.
pub async fn verify_blocking(
    password: String,
    stored_digest: Vec<u8>,
    stored_salt: Vec<u8>,
) -> Result<bool, HashError> {
    Ok(tokio::task::spawn_blocking(move || verify(&password, &stored_digest, &stored_salt)).await?)
}

/// Run one derivation whose result is thrown away, so a login for an unknown
/// user costs the same as one with a wrong password.
pub async fn equalize_timing(password: String) {
    let _ = tokio::task::spawn_blocking(move || derive(&password, &TIMING_SALT)).await;
}
