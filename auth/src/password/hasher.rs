use std::str::FromStr;

use bcrypt::BcryptError;
use bcrypt::HashParts;

use super::errors::PasswordError;

/// Algorithm identifier recorded alongside produced hashes.
pub const ALGORITHM: &str = "bcrypt";

/// Longest plaintext, in bytes, that bcrypt digests in full.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hashing primitive.
///
/// Thin wrapper over bcrypt: the encoded hash (`$2b$<cost>$<salt><digest>`)
/// is self-describing and verifiable by any compliant implementation.
/// The hasher performs no policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher for the given cost factor.
    ///
    /// # Arguments
    /// * `cost` - bcrypt work factor, expected within 4..=31
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    /// * `HashingFailed` - Plaintext exceeds [`MAX_PASSWORD_BYTES`], invalid
    ///   cost or salt generation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::HashingFailed(format!(
                "password is {} bytes, bcrypt accepts at most {MAX_PASSWORD_BYTES}",
                password.len()
            )));
        }

        bcrypt::hash(password, self.cost).map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against an encoded hash.
    ///
    /// Comparison runs in constant time inside bcrypt.
    ///
    /// # Returns
    /// True if password matches, false otherwise. A plaintext longer than
    /// [`MAX_PASSWORD_BYTES`] never matches, since no hash is produced for one.
    ///
    /// # Errors
    /// * `InvalidHash` - Hash is empty or not a bcrypt hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        if hash.is_empty() {
            return Err(PasswordError::InvalidHash("hash is empty".to_string()));
        }

        if password.len() > MAX_PASSWORD_BYTES {
            HashParts::from_str(hash).map_err(invalid_hash)?;
            return Ok(false);
        }

        bcrypt::verify(password, hash).map_err(invalid_hash)
    }
}

/// Read the cost factor embedded in an encoded hash.
///
/// # Errors
/// * `InvalidHash` - Hash cannot be parsed
pub fn embedded_cost(hash: &str) -> Result<u32, PasswordError> {
    if hash.is_empty() {
        return Err(PasswordError::InvalidHash("hash is empty".to_string()));
    }

    HashParts::from_str(hash)
        .map(|parts| parts.get_cost())
        .map_err(invalid_hash)
}

fn invalid_hash(error: BcryptError) -> PasswordError {
    PasswordError::InvalidHash(error.to_string())
}
