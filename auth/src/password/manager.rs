use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::thread;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::PasswordError;
use super::generator;
use super::generator::GeneratedPassword;
use super::generator::OsRandom;
use super::generator::RandomSource;
use super::hasher;
use super::hasher::PasswordHasher;
use super::policy::PolicyConfig;
use super::strength;
use super::strength::ValidationResult;

/// Result of a successful hash operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword {
    /// Encoded bcrypt hash (algorithm, cost, salt and digest)
    pub hash: String,
    pub algorithm: String,
    pub cost: u32,
    pub created_at: DateTime<Utc>,
}

/// Password policy engine.
///
/// Validates, scores, hashes, verifies and generates passwords under a
/// policy. Every operation reads one snapshot of the policy, so a concurrent
/// [`update_config`](Self::update_config) is observed either entirely or not
/// at all. Share it behind an `Arc`.
#[derive(Debug)]
pub struct PasswordManager {
    config: RwLock<Arc<PolicyConfig>>,
}

impl PasswordManager {
    /// Create a manager for the given policy.
    ///
    /// Zero fields are replaced with defaults and the cost is clamped
    /// (see [`PolicyConfig::normalized`]).
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config.normalized())),
        }
    }

    /// Snapshot of the effective policy.
    pub fn config(&self) -> Arc<PolicyConfig> {
        let guard = self.config.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the policy with a normalized copy of `config`.
    pub fn update_config(&self, config: PolicyConfig) {
        let config = Arc::new(config.normalized());
        tracing::debug!(
            min_length = config.min_length,
            max_length = config.max_length,
            cost = config.cost,
            "Password policy updated"
        );

        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *guard = config;
    }

    /// Check a plaintext against the policy and score it.
    pub fn validate(&self, password: &str) -> ValidationResult {
        strength::validate(&self.config(), password)
    }

    /// Validate then hash a plaintext.
    ///
    /// # Errors
    /// * `PolicyViolation` - Plaintext fails validation, nothing is hashed
    /// * `HashingFailed` - bcrypt failed
    pub fn hash(&self, password: &str) -> Result<HashedPassword, PasswordError> {
        let config = self.config();
        hash_with(&config, password)
    }

    /// Validate then hash, returning only the encoded hash.
    pub fn hash_string(&self, password: &str) -> Result<String, PasswordError> {
        self.hash(password).map(|hashed| hashed.hash)
    }

    /// Hash many plaintexts across worker threads.
    ///
    /// bcrypt is CPU bound, so the pool is sized to the available
    /// parallelism. All entries use the same policy snapshot.
    ///
    /// # Returns
    /// One result per input, in input order
    pub fn hash_batch(&self, passwords: &[&str]) -> Vec<Result<HashedPassword, PasswordError>> {
        if passwords.is_empty() {
            return Vec::new();
        }

        let config = self.config();
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        let chunk_size = passwords.len().div_ceil(workers);

        tracing::debug!(
            count = passwords.len(),
            workers,
            cost = config.cost,
            "Hashing password batch"
        );

        thread::scope(|scope| {
            let handles: Vec<_> = passwords
                .chunks(chunk_size)
                .map(|chunk| {
                    let config = &config;
                    let handle = scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|password| hash_with(config, password))
                            .collect::<Vec<_>>()
                    });
                    (chunk.len(), handle)
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|(len, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        let failed =
                            PasswordError::HashingFailed("hashing worker panicked".to_string());
                        vec![Err(failed); len]
                    })
                })
                .collect()
        })
    }

    /// Verify a plaintext against an encoded hash.
    ///
    /// # Errors
    /// * `InvalidHash` - Hash is empty or malformed
    /// * `VerificationFailed` - Hash is well formed but does not match
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), PasswordError> {
        if self.verify_and_check(password, hash)? {
            Ok(())
        } else {
            Err(PasswordError::VerificationFailed)
        }
    }

    /// Verify a plaintext, reporting a mismatch as `Ok(false)`.
    ///
    /// # Errors
    /// * `InvalidHash` - Hash is empty or malformed
    pub fn verify_and_check(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let hasher = PasswordHasher::new(self.config().cost);
        let matched = hasher.verify(password, hash)?;

        tracing::debug!(matched, "Password verified");
        Ok(matched)
    }

    /// True if `hash` is unreadable or was produced with a different cost.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        match hasher::embedded_cost(hash) {
            Ok(cost) => cost != self.config().cost,
            Err(_) => true,
        }
    }

    /// Generate a random password that satisfies the policy.
    ///
    /// # Arguments
    /// * `length` - Requested length, clamped to the policy bounds
    ///
    /// # Errors
    /// * `GenerationFailed` - Clamped length cannot fit every required class
    pub fn generate_random_password(
        &self,
        length: usize,
    ) -> Result<GeneratedPassword, PasswordError> {
        self.generate_random_password_with(length, &mut OsRandom)
    }

    /// Generate a random password drawing from a caller-supplied source.
    pub fn generate_random_password_with<R: RandomSource + ?Sized>(
        &self,
        length: usize,
        source: &mut R,
    ) -> Result<GeneratedPassword, PasswordError> {
        generator::generate_with(&self.config(), length, source)
    }
}

impl Default for PasswordManager {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

fn hash_with(config: &PolicyConfig, password: &str) -> Result<HashedPassword, PasswordError> {
    let validation = strength::validate(config, password);
    if !validation.valid {
        return Err(PasswordError::PolicyViolation(validation.errors));
    }

    let hash = PasswordHasher::new(config.cost).hash(password)?;
    tracing::debug!(cost = config.cost, "Password hashed");

    Ok(HashedPassword {
        hash,
        algorithm: hasher::ALGORITHM.to_string(),
        cost: config.cost,
        created_at: Utc::now(),
    })
}
