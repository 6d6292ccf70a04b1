use std::sync::Arc;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenInfo;
use crate::jwt::TokenManager;
use crate::jwt::TokenPair;
use crate::password::HashedPassword;
use crate::password::PasswordError;
use crate::password::PasswordManager;

/// Authentication coordinator combining the password policy engine and
/// token issuance.
pub struct Authenticator {
    passwords: Arc<PasswordManager>,
    tokens: TokenManager,
}

/// Result of successful authentication.
#[derive(Debug)]
pub struct AuthenticationResult {
    pub tokens: TokenPair,

    /// Fresh hash to persist when the stored one used an outdated cost
    pub rehashed: Option<HashedPassword>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `passwords` - Shared password policy engine
    /// * `tokens` - Token manager used to issue credentials
    pub fn new(passwords: Arc<PasswordManager>, tokens: TokenManager) -> Self {
        Self { passwords, tokens }
    }

    pub fn passwords(&self) -> &PasswordManager {
        &self.passwords
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Validate and hash a new password for storage.
    ///
    /// # Errors
    /// * `PolicyViolation` - Password fails the policy
    /// * `HashingFailed` - Hashing operation failed
    pub fn register(&self, password: &str) -> Result<HashedPassword, PasswordError> {
        self.passwords.hash(password)
    }

    /// Verify credentials and issue a token pair.
    ///
    /// When the stored hash was produced with a different cost, the verified
    /// plaintext is rehashed and returned in `rehashed`. A plaintext that no
    /// longer satisfies the current policy is not rehashed; the login still
    /// succeeds.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `identity` - Claims identifying the user (subject required)
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is malformed or rehashing failed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        identity: &Claims,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        match self.passwords.verify(password, stored_hash) {
            Ok(()) => {}
            Err(PasswordError::VerificationFailed) => {
                return Err(AuthenticationError::InvalidCredentials)
            }
            Err(e) => return Err(e.into()),
        }

        let rehashed = self.rehash_if_needed(password, stored_hash)?;
        let tokens = self.tokens.generate_token_pair(identity)?;

        Ok(AuthenticationResult { tokens, rehashed })
    }

    /// Exchange a refresh token for a new pair.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, JwtError> {
        self.tokens.refresh_token(refresh_token)
    }

    /// Validate and decode an access token.
    pub fn validate_token(&self, token: &str) -> Result<TokenInfo, JwtError> {
        self.tokens.validate_access_token(token)
    }

    fn rehash_if_needed(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<Option<HashedPassword>, PasswordError> {
        if !self.passwords.needs_rehash(stored_hash) {
            return Ok(None);
        }

        match self.passwords.hash(password) {
            Ok(hashed) => {
                tracing::info!(cost = hashed.cost, "Password rehashed with current cost");
                Ok(Some(hashed))
            }
            Err(PasswordError::PolicyViolation(violations)) => {
                tracing::warn!(
                    violations = violations.len(),
                    "Skipping rehash, password no longer satisfies policy"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
