use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::Algorithm;
use serde::Serialize;
use uuid::Uuid;

use super::claims::Claims;
use super::claims::TokenKind;
use super::errors::JwtError;
use super::handler::JwtHandler;

pub const DEFAULT_ISSUER: &str = "servicekit";

/// Token manager configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub issuer: String,
    pub algorithm: Algorithm,
}

impl JwtConfig {
    /// Defaults: 15 minute access tokens, 7 day refresh tokens, HS256.
    pub fn new(secret: impl ToString) -> Self {
        Self {
            secret: secret.to_string(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
            issuer: DEFAULT_ISSUER.to_string(),
            algorithm: Algorithm::HS256,
        }
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: impl ToString) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Access and refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
}

/// Claims of a verified token with its timestamps resolved.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub claims: Claims,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates access/refresh token pairs.
pub struct TokenManager {
    handler: JwtHandler,
    config: JwtConfig,
}

impl TokenManager {
    /// Create a token manager.
    ///
    /// # Errors
    /// * `MissingSecret` - Secret is empty
    /// * `UnsupportedAlgorithm` - Algorithm is not an HMAC algorithm
    pub fn new(config: JwtConfig) -> Result<Self, JwtError> {
        if config.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }

        let handler = JwtHandler::new(config.secret.as_bytes())
            .with_algorithm(config.algorithm)?
            .with_issuer(&config.issuer);

        Ok(Self { handler, config })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Issue an access and a refresh token for the identity in `identity`.
    ///
    /// Subject, username, email, roles and custom fields are carried into
    /// both tokens; timing, issuer, id and kind are set here.
    ///
    /// # Errors
    /// * `InvalidToken` - `identity` has no subject
    /// * `EncodingFailed` - Signing failed
    pub fn generate_token_pair(&self, identity: &Claims) -> Result<TokenPair, JwtError> {
        let now = Utc::now();
        let access_expiry = now + self.config.access_token_ttl;

        let access_token = self.sign(identity, TokenKind::Access, now, access_expiry)?;
        let refresh_token = self.sign(
            identity,
            TokenKind::Refresh,
            now,
            now + self.config.refresh_token_ttl,
        )?;

        tracing::debug!(
            subject = identity.sub.as_deref().unwrap_or_default(),
            "Token pair issued"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_at: access_expiry,
            token_type: "Bearer".to_string(),
        })
    }

    /// Issue only an access token.
    pub fn generate_access_token(&self, identity: &Claims) -> Result<String, JwtError> {
        let now = Utc::now();
        self.sign(
            identity,
            TokenKind::Access,
            now,
            now + self.config.access_token_ttl,
        )
    }

    /// Verify a token of any kind.
    ///
    /// # Errors
    /// * `TokenExpired`, `InvalidSignature`, `InvalidToken`, `DecodingFailed`
    pub fn validate_token(&self, token: &str) -> Result<TokenInfo, JwtError> {
        let claims: Claims = self.handler.decode(token)?;

        let expires_at = claims
            .exp
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or_else(|| JwtError::InvalidToken("missing expiration".to_string()))?;
        let issued_at = claims.iat.and_then(|iat| DateTime::from_timestamp(iat, 0));

        Ok(TokenInfo {
            claims,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token and require it to be an access token.
    ///
    /// # Errors
    /// * `WrongTokenKind` - Token is a refresh token
    pub fn validate_access_token(&self, token: &str) -> Result<TokenInfo, JwtError> {
        self.validate_kind(token, TokenKind::Access)
    }

    /// Exchange a valid refresh token for a new token pair.
    ///
    /// # Errors
    /// * `WrongTokenKind` - Token is not a refresh token
    pub fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, JwtError> {
        let info = self.validate_kind(refresh_token, TokenKind::Refresh)?;
        self.generate_token_pair(&info.claims)
    }

    /// Read the subject without verifying the token.
    ///
    /// # Errors
    /// * `DecodingFailed` - Token is malformed
    /// * `InvalidToken` - Token has no subject
    pub fn extract_user_id(&self, token: &str) -> Result<String, JwtError> {
        let claims: Claims = self.handler.decode_unverified(token)?;
        claims
            .sub
            .ok_or_else(|| JwtError::InvalidToken("missing subject".to_string()))
    }

    /// Expiry of a verified token.
    pub fn token_expiry(&self, token: &str) -> Result<DateTime<Utc>, JwtError> {
        self.validate_token(token).map(|info| info.expires_at)
    }

    /// True if the token is expired or fails verification.
    pub fn is_token_expired(&self, token: &str) -> bool {
        match self.token_expiry(token) {
            Ok(expiry) => Utc::now() > expiry,
            Err(_) => true,
        }
    }

    /// True if the token expires within `threshold` or fails verification.
    pub fn is_token_near_expiry(&self, token: &str, threshold: Duration) -> bool {
        match self.token_expiry(token) {
            Ok(expiry) => expiry - Utc::now() <= threshold,
            Err(_) => true,
        }
    }

    /// Time left before expiry, zero if already past.
    pub fn remaining_time(&self, token: &str) -> Result<Duration, JwtError> {
        let remaining = self.token_expiry(token)? - Utc::now();
        Ok(remaining.max(Duration::zero()))
    }

    fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<TokenInfo, JwtError> {
        let info = self.validate_token(token)?;
        if info.claims.kind != Some(expected) {
            return Err(JwtError::WrongTokenKind {
                expected: expected.to_string(),
            });
        }
        Ok(info)
    }

    fn sign(
        &self,
        identity: &Claims,
        kind: TokenKind,
        now: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        if identity.sub.is_none() {
            return Err(JwtError::InvalidToken("missing subject".to_string()));
        }

        let claims = identity
            .clone()
            .with_issued_at(now.timestamp())
            .with_not_before(now.timestamp())
            .with_expiration(expiry.timestamp())
            .with_issuer(&self.config.issuer)
            .with_token_id(Uuid::new_v4())
            .with_kind(kind);

        self.handler.encode(&claims)
    }
}
