use std::str::FromStr;

use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT handler for encoding and decoding tokens with an HMAC secret.
///
/// Generic over the claims type so services can define their own payload.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: Option<String>,
}

impl JwtHandler {
    /// Create a new JWT handler using HS256.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            issuer: None,
        }
    }

    /// Switch to another HMAC algorithm.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm is not HS256, HS384 or HS512
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self, JwtError> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                self.algorithm = algorithm;
                Ok(self)
            }
            other => Err(JwtError::UnsupportedAlgorithm(format!("{other:?}"))),
        }
    }

    /// Require decoded tokens to carry this issuer.
    pub fn with_issuer(mut self, issuer: impl ToString) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// Signature, `exp`, `nbf` and (when configured) issuer are checked.
    ///
    /// # Errors
    /// * `TokenExpired` - Token has expired
    /// * `InvalidSignature` - Signature does not match the secret
    /// * `InvalidToken` - Claims fail validation
    /// * `DecodingFailed` - Token is malformed
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_nbf = true;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        let token_data = decode::<T>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::ImmatureSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::MissingRequiredClaim(_) => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::DecodingFailed(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Decode token without validation (for inspection only).
    ///
    /// # Errors
    /// * `DecodingFailed` - Token format is invalid
    ///
    /// # Security Warning
    /// This does NOT validate the token signature or expiry. Never trust
    /// claims from this method for authorization decisions.
    pub fn decode_unverified<T: for<'de> Deserialize<'de>>(
        &self,
        token: &str,
    ) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let token_data = decode::<T>(token, &self.decoding_key, &validation)
            .map_err(|e| JwtError::DecodingFailed(e.to_string()))?;

        Ok(token_data.claims)
    }
}

/// Parse an algorithm name, accepting only HMAC algorithms.
///
/// # Errors
/// * `UnsupportedAlgorithm` - Unknown name or non-HMAC algorithm
pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
    match Algorithm::from_str(name) {
        Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(algorithm),
        _ => Err(JwtError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Read a token header without verifying anything.
///
/// # Errors
/// * `DecodingFailed` - Header is not valid base64 JSON
pub fn inspect_header(token: &str) -> Result<Header, JwtError> {
    decode_header(token).map_err(|e| JwtError::DecodingFailed(e.to_string()))
}

/// True if the token has three dot-separated segments.
pub fn has_token_format(token: &str) -> bool {
    token.split('.').count() == 3
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        role: String,
        exp: i64,
    }

    fn test_claims(exp: i64) -> TestClaims {
        TestClaims {
            sub: "user123".to_string(),
            role: "admin".to_string(),
            exp,
        }
    }

    fn in_one_hour() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");
        let claims = test_claims(in_one_hour());

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert!(has_token_format(&token));

        let decoded: TestClaims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");

        let result = handler.decode::<TestClaims>("invalid.token.here");
        assert!(matches!(result, Err(JwtError::DecodingFailed(_))));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let token = handler1
            .encode(&test_claims(in_one_hour()))
            .expect("Failed to encode token");

        let result = handler2.decode::<TestClaims>(&token);
        assert_eq!(result, Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_decode_expired() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");
        let token = handler
            .encode(&test_claims(Utc::now().timestamp() - 3600))
            .expect("Failed to encode token");

        assert_eq!(
            handler.decode::<TestClaims>(&token),
            Err(JwtError::TokenExpired)
        );
    }

    #[test]
    fn test_issuer_is_enforced() {
        let signer = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!");
        let verifier =
            JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!").with_issuer("servicekit");

        let token = signer
            .encode(&test_claims(in_one_hour()))
            .expect("Failed to encode token");

        assert!(matches!(
            verifier.decode::<TestClaims>(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_decode_unverified() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let token = handler1
            .encode(&test_claims(Utc::now().timestamp() - 3600))
            .expect("Failed to encode token");

        let decoded: TestClaims = handler2
            .decode_unverified(&token)
            .expect("Failed to decode unverified");
        assert_eq!(decoded.sub, "user123");
        assert_eq!(decoded.role, "admin");
    }

    #[test]
    fn test_with_algorithm() {
        let handler = JwtHandler::new(b"my_secret_key_at_least_32_bytes_long!")
            .with_algorithm(Algorithm::HS512)
            .expect("HS512 should be accepted");

        let token = handler
            .encode(&test_claims(in_one_hour()))
            .expect("Failed to encode token");
        let header = inspect_header(&token).expect("Failed to read header");
        assert_eq!(header.alg, Algorithm::HS512);

        let rejected = JwtHandler::new(b"secret").with_algorithm(Algorithm::RS256);
        assert!(matches!(rejected, Err(JwtError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS384"), Ok(Algorithm::HS384));
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn test_has_token_format() {
        assert!(has_token_format("a.b.c"));
        assert!(!has_token_format("a.b"));
        assert!(!has_token_format("a.b.c.d"));
    }
}
