//! Authentication utilities library
//!
//! Reusable building blocks for backend services:
//! - Password policy engine (validation, strength scoring, bcrypt hashing,
//!   rehash detection, policy-compliant random generation)
//! - JWT access/refresh token issuance and validation
//! - Authentication coordination with rehash on login
//!
//! Nothing here is global: construct a [`PasswordManager`] or
//! [`TokenManager`] and pass it to whoever needs it.
//!
//! # Examples
//!
//! ## Password Policy
//! ```
//! use auth::{PasswordManager, PolicyConfig, StrengthTier};
//!
//! let passwords = PasswordManager::new(PolicyConfig::default().with_cost(4));
//!
//! let result = passwords.validate("Password1");
//! assert!(result.valid);
//! assert_eq!(result.strength, StrengthTier::Good);
//!
//! let hashed = passwords.hash("Password1").unwrap();
//! passwords.verify("Password1", &hashed.hash).unwrap();
//! assert!(!passwords.needs_rehash(&hashed.hash));
//! ```
//!
//! ## Random Passwords
//! ```
//! use auth::{PasswordManager, PolicyConfig};
//!
//! let passwords = PasswordManager::new(PolicyConfig::default());
//! let generated = passwords.generate_random_password(16).unwrap();
//! assert!(passwords.validate(generated.as_str()).valid);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use std::sync::Arc;
//!
//! use auth::{Authenticator, Claims, JwtConfig, PasswordManager, PolicyConfig, TokenManager};
//!
//! let passwords = Arc::new(PasswordManager::new(PolicyConfig::default().with_cost(4)));
//! let tokens = TokenManager::new(JwtConfig::new("secret_key_at_least_32_bytes_long!")).unwrap();
//! let auth = Authenticator::new(passwords, tokens);
//!
//! // Register: validate and hash password
//! let hashed = auth.register("Password123").unwrap();
//!
//! // Login: verify and issue tokens
//! let identity = Claims::new().with_subject("user123").with_username("alice");
//! let result = auth.authenticate("Password123", &hashed.hash, &identity).unwrap();
//!
//! // Validate token
//! let info = auth.validate_token(&result.tokens.access_token).unwrap();
//! assert_eq!(info.claims.sub.as_deref(), Some("user123"));
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtConfig;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenManager;
pub use jwt::TokenPair;
pub use password::GeneratedPassword;
pub use password::HashedPassword;
pub use password::PasswordError;
pub use password::PasswordManager;
pub use password::PolicyConfig;
pub use password::StrengthTier;
pub use password::ValidationResult;
