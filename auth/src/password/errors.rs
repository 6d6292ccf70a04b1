use thiserror::Error;

/// Error type for password operations.
///
/// `VerificationFailed` means a well-formed hash did not match the
/// plaintext. It is kept apart from `InvalidHash` so login flows can answer
/// "invalid credentials" without masking corrupt stored data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password does not satisfy policy: {}", .0.join(", "))]
    PolicyViolation(Vec<String>),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),

    #[error("Password verification failed")]
    VerificationFailed,

    #[error("Password generation failed: {0}")]
    GenerationFailed(String),
}

impl PasswordError {
    /// Violated rules carried by a `PolicyViolation`, empty otherwise.
    pub fn violations(&self) -> &[String] {
        match self {
            PasswordError::PolicyViolation(violations) => violations,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violation_message_joins_rules() {
        let error = PasswordError::PolicyViolation(vec![
            "Password must contain at least one uppercase letter".to_string(),
            "Password must contain at least one digit".to_string(),
        ]);

        assert_eq!(
            error.to_string(),
            "Password does not satisfy policy: Password must contain at least one uppercase letter, Password must contain at least one digit"
        );
        assert_eq!(error.violations().len(), 2);
    }

    #[test]
    fn test_violations_empty_for_other_errors() {
        assert!(PasswordError::VerificationFailed.violations().is_empty());
    }
}
