use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::policy::PolicyConfig;

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const SPECIAL: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

const KEYBOARD_ROW: &str = "qwertyuiopasdfghjklzxcvbnm";
const SEQUENCE_WINDOW: usize = 3;

/// Ordered strength label derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrengthTier {
    Weak,
    Fair,
    Good,
    Strong,
    VeryStrong,
}

impl StrengthTier {
    /// Map a score onto its tier.
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 9 => StrengthTier::VeryStrong,
            s if s >= 7 => StrengthTier::Strong,
            s if s >= 5 => StrengthTier::Good,
            s if s >= 3 => StrengthTier::Fair,
            _ => StrengthTier::Weak,
        }
    }
}

impl fmt::Display for StrengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrengthTier::Weak => "Weak",
            StrengthTier::Fair => "Fair",
            StrengthTier::Good => "Good",
            StrengthTier::Strong => "Strong",
            StrengthTier::VeryStrong => "Very Strong",
        };
        f.write_str(label)
    }
}

/// Outcome of checking a plaintext against a policy.
///
/// `valid` reflects only the length and composition rules. Score and tier
/// are advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub strength: StrengthTier,
    pub score: u32,
    pub errors: Vec<String>,
    pub suggestions: Vec<String>,
}

pub fn contains_upper(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_uppercase())
}

pub fn contains_lower(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_lowercase())
}

pub fn contains_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

pub fn contains_special(s: &str) -> bool {
    s.chars().any(|c| SPECIAL.contains(c))
}

/// True if any character appears three times in a row.
pub fn has_repeating_chars(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    chars
        .windows(SEQUENCE_WINDOW)
        .any(|w| w[0] == w[1] && w[1] == w[2])
}

/// True if any 3-character window of a known run (alphabet, digits, the
/// qwerty row), forward or reversed, occurs in `s` ignoring case.
pub fn has_sequential_chars(s: &str) -> bool {
    if s.chars().count() < SEQUENCE_WINDOW {
        return false;
    }

    let haystack = s.to_lowercase();
    [LOWERCASE, UPPERCASE, DIGITS, KEYBOARD_ROW]
        .iter()
        .any(|sequence| {
            let forward: Vec<char> = sequence.to_lowercase().chars().collect();
            let backward: Vec<char> = forward.iter().rev().copied().collect();
            contains_window(&haystack, &forward) || contains_window(&haystack, &backward)
        })
}

fn contains_window(haystack: &str, sequence: &[char]) -> bool {
    sequence
        .windows(SEQUENCE_WINDOW)
        .any(|w| haystack.contains(w.iter().collect::<String>().as_str()))
}

/// Heuristic score in `0..=10`.
///
/// Length earns up to 3, each of lower/upper/digit earns 1, a special
/// character earns 2, and the absence of triple repeats and of sequential
/// runs earn 1 each.
pub fn score(password: &str) -> u32 {
    let length = password.chars().count();
    let mut score = 0;

    for threshold in [8, 12, 16] {
        if length >= threshold {
            score += 1;
        }
    }

    if contains_lower(password) {
        score += 1;
    }
    if contains_upper(password) {
        score += 1;
    }
    if contains_digit(password) {
        score += 1;
    }
    if contains_special(password) {
        score += 2;
    }

    if !has_repeating_chars(password) {
        score += 1;
    }
    if !has_sequential_chars(password) {
        score += 1;
    }

    score
}

/// Check `password` against `config`.
pub fn validate(config: &PolicyConfig, password: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let mut suggestions = Vec::new();
    let length = password.chars().count();

    if length < config.min_length {
        errors.push(format!(
            "Password must be at least {} characters long",
            config.min_length
        ));
        suggestions.push("Use a longer password".to_string());
    }

    if length > config.max_length {
        errors.push(format!(
            "Password must not exceed {} characters",
            config.max_length
        ));
        suggestions.push("Use a shorter password".to_string());
    }

    let class_rules: [(bool, fn(&str) -> bool, &str, &str); 4] = [
        (
            config.require_upper,
            contains_upper,
            "uppercase letter",
            "Add uppercase letters (A-Z)",
        ),
        (
            config.require_lower,
            contains_lower,
            "lowercase letter",
            "Add lowercase letters (a-z)",
        ),
        (
            config.require_digit,
            contains_digit,
            "digit",
            "Add numbers (0-9)",
        ),
        (
            config.require_special,
            contains_special,
            "special character",
            "Add special characters (!@#$%^&*)",
        ),
    ];

    for (required, present, class, suggestion) in class_rules {
        if required && !present(password) {
            errors.push(format!("Password must contain at least one {class}"));
            suggestions.push(suggestion.to_string());
        }
    }

    let score = score(password);

    ValidationResult {
        valid: errors.is_empty(),
        strength: StrengthTier::from_score(score),
        score,
        errors,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_policy() -> PolicyConfig {
        PolicyConfig::new()
            .with_min_length(8)
            .with_require_upper(true)
            .with_require_lower(true)
            .with_require_digit(true)
            .with_require_special(false)
            .with_cost(10)
            .normalized()
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(StrengthTier::from_score(0), StrengthTier::Weak);
        assert_eq!(StrengthTier::from_score(2), StrengthTier::Weak);
        assert_eq!(StrengthTier::from_score(3), StrengthTier::Fair);
        assert_eq!(StrengthTier::from_score(5), StrengthTier::Good);
        assert_eq!(StrengthTier::from_score(7), StrengthTier::Strong);
        assert_eq!(StrengthTier::from_score(9), StrengthTier::VeryStrong);
        assert_eq!(StrengthTier::from_score(10), StrengthTier::VeryStrong);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(StrengthTier::Weak < StrengthTier::Fair);
        assert!(StrengthTier::Fair < StrengthTier::Good);
        assert!(StrengthTier::Good < StrengthTier::Strong);
        assert!(StrengthTier::Strong < StrengthTier::VeryStrong);
        assert_eq!(StrengthTier::VeryStrong.to_string(), "Very Strong");
    }

    #[test]
    fn test_missing_classes_are_reported() {
        let result = validate(&scenario_policy(), "password");

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("uppercase"));
        assert!(result.errors[1].contains("digit"));
        assert_eq!(result.suggestions.len(), 2);
    }

    #[test]
    fn test_compliant_password_is_good() {
        let result = validate(&scenario_policy(), "Password1");

        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.score, 5);
        assert_eq!(result.strength, StrengthTier::Good);
    }

    #[test]
    fn test_too_short_mentions_length() {
        let result = validate(&scenario_policy(), "Ab1");

        assert!(!result.valid);
        assert!(result.errors[0].contains("at least 8 characters"));
    }

    #[test]
    fn test_too_long_is_invalid() {
        let config = scenario_policy().with_max_length(10);
        let result = validate(&config, "Abcdefgh12345");

        assert!(!result.valid);
        assert!(result.errors[0].contains("must not exceed 10"));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let config = PolicyConfig::new()
            .with_require_upper(false)
            .with_require_lower(false)
            .with_require_digit(false)
            .normalized();

        // 7 characters, 14 bytes
        assert!(!validate(&config, "ééééééé").valid);
    }

    #[test]
    fn test_score_is_advisory() {
        let config = PolicyConfig::new()
            .with_require_upper(false)
            .with_require_lower(false)
            .with_require_digit(false)
            .normalized();

        let result = validate(&config, "aaaaaaaa");
        assert!(result.valid);
        assert_eq!(result.strength, StrengthTier::Fair);
    }

    #[test]
    fn test_maximum_score() {
        assert_eq!(score("Xk9!mQ2#vL7$pR4&"), 10);
    }

    #[test]
    fn test_repeating_chars() {
        assert!(has_repeating_chars("abccc"));
        assert!(!has_repeating_chars("abcc"));
        assert!(!has_repeating_chars("aa"));
    }

    #[test]
    fn test_sequential_chars() {
        assert!(has_sequential_chars("xxabcxx"));
        assert!(has_sequential_chars("xxCBAxx"));
        assert!(has_sequential_chars("9876"));
        assert!(has_sequential_chars("QWErty"));
        assert!(has_sequential_chars("lkj"));
        assert!(!has_sequential_chars("acegik"));
        assert!(!has_sequential_chars("ab"));
    }

    #[test]
    fn test_validate_is_pure() {
        let config = scenario_policy();
        assert_eq!(validate(&config, "Tr0ub4dor"), validate(&config, "Tr0ub4dor"));
    }
}
