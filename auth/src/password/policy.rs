use serde::Deserialize;
use serde::Serialize;

/// Smallest cost factor bcrypt accepts.
pub const MIN_COST: u32 = 4;

/// Largest cost factor bcrypt accepts.
pub const MAX_COST: u32 = 31;

pub const DEFAULT_MIN_LENGTH: usize = 8;
pub const DEFAULT_MAX_LENGTH: usize = 128;
pub const DEFAULT_COST: u32 = 12;

/// Password composition rules and hashing cost.
///
/// A value is never mutated by the manager that owns it: updates go through
/// [`PasswordManager::update_config`](super::PasswordManager::update_config),
/// which swaps in a whole new normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum length in characters (0 selects the default)
    pub min_length: usize,

    /// Maximum length in characters (0 selects the default)
    pub max_length: usize,

    pub require_upper: bool,
    pub require_lower: bool,
    pub require_digit: bool,
    pub require_special: bool,

    /// bcrypt cost factor (0 selects the default, otherwise clamped to 4..=31)
    pub cost: u32,
}

impl PolicyConfig {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum length.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Set maximum length.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Require at least one uppercase letter.
    pub fn with_require_upper(mut self, required: bool) -> Self {
        self.require_upper = required;
        self
    }

    /// Require at least one lowercase letter.
    pub fn with_require_lower(mut self, required: bool) -> Self {
        self.require_lower = required;
        self
    }

    /// Require at least one digit.
    pub fn with_require_digit(mut self, required: bool) -> Self {
        self.require_digit = required;
        self
    }

    /// Require at least one special character.
    pub fn with_require_special(mut self, required: bool) -> Self {
        self.require_special = required;
        self
    }

    /// Set bcrypt cost factor.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Replace zero fields with defaults and bring the rest into range.
    ///
    /// # Returns
    /// Effective policy: lengths non-zero with `max_length >= min_length`,
    /// cost within `MIN_COST..=MAX_COST`
    pub fn normalized(mut self) -> Self {
        if self.min_length == 0 {
            self.min_length = DEFAULT_MIN_LENGTH;
        }
        if self.max_length == 0 {
            self.max_length = DEFAULT_MAX_LENGTH;
        }
        if self.max_length < self.min_length {
            self.max_length = self.min_length;
        }
        if self.cost == 0 {
            self.cost = DEFAULT_COST;
        }
        self.cost = self.cost.clamp(MIN_COST, MAX_COST);
        self
    }

    /// Number of character classes the policy makes mandatory.
    pub fn required_classes(&self) -> usize {
        [
            self.require_upper,
            self.require_lower,
            self.require_digit,
            self.require_special,
        ]
        .iter()
        .filter(|required| **required)
        .count()
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            require_upper: true,
            require_lower: true,
            require_digit: true,
            require_special: false,
            cost: DEFAULT_COST,
        }
    }
}
