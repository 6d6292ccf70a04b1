use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::rngs::OsRng;
use rand::rngs::StdRng;
use rand::Rng;
use rand::RngCore;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use super::errors::PasswordError;
use super::policy::PolicyConfig;
use super::strength::DIGITS;
use super::strength::LOWERCASE;
use super::strength::SPECIAL;
use super::strength::UPPERCASE;

/// Failure of a random source to produce a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Random source unavailable: {0}")]
pub struct EntropyError(pub String);

/// Source of uniformly distributed indexes.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource {
    /// Draw an index in `0..upper`. `upper` is never zero.
    fn try_index(&mut self, upper: usize) -> Result<usize, EntropyError>;
}

/// Operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn try_index(&mut self, upper: usize) -> Result<usize, EntropyError> {
        let upper = upper as u64;
        // Largest multiple of `upper` that fits; draws at or above it are rejected.
        let zone = u64::MAX - u64::MAX % upper;

        loop {
            let mut bytes = [0u8; 8];
            OsRng
                .try_fill_bytes(&mut bytes)
                .map_err(|e| EntropyError(e.to_string()))?;

            let value = u64::from_le_bytes(bytes);
            if value < zone {
                return Ok((value % upper) as usize);
            }
        }
    }
}

/// Which random path produced a generated password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Entropy {
    Secure,
    /// The secure source failed and a time-seeded PRNG took over.
    Degraded,
}

/// Randomly generated password tagged with its entropy path.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedPassword {
    value: String,
    entropy: Entropy,
}

impl GeneratedPassword {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn entropy(&self) -> Entropy {
        self.entropy
    }

    pub fn is_degraded(&self) -> bool {
        self.entropy == Entropy::Degraded
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Debug for GeneratedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedPassword")
            .field("value", &"<redacted>")
            .field("entropy", &self.entropy)
            .finish()
    }
}

/// Draws from a primary source until it fails, then from a time-seeded
/// fallback for the rest of its life.
struct Sampler<'a, R: RandomSource + ?Sized> {
    primary: &'a mut R,
    fallback: Option<StdRng>,
}

impl<'a, R: RandomSource + ?Sized> Sampler<'a, R> {
    fn new(primary: &'a mut R) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    fn index(&mut self, upper: usize) -> usize {
        if let Some(rng) = self.fallback.as_mut() {
            return rng.gen_range(0..upper);
        }

        match self.primary.try_index(upper) {
            Ok(index) => index,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Secure random source failed, continuing with time-seeded generator"
                );
                let rng = self.fallback.insert(time_seeded());
                rng.gen_range(0..upper)
            }
        }
    }

    fn pick(&mut self, charset: &[u8]) -> u8 {
        charset[self.index(charset.len())]
    }

    fn entropy(&self) -> Entropy {
        if self.fallback.is_some() {
            Entropy::Degraded
        } else {
            Entropy::Secure
        }
    }
}

fn time_seeded() -> StdRng {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    StdRng::seed_from_u64(nanos as u64)
}

/// Generate a password that satisfies `config`.
///
/// One character is drawn from each required class, the rest uniformly from
/// the union of required classes (lower, upper and digits when none are
/// required), and the whole buffer is Fisher-Yates shuffled.
///
/// # Arguments
/// * `config` - Normalized policy
/// * `length` - Requested length, clamped to the policy bounds
/// * `source` - Random source; failures switch to the degraded path
///
/// # Errors
/// * `GenerationFailed` - Clamped length cannot fit every required class
pub fn generate_with<R: RandomSource + ?Sized>(
    config: &PolicyConfig,
    length: usize,
    source: &mut R,
) -> Result<GeneratedPassword, PasswordError> {
    let length = length.clamp(config.min_length, config.max_length);

    let classes: Vec<&[u8]> = [
        (config.require_lower, LOWERCASE),
        (config.require_upper, UPPERCASE),
        (config.require_digit, DIGITS),
        (config.require_special, SPECIAL),
    ]
    .into_iter()
    .filter(|(required, _)| *required)
    .map(|(_, class)| class.as_bytes())
    .collect();

    if classes.len() > length {
        return Err(PasswordError::GenerationFailed(format!(
            "length {length} cannot hold {} required character classes",
            classes.len()
        )));
    }

    let charset: Vec<u8> = if classes.is_empty() {
        [LOWERCASE, UPPERCASE, DIGITS].concat().into_bytes()
    } else {
        classes.concat()
    };

    let mut sampler = Sampler::new(source);
    let mut password = Vec::with_capacity(length);

    for class in &classes {
        password.push(sampler.pick(class));
    }
    while password.len() < length {
        password.push(sampler.pick(&charset));
    }

    for i in (1..password.len()).rev() {
        let j = sampler.index(i + 1);
        password.swap(i, j);
    }

    let entropy = sampler.entropy();
    let value = String::from_utf8(password)
        .map_err(|e| PasswordError::GenerationFailed(e.to_string()))?;

    Ok(GeneratedPassword { value, entropy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::strength;

    #[test]
    fn test_os_random_stays_in_range() {
        let mut source = OsRandom;
        for upper in [1, 2, 10, 26, 62, 88] {
            for _ in 0..200 {
                let index = source.try_index(upper).expect("OS random failed");
                assert!(index < upper);
            }
        }
    }

    #[test]
    fn test_generated_password_satisfies_policy() {
        let config = PolicyConfig::default().with_require_special(true).normalized();

        for _ in 0..200 {
            let generated = generate_with(&config, 12, &mut OsRandom).expect("Generation failed");

            assert_eq!(generated.as_str().len(), 12);
            assert_eq!(generated.entropy(), Entropy::Secure);
            assert!(strength::validate(&config, generated.as_str()).valid);
        }
    }

    #[test]
    fn test_length_is_clamped() {
        let config = PolicyConfig::default()
            .with_min_length(10)
            .with_max_length(20)
            .normalized();

        let short = generate_with(&config, 3, &mut OsRandom).expect("Generation failed");
        let long = generate_with(&config, 500, &mut OsRandom).expect("Generation failed");

        assert_eq!(short.as_str().len(), 10);
        assert_eq!(long.as_str().len(), 20);
    }

    #[test]
    fn test_no_required_classes_uses_alphanumerics() {
        let config = PolicyConfig::default()
            .with_require_upper(false)
            .with_require_lower(false)
            .with_require_digit(false)
            .normalized();

        let generated = generate_with(&config, 64, &mut OsRandom).expect("Generation failed");
        assert!(generated.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_required_classes_must_fit() {
        let config = PolicyConfig {
            min_length: 2,
            max_length: 3,
            require_upper: true,
            require_lower: true,
            require_digit: true,
            require_special: true,
            cost: 4,
        };

        let result = generate_with(&config, 2, &mut OsRandom);
        assert!(matches!(result, Err(PasswordError::GenerationFailed(_))));
    }

    #[test]
    fn test_failing_source_is_flagged_degraded() {
        let config = PolicyConfig::default().normalized();
        let mut source = MockRandomSource::new();
        source
            .expect_try_index()
            .times(1)
            .returning(|_| Err(EntropyError("device unavailable".to_string())));

        let generated = generate_with(&config, 16, &mut source).expect("Generation failed");

        assert!(generated.is_degraded());
        assert_eq!(generated.as_str().len(), 16);
        assert!(strength::validate(&config, generated.as_str()).valid);
    }

    #[test]
    fn test_mandatory_characters_are_shuffled() {
        let config = PolicyConfig::default().normalized();
        let mut source = MockRandomSource::new();
        // Always pick the first character of a set, and always swap with 0.
        source.expect_try_index().returning(|_| Ok(0));

        let generated = generate_with(&config, 8, &mut source).expect("Generation failed");

        // Drawn as "aA0aaaaa"; each swap with index 0 rotates the buffer.
        assert_eq!(generated.as_str(), "A0aaaaaa");
        assert_eq!(generated.entropy(), Entropy::Secure);
    }

    #[test]
    fn test_debug_redacts_value() {
        let generated = generate_with(&PolicyConfig::default(), 8, &mut OsRandom)
            .expect("Generation failed");
        let debug = format!("{generated:?}");

        assert!(!debug.contains(generated.as_str()));
    }
}
