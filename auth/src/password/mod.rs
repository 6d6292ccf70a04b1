//! Password policy engine: validation, scoring, bcrypt hashing and
//! policy-compliant random generation.

pub mod errors;
pub mod generator;
pub mod hasher;
pub mod manager;
pub mod policy;
pub mod strength;

pub use errors::PasswordError;
pub use generator::Entropy;
pub use generator::EntropyError;
pub use generator::GeneratedPassword;
pub use generator::OsRandom;
pub use generator::RandomSource;
pub use hasher::PasswordHasher;
pub use manager::HashedPassword;
pub use manager::PasswordManager;
pub use policy::PolicyConfig;
pub use strength::StrengthTier;
pub use strength::ValidationResult;
