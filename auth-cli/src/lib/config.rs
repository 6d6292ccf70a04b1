use std::collections::HashMap;
use std::env;
use std::path::Path;

use auth::jwt::parse_algorithm;
use auth::JwtConfig;
use auth::JwtError;
use auth::PolicyConfig;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Environment variable prefix, e.g. `AUTHKIT__PASSWORD__COST=10`.
pub const ENV_PREFIX: &str = "AUTHKIT";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub password: PasswordSettings,
    pub jwt: JwtSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PasswordSettings {
    pub min_length: usize,
    pub max_length: usize,
    pub require_upper: bool,
    pub require_lower: bool,
    pub require_digit: bool,
    pub require_special: bool,
    pub cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
    pub issuer: String,
    pub algorithm: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (AUTHKIT__PASSWORD__COST, AUTHKIT__JWT__SECRET, etc.)
    /// 2. `path` if given, otherwise config/{RUN_MODE}.toml over config/default.toml
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Same as [`Config::load`] but reads overrides from `env_vars` instead
    /// of the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => {
                let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
                builder
                    .add_source(File::with_name("config/default").required(false))
                    .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            }
        };

        let configuration = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .build()?;

        configuration.try_deserialize()
    }
}

impl PasswordSettings {
    /// Map settings onto the engine's policy, field by field.
    pub fn to_policy(&self) -> PolicyConfig {
        PolicyConfig::new()
            .with_min_length(self.min_length)
            .with_max_length(self.max_length)
            .with_require_upper(self.require_upper)
            .with_require_lower(self.require_lower)
            .with_require_digit(self.require_digit)
            .with_require_special(self.require_special)
            .with_cost(self.cost)
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        let policy = PolicyConfig::default();
        Self {
            min_length: policy.min_length,
            max_length: policy.max_length,
            require_upper: policy.require_upper,
            require_lower: policy.require_lower,
            require_digit: policy.require_digit,
            require_special: policy.require_special,
            cost: policy.cost,
        }
    }
}

impl JwtSettings {
    /// Map settings onto a token manager configuration.
    ///
    /// # Errors
    /// * `UnsupportedAlgorithm` - Algorithm is not HS256, HS384 or HS512
    /// * `InvalidConfiguration` - A TTL does not fit in a duration
    pub fn to_jwt_config(&self) -> Result<JwtConfig, JwtError> {
        let access_token_ttl = Duration::try_minutes(self.access_token_ttl_minutes)
            .ok_or_else(|| {
                out_of_range("access_token_ttl_minutes", self.access_token_ttl_minutes)
            })?;
        let refresh_token_ttl = Duration::try_hours(self.refresh_token_ttl_hours)
            .ok_or_else(|| out_of_range("refresh_token_ttl_hours", self.refresh_token_ttl_hours))?;

        Ok(JwtConfig::new(&self.secret)
            .with_access_token_ttl(access_token_ttl)
            .with_refresh_token_ttl(refresh_token_ttl)
            .with_issuer(&self.issuer)
            .with_algorithm(parse_algorithm(&self.algorithm)?))
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_hours: 7 * 24,
            issuer: auth::jwt::manager::DEFAULT_ISSUER.to_string(),
            algorithm: "HS256".to_string(),
        }
    }
}

fn out_of_range(field: &str, value: i64) -> JwtError {
    JwtError::InvalidConfiguration(format!("jwt.{field} = {value} is out of range"))
}
