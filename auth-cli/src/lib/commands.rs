use auth::Claims;
use auth::JwtError;
use auth::PasswordError;
use auth::PasswordManager;
use auth::TokenManager;
use serde::Serialize;
use thiserror::Error;

use crate::cli::Command;
use crate::cli::IssueArgs;
use crate::cli::TokenCommand;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What a command prints and whether it should exit successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub stdout: String,
    pub success: bool,
}

impl Output {
    fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            success: true,
        }
    }
}

pub struct App {
    passwords: PasswordManager,
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        let passwords = PasswordManager::new(config.password.to_policy());
        Self { passwords, config }
    }

    pub fn passwords(&self) -> &PasswordManager {
        &self.passwords
    }

    pub fn execute(&self, command: &Command) -> Result<Output, CommandError> {
        match command {
            Command::Validate { password } => {
                let result = self.passwords.validate(password);
                Ok(Output {
                    stdout: serde_json::to_string_pretty(&result)?,
                    success: result.valid,
                })
            }
            Command::Hash { password } => {
                let hashed = self.passwords.hash(password)?;
                Ok(Output::ok(serde_json::to_string_pretty(&hashed)?))
            }
            Command::Verify { password, hash } => {
                self.passwords.verify(password, hash)?;
                Ok(Output::ok("Password matches"))
            }
            Command::NeedsRehash { hash } => {
                let needed = self.passwords.needs_rehash(hash);
                Ok(Output::ok(needed.to_string()))
            }
            Command::Generate { length, count } => self.generate(*length, *count),
            Command::Token(TokenCommand::Issue(args)) => self.issue(args),
            Command::Token(TokenCommand::Inspect { token }) => self.inspect(token),
        }
    }

    fn generate(&self, length: usize, count: usize) -> Result<Output, CommandError> {
        let mut lines = Vec::new();

        for _ in 0..count {
            let generated = self.passwords.generate_random_password(length)?;
            lines.push(generated.into_string());
        }

        Ok(Output::ok(lines.join("\n")))
    }

    fn issue(&self, args: &IssueArgs) -> Result<Output, CommandError> {
        let tokens = self.tokens()?;

        let mut identity = Claims::new().with_subject(&args.user_id);
        if let Some(username) = &args.username {
            identity = identity.with_username(username);
        }
        if let Some(email) = &args.email {
            identity = identity.with_email(email);
        }
        for role in &args.roles {
            identity = identity.with_role(role);
        }

        let pair = tokens.generate_token_pair(&identity)?;
        Ok(Output::ok(serde_json::to_string_pretty(&pair)?))
    }

    fn inspect(&self, token: &str) -> Result<Output, CommandError> {
        let info = self.tokens()?.validate_token(token)?;

        let report = InspectReport {
            claims: &info.claims,
            issued_at: info.issued_at.map(|at| at.to_rfc3339()),
            expires_at: info.expires_at.to_rfc3339(),
        };
        Ok(Output::ok(serde_json::to_string_pretty(&report)?))
    }

    fn tokens(&self) -> Result<TokenManager, JwtError> {
        TokenManager::new(self.config.jwt.to_jwt_config()?)
    }
}

#[derive(Serialize)]
struct InspectReport<'a> {
    claims: &'a Claims,
    issued_at: Option<String>,
    expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut config = Config::default();
        config.password.cost = 4;
        config.jwt.secret = "test_secret_key_at_least_32_bytes!".to_string();
        App::new(config)
    }

    #[test]
    fn test_validate_reports_invalid_password() {
        let output = app()
            .execute(&Command::Validate {
                password: "password".to_string(),
            })
            .expect("Validate failed");

        assert!(!output.success);
        let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
        assert_eq!(report["valid"], false);
        assert_eq!(report["errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_hash_then_verify() {
        let app = app();
        let output = app
            .execute(&Command::Hash {
                password: "Password1".to_string(),
            })
            .expect("Hash failed");
        let hashed: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
        let hash = hashed["hash"].as_str().unwrap().to_string();

        assert_eq!(hashed["cost"], 4);

        let verified = app.execute(&Command::Verify {
            password: "Password1".to_string(),
            hash: hash.clone(),
        });
        assert!(verified.is_ok());

        let mismatch = app.execute(&Command::Verify {
            password: "Password2".to_string(),
            hash,
        });
        assert!(matches!(
            mismatch,
            Err(CommandError::Password(PasswordError::VerificationFailed))
        ));
    }

    #[test]
    fn test_generate_count() {
        let output = app()
            .execute(&Command::Generate {
                length: 12,
                count: 5,
            })
            .expect("Generate failed");

        let lines: Vec<&str> = output.stdout.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|line| line.len() == 12));
    }

    #[test]
    fn test_token_commands_need_secret() {
        let app = App::new(Config::default());
        let result = app.execute(&Command::Token(TokenCommand::Inspect {
            token: "a.b.c".to_string(),
        }));

        assert!(matches!(
            result,
            Err(CommandError::Jwt(JwtError::MissingSecret))
        ));
    }
}
