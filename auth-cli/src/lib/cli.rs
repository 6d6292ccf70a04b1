use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// Upper bound on passwords produced by a single `generate` call.
pub const MAX_GENERATE_COUNT: u64 = 1000;

/// Password policy and token toolkit.
#[derive(Debug, Parser)]
#[command(name = "authkit", version, about)]
pub struct Cli {
    /// Configuration file replacing config/default.toml and config/{RUN_MODE}.toml
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a password against the policy and print its strength report
    Validate { password: String },

    /// Validate and hash a password
    Hash { password: String },

    /// Verify a password against a stored hash
    Verify { password: String, hash: String },

    /// Report whether a stored hash uses an outdated cost
    NeedsRehash { hash: String },

    /// Generate random passwords that satisfy the policy
    Generate {
        #[arg(long, short = 'l', default_value_t = 16)]
        length: usize,

        #[arg(
            long,
            short = 'n',
            default_value_t = 1,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=MAX_GENERATE_COUNT)
        )]
        count: usize,
    },

    /// Issue and inspect tokens
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue an access/refresh token pair
    Issue(IssueArgs),

    /// Verify a token and print its claims
    Inspect { token: String },
}

#[derive(Debug, Args)]
pub struct IssueArgs {
    pub user_id: String,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long = "role")]
    pub roles: Vec<String>,
}
