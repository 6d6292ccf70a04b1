use std::process::ExitCode;

use anyhow::Context;
use auth_cli::config::Config;
use auth_cli::App;
use auth_cli::Cli;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authkit=info,auth_cli=info,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool, anyhow::Error> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    tracing::debug!(
        min_length = config.password.min_length,
        max_length = config.password.max_length,
        cost = config.password.cost,
        jwt_issuer = %config.jwt.issuer,
        "Configuration loaded"
    );

    let app = App::new(config);
    let output = app.execute(&cli.command)?;

    println!("{}", output.stdout);
    Ok(output.success)
}
