//! pkpass - Build signed wallet pass archives.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pkpass::cli::output;
use pkpass::cli::{execute, Cli};
use pkpass::error::{ConfigError, Error, SigningError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("PKPASS_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("pkpass=debug")
        } else {
            EnvFilter::new("pkpass=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .init();

    if let Err(e) = execute(cli.command) {
        output::error(&e.to_string());
        if let Some(hint) = suggestion(&e) {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

fn suggestion(e: &Error) -> Option<&'static str> {
    match e.as_signing() {
        Some(SigningError::ToolNotFound(_)) => {
            return Some("install openssl or set [signing] openssl in pkpass.toml")
        }
        Some(SigningError::Failed { stderr, .. }) if is_password_failure(stderr) => {
            return Some("check the private key password (--password-prompt or password_env)")
        }
        Some(SigningError::Timeout(_)) => {
            return Some("raise [signing] timeout_secs in pkpass.toml")
        }
        _ => {}
    }
    match e {
        Error::Config(ConfigError::NotFound(_)) => {
            Some("create pkpass.toml or point to one with --config")
        }
        Error::Config(ConfigError::MissingEnv(_)) => {
            Some("export the variable or use --password-prompt")
        }
        _ => None,
    }
}

fn is_password_failure(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    ["bad decrypt", "bad password", "unable to load", "private key", "signing key"]
        .iter()
        .any(|needle| stderr.contains(needle))
}
