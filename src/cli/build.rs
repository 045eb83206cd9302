//! Build command.
//!
//! Loads `pkpass.toml`, applies command-line overrides and runs the
//! packaging pipeline.

use std::path::PathBuf;

use dialoguer::Password;
use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::{output, BuildArgs};
use crate::core::config::Config;
use crate::core::constants::PASS_FILE;
use crate::core::pipeline::{Asset, PassBuilder};
use crate::core::signer::Signer;
use crate::error::{ConfigError, Error, Result};

/// Build a signed archive.
pub fn execute(args: BuildArgs) -> Result<()> {
    let config = Config::load(&args.config)?;

    let assets = args
        .assets
        .iter()
        .map(|arg| parse_asset(arg))
        .collect::<Result<Vec<_>>>()?;

    let pass_json = std::fs::read(&args.pass).map_err(|source| Error::FileRead {
        name: PASS_FILE.to_string(),
        path: args.pass.clone(),
        source,
    })?;

    let password = password_override(&args)?;
    let credentials = config.signing_credentials(password)?;
    let signer = select_signer(&args, &config)?;

    let mut options = config.options();
    if let Some(dir) = args.output_dir {
        options.output_dir = Some(dir);
    }
    if let Some(name) = args.name {
        options.name = Some(name);
    }
    if args.keep_staging {
        options.cleanup = false;
    }

    debug!(signer = signer.name(), assets = assets.len(), "starting build");

    let archive = PassBuilder::new(signer)
        .with_options(options)
        .generate(&pass_json, &assets, &credentials)?;

    output::success(&format!("built {}", output::path(archive.path.display())));
    output::kv("entries", archive.manifest.len() + 2);
    if let Some(staging) = &archive.staging_dir {
        output::kv("staging", output::path(staging.display()));
    }
    Ok(())
}

/// Parse `NAME=PATH` or a bare `PATH`.
///
/// The argument is only split when the part before the first `=` is a bare
/// name; otherwise the whole argument is treated as a path.
pub fn parse_asset(arg: &str) -> Result<Asset> {
    if let Some((name, path)) = arg.split_once('=') {
        let bare = !name.is_empty() && !name.contains(|c: char| c == '/' || c == '\\');
        if bare && !path.is_empty() {
            return Ok(Asset::new(name, path));
        }
    }
    Asset::from_path(PathBuf::from(arg))
}

/// Password from `--password-prompt` or `--password-env`, if either was given.
fn password_override(args: &BuildArgs) -> Result<Option<Zeroizing<String>>> {
    if args.password_prompt {
        let password = Zeroizing::new(
            Password::new()
                .with_prompt("Private key password")
                .allow_empty_password(true)
                .interact()?,
        );
        return Ok(Some(password));
    }
    match &args.password_env {
        Some(var) => std::env::var(var)
            .map(|value| Some(Zeroizing::new(value)))
            .map_err(|_| ConfigError::MissingEnv(var.clone()).into()),
        None => Ok(None),
    }
}

#[cfg(feature = "native")]
fn select_signer(args: &BuildArgs, config: &Config) -> Result<Box<dyn Signer>> {
    if args.native {
        Ok(Box::new(crate::core::signer::native::NativeSigner))
    } else {
        Ok(Box::new(config.signer()))
    }
}

#[cfg(not(feature = "native"))]
fn select_signer(args: &BuildArgs, config: &Config) -> Result<Box<dyn Signer>> {
    if args.native {
        return Err(crate::error::SigningError::Backend(
            "--native requires pkpass built with the `native` feature".to_string(),
        )
        .into());
    }
    Ok(Box::new(config.signer()))
}
