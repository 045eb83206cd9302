//! Command-line interface.

pub mod build;
pub mod completions;
pub mod inspect;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::constants::CONFIG_FILE;

/// pkpass - Build signed wallet pass archives.
#[derive(Parser)]
#[command(
    name = "pkpass",
    about = "Build signed wallet pass archives (.pkpass)",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Sign a pass document and package it with its assets
    Build(BuildArgs),

    /// List an archive's entries and re-verify its manifest
    Inspect {
        /// Path to a .pkpass archive
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for `pkpass build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Serialized pass document, shipped as pass.json
    #[arg(long, value_name = "PATH")]
    pub pass: PathBuf,

    /// Asset to ship, as NAME=PATH or PATH (named after the file)
    #[arg(short, long = "asset", value_name = "ASSET")]
    pub assets: Vec<String>,

    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory receiving the archive
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Archive base name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Keep the staging directory after a successful build
    #[arg(long)]
    pub keep_staging: bool,

    /// Environment variable holding the private key password
    #[arg(long, value_name = "VAR", conflicts_with = "password_prompt")]
    pub password_env: Option<String>,

    /// Prompt for the private key password
    #[arg(long)]
    pub password_prompt: bool,

    /// Sign in-process instead of running the openssl binary (requires the
    /// `native` feature)
    #[arg(long)]
    pub native: bool,
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    match command {
        Command::Build(args) => build::execute(args),
        Command::Inspect { archive } => inspect::execute(&archive),
        Command::Completions { shell } => completions::execute(shell, &mut std::io::stdout()),
    }
}
