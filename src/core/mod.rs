//! Core library components.
//!
//! This module contains the reusable pass packaging logic: credential
//! resolution, manifest hashing, signing, archive assembly, and configuration.

pub mod archive;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod inspect;
pub mod manifest;
pub mod pipeline;
pub mod signer;
pub mod token;

pub use credentials::{CredentialSource, SigningCredentials};
pub use manifest::Manifest;
pub use pipeline::{Asset, Options, PassBuilder, SignedArchive, Stage};
pub use signer::{OpensslCli, Signer};
