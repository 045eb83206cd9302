//! Test support utilities for pkpass integration tests.
//!
//! Provides isolated working directories, fixtures, a fake signer and
//! helpers for driving the binary.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod signer;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use signer::FakeSigner;

use std::path::PathBuf;

use pkpass::core::pipeline::{Asset, Options};
use tempfile::TempDir;

/// Test environment with an isolated project directory.
///
/// No process-global state is mutated; child processes use `.current_dir()`
/// so tests can safely run in parallel.
pub struct Test {
    /// Project directory holding inputs.
    pub dir: TempDir,
    /// Directory receiving archives.
    pub out: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let out = TempDir::new().expect("failed to create output dir");
        Self { dir, out }
    }

    /// Write a file into the project directory and return its path.
    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, bytes).expect("failed to write fixture");
        path
    }

    /// Write `TEST_PASS` as `pass.json`.
    pub fn pass(&self) -> PathBuf {
        self.write("pass.json", TEST_PASS.as_bytes())
    }

    /// Write an asset file under `assets/` and describe it.
    pub fn asset(&self, name: &str, bytes: &[u8]) -> Asset {
        Asset::new(name, self.write(&format!("assets/{}", name), bytes))
    }

    /// Pipeline options writing `name.pkpass` into `self.out`.
    pub fn options(&self, name: &str) -> Options {
        Options {
            output_dir: Some(self.out.path().to_path_buf()),
            name: Some(name.to_string()),
            cleanup: true,
        }
    }
}
