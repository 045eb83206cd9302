//! Pass packaging pipeline.
//!
//! Turns a serialized pass document and a set of asset files into a signed
//! `.pkpass` archive:
//!
//! ```text
//! resolve credentials → write pass.json → write manifest.json → sign
//!     → copy assets → zip → (remove staging) → dispose credentials
//! ```
//!
//! The pipeline halts at the first failing stage. Credential temp files are
//! disposed exactly once on every exit path, and a failed run never leaves
//! its staging directory or a partial archive behind.

use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::archive;
use crate::core::constants::{
    ARCHIVE_EXTENSION, MANIFEST_FILE, PASS_FILE, SIGNATURE_FILE, STAGING_PREFIX,
};
use crate::core::credentials::{self, ResolvedCredentials, SigningCredentials};
use crate::core::manifest::{self, Manifest};
use crate::core::signer::{SignRequest, Signer};
use crate::core::token::random_token;
use crate::error::{Error, Result};

/// Pipeline stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidateInputs,
    ResolveCredentials,
    WriteDocument,
    WriteManifest,
    Sign,
    CopyAssets,
    Archive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidateInputs => "input validation",
            Stage::ResolveCredentials => "credential resolution",
            Stage::WriteDocument => "writing pass document",
            Stage::WriteManifest => "writing manifest",
            Stage::Sign => "signing",
            Stage::CopyAssets => "copying assets",
            Stage::Archive => "archiving",
        };
        f.write_str(name)
    }
}

/// A failed pipeline run: the stage that failed and why.
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    stage: Stage,
    #[source]
    source: Box<Error>,
}

impl PipelineError {
    fn new(stage: Stage, source: Error) -> Self {
        Self {
            stage,
            source: Box::new(source),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The underlying stage error.
    pub fn error(&self) -> &Error {
        &self.source
    }

    pub fn into_error(self) -> Error {
        *self.source
    }
}

fn at(stage: Stage) -> impl Fn(Error) -> PipelineError {
    move |e| PipelineError::new(stage, e)
}

/// A caller-supplied file shipped in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Entry name inside the archive and key in the manifest.
    pub name: String,
    /// Where the bytes are read from.
    pub path: PathBuf,
}

impl Asset {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Asset named after the file's own name.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAssetName` if the path has no file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidAssetName {
                name: path.display().to_string(),
                reason: "path has no file name",
            })?;
        Ok(Self { name, path })
    }
}

/// Check that an asset name is a flat entry that cannot clobber the
/// generated entries.
///
/// # Errors
///
/// Returns `Error::InvalidAssetName` describing the problem.
pub fn validate_asset_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a directory reference")
    } else if name.contains(|c: char| c == '/' || c == '\\') {
        Some("archive entries are flat; name must not contain path separators")
    } else if [PASS_FILE, MANIFEST_FILE, SIGNATURE_FILE].contains(&name) {
        Some("name is reserved for a generated entry")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidAssetName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Where and how the archive is produced.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory receiving the archive. Defaults to the system temp dir.
    pub output_dir: Option<PathBuf>,
    /// Archive base name. Defaults to a random token.
    pub name: Option<String>,
    /// Remove the staging directory after a successful build.
    pub cleanup: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_dir: None,
            name: None,
            cleanup: true,
        }
    }
}

impl Options {
    /// Full path of the archive to produce.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOutputName` if `name` is not a bare file name.
    pub fn archive_path(&self) -> Result<PathBuf> {
        let dir = self.output_dir.clone().unwrap_or_else(std::env::temp_dir);
        let name = match &self.name {
            Some(name) => {
                if name.is_empty() || Path::new(name).file_name() != Some(OsStr::new(name)) {
                    return Err(Error::InvalidOutputName(name.clone()));
                }
                name.clone()
            }
            None => random_token(),
        };

        let suffix = format!(".{}", ARCHIVE_EXTENSION);
        let file = if name.ends_with(&suffix) {
            name
        } else {
            format!("{}{}", name, suffix)
        };
        Ok(dir.join(file))
    }
}

/// A successfully produced archive.
#[derive(Debug, Clone)]
pub struct SignedArchive {
    /// Path of the `.pkpass` file.
    pub path: PathBuf,
    /// Manifest that was signed and shipped.
    pub manifest: Manifest,
    /// Staging directory, when kept via `Options::cleanup = false`.
    pub staging_dir: Option<PathBuf>,
}

/// Per-invocation working directory, removed on drop unless kept.
struct Staging {
    path: PathBuf,
    keep: bool,
}

impl Staging {
    fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("{}{}", STAGING_PREFIX, random_token()));

        let mut builder = std::fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&path).map_err(|source| Error::FileWrite {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "created staging directory");
        Ok(Self { path, keep: false })
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed staging directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove staging directory")
            }
        }
    }
}

/// Builds signed pass archives with a given [`Signer`].
#[derive(Debug, Clone)]
pub struct PassBuilder<S> {
    signer: S,
    options: Options,
}

impl<S: Signer> PassBuilder<S> {
    pub fn new(signer: S) -> Self {
        Self {
            signer,
            options: Options::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Produce a signed archive from `pass_json` and `assets`.
    ///
    /// `pass_json` is written verbatim as `pass.json`. Credential temp files
    /// are removed before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] naming the first stage that failed.
    pub fn generate(
        &self,
        pass_json: &[u8],
        assets: &[Asset],
        credentials: &SigningCredentials,
    ) -> std::result::Result<SignedArchive, PipelineError> {
        debug!(
            assets = assets.len(),
            signer = self.signer.name(),
            "generating pass archive"
        );

        for asset in assets {
            validate_asset_name(&asset.name).map_err(at(Stage::ValidateInputs))?;
        }
        let archive_path = self
            .options
            .archive_path()
            .map_err(at(Stage::ValidateInputs))?;

        let mut creds = credentials::resolve(credentials).map_err(at(Stage::ResolveCredentials))?;
        let result = self.run(pass_json, assets, &creds, &archive_path);
        creds.dispose();

        match &result {
            Ok(archive) => debug!(path = %archive.path.display(), "pass archive ready"),
            Err(e) => debug!(stage = %e.stage(), error = %e.error(), "pass archive failed"),
        }
        result
    }

    fn run(
        &self,
        pass_json: &[u8],
        assets: &[Asset],
        creds: &ResolvedCredentials,
        archive_path: &Path,
    ) -> std::result::Result<SignedArchive, PipelineError> {
        let staging = Staging::create().map_err(at(Stage::WriteDocument))?;

        let pass_path = staging.join(PASS_FILE);
        write_file(&pass_path, pass_json).map_err(at(Stage::WriteDocument))?;
        debug!(stage = %Stage::WriteDocument, "done");

        let mut entries: Vec<(&str, &Path)> = vec![(PASS_FILE, &pass_path)];
        entries.extend(assets.iter().map(|a| (a.name.as_str(), a.path.as_path())));
        let manifest = manifest::build(&entries).map_err(at(Stage::WriteManifest))?;
        let manifest_path = staging.join(MANIFEST_FILE);
        let manifest_json = manifest.to_json().map_err(at(Stage::WriteManifest))?;
        write_file(&manifest_path, &manifest_json).map_err(at(Stage::WriteManifest))?;
        debug!(stage = %Stage::WriteManifest, entries = manifest.len(), "done");

        let signature_path = staging.join(SIGNATURE_FILE);
        self.signer
            .sign(&SignRequest::new(&manifest_path, &signature_path, creds))
            .map_err(at(Stage::Sign))?;
        debug!(stage = %Stage::Sign, "done");

        for asset in assets {
            copy_asset(asset, &staging.join(&asset.name)).map_err(at(Stage::CopyAssets))?;
        }
        debug!(stage = %Stage::CopyAssets, assets = assets.len(), "done");

        if let Some(dir) = archive_path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|source| Error::FileWrite {
                    path: dir.to_path_buf(),
                    source,
                })
                .map_err(at(Stage::Archive))?;
        }
        archive::assemble(&staging.path, archive_path).map_err(at(Stage::Archive))?;
        debug!(stage = %Stage::Archive, path = %archive_path.display(), "done");

        let staging_dir = if self.options.cleanup {
            drop(staging);
            None
        } else {
            Some(staging.keep())
        };

        Ok(SignedArchive {
            path: archive_path.to_path_buf(),
            manifest,
            staging_dir,
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_asset(asset: &Asset, dest: &Path) -> Result<()> {
    let mut source = File::open(&asset.path).map_err(|source| Error::FileRead {
        name: asset.name.clone(),
        path: asset.path.clone(),
        source,
    })?;
    let write_err = |source| Error::FileWrite {
        path: dest.to_path_buf(),
        source,
    };
    let mut target = File::create(dest).map_err(write_err)?;
    io::copy(&mut source, &mut target).map_err(write_err)?;
    Ok(())
}
