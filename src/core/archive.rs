//! Archive assembly.
//!
//! Packs every file in a staging directory into a flat zip archive.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};
use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Zip every regular file directly inside `staging_dir` into `output`.
///
/// Subdirectories are skipped; entry names are bare file names. If writing
/// fails after `output` was created, the partial file is removed. Nothing is
/// removed when `output` could not be created in the first place.
///
/// # Errors
///
/// Returns `Error::ArchiveCreation` if the archive cannot be created or an
/// entry cannot be read or written.
pub fn assemble(staging_dir: &Path, output: &Path) -> Result<PathBuf> {
    let fail = |source: ZipError| Error::ArchiveCreation {
        path: output.to_path_buf(),
        source,
    };

    let files = staged_files(staging_dir).map_err(|e| fail(e.into()))?;
    let file = File::create(output).map_err(|e| fail(e.into()))?;

    if let Err(e) = write_entries(file, &files) {
        remove_partial(output);
        return Err(fail(e));
    }

    debug!(entries = files.len(), path = %output.display(), "archive written");
    Ok(output.to_path_buf())
}

fn write_entries(file: File, files: &[(String, PathBuf)]) -> ZipResult<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in files {
        trace!(entry = %name, "adding archive entry");
        zip.start_file(name.as_str(), options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial archive"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove partial archive"),
    }
}

/// Read every entry of an archive into memory, keyed by entry name.
///
/// # Errors
///
/// Returns `Error::FileRead` if the archive cannot be opened, or
/// `Error::ArchiveRead` if it is not a readable zip.
pub fn read_entries(archive: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let file = File::open(archive).map_err(|source| Error::FileRead {
        name: archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: archive.to_path_buf(),
        source,
    })?;
    let fail = |source: ZipError| Error::ArchiveRead {
        path: archive.to_path_buf(),
        source,
    };

    let mut zip = ZipArchive::new(file).map_err(fail)?;
    let mut entries = BTreeMap::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(fail)?;
        if entry.is_dir() {
            continue;
        }
        // The declared size is untrusted; let the buffer grow with real data.
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(|e| fail(e.into()))?;
        entries.insert(entry.name().to_string(), bytes);
    }
    Ok(entries)
}

fn staged_files(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((name, entry.path()));
    }
    files.sort();
    Ok(files)
}
