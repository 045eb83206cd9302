//! Inspect command.

use std::path::Path;

use crate::cli::output;
use crate::core::inspect::inspect;
use crate::error::{Error, Result};

/// Print an archive's entries and manifest check results.
///
/// Fails with `Error::InspectionFailed` if any check fails.
pub fn execute(archive: &Path) -> Result<()> {
    let inspection = inspect(archive)?;

    output::section("Entries");
    for (name, size) in &inspection.entries {
        output::list_item(&format!("{}  {}", name, output::dimmed(format!("{} bytes", size))));
    }

    output::section("Checks");
    match &inspection.manifest {
        Some(manifest) => output::kv("manifest", format!("{} entries", manifest.len())),
        None => output::list_problem("manifest.json missing"),
    }
    if inspection.signature_present {
        output::kv("signature", "present");
    } else {
        output::list_problem("signature missing or empty");
    }
    for mismatch in &inspection.mismatched {
        output::list_problem(&format!(
            "{}: digest {} does not match manifest {}",
            mismatch.name, mismatch.actual, mismatch.expected
        ));
    }
    for name in &inspection.missing {
        output::list_problem(&format!("{}: listed in manifest but not in archive", name));
    }
    for name in &inspection.unlisted {
        output::list_problem(&format!("{}: not listed in manifest", name));
    }

    if inspection.is_valid() {
        println!();
        output::success(&format!("{} is consistent", output::path(archive.display())));
        Ok(())
    } else {
        Err(Error::InspectionFailed(archive.to_path_buf()))
    }
}
