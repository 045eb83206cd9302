//! Test assertion helpers.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Output;

/// Assert that a command output was successful.
pub fn assert_success(output: &Output) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("Command failed:\n{}", stderr);
    }
}

/// Assert that a command output failed.
pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "Expected command to fail but it succeeded"
    );
}

/// Get stdout as String.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Get stderr as String.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Assert stdout contains a string.
pub fn assert_stdout_contains(output: &Output, expected: &str) {
    let out = stdout(output);
    assert!(
        out.contains(expected),
        "stdout missing '{}', got: {}",
        expected,
        out
    );
}

/// Assert stderr contains a string.
pub fn assert_stderr_contains(output: &Output, expected: &str) {
    let err = stderr(output);
    assert!(
        err.contains(expected),
        "stderr missing '{}', got: {}",
        expected,
        err
    );
}

/// Read every entry of an archive.
pub fn archive_entries(path: &Path) -> BTreeMap<String, Vec<u8>> {
    pkpass::core::archive::read_entries(path).expect("archive should be readable")
}

/// Assert an archive holds exactly `names`.
pub fn assert_archive_names(path: &Path, names: &[&str]) {
    let entries = archive_entries(path);
    let mut actual: Vec<&str> = entries.keys().map(String::as_str).collect();
    let mut expected = names.to_vec();
    actual.sort_unstable();
    expected.sort_unstable();
    assert_eq!(actual, expected, "unexpected entries in {}", path.display());
}

/// Assert nothing with a `.pkpass` extension exists in `dir`.
pub fn assert_no_archives(dir: &Path) {
    let archives: Vec<_> = std::fs::read_dir(dir)
        .expect("output dir should exist")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "pkpass"))
        .map(|e| e.path())
        .collect();
    assert!(archives.is_empty(), "unexpected archives: {:?}", archives);
}
