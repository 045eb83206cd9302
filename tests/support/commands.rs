//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::path::Path;
use std::process::Output;

impl Test {
    /// Create a pkpass command running in the project directory.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("pkpass").expect("failed to find pkpass binary");
        cmd.env_remove("PKPASS_LOG");
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `pkpass build` with extra arguments.
    pub fn build(&self, args: &[&str]) -> Output {
        self.cmd()
            .arg("build")
            .args(args)
            .output()
            .expect("failed to run pkpass build")
    }

    /// Shortcut for `pkpass inspect`.
    pub fn inspect(&self, archive: &Path) -> Output {
        self.cmd()
            .arg("inspect")
            .arg(archive)
            .output()
            .expect("failed to run pkpass inspect")
    }

    /// Write a `pkpass.toml` pointing at file credentials.
    pub fn config(&self, wwdr: &Path, cert: &Path, key: &Path, extra: &str) -> std::path::PathBuf {
        let contents = format!(
            "[credentials]\nwwdr = {{ path = {:?} }}\nsigner_cert = {{ path = {:?} }}\nsigner_key = {{ path = {:?} }}\n{}",
            wwdr.display().to_string(),
            cert.display().to_string(),
            key.display().to_string(),
            extra
        );
        self.write("pkpass.toml", contents.as_bytes())
    }
}
