//! OpenSSL CLI signing backend.
//!
//! Signs manifests by running `openssl smime` as a subprocess.
//!
//! ## Requirements
//!
//! - `openssl` CLI must be installed (or configured via `[signing] openssl`)
//!
//! The key password is written to the child's stdin (`-passin stdin`) so it
//! never appears in the process table.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{discard_signature, ensure_signature, SignRequest, Signer};
use crate::core::constants::{OPENSSL_BIN, SIGNING_TIMEOUT};
use crate::error::{Result, SigningError};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Signer backed by the `openssl` command-line tool.
#[derive(Debug, Clone)]
pub struct OpensslCli {
    program: PathBuf,
    timeout: Duration,
}

impl OpensslCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(OPENSSL_BIN),
            timeout: SIGNING_TIMEOUT,
        }
    }

    /// Use a specific binary name or path instead of `openssl`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the signing process if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn tool(&self) -> String {
        self.program.display().to_string()
    }

    /// Resolve the binary, failing before any process is spawned.
    fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| SigningError::ToolNotFound(self.tool()).into())
    }

    fn command(&self, program: PathBuf, request: &SignRequest<'_>) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(["smime", "-sign", "-binary", "-outform", "DER"])
            .arg("-in")
            .arg(request.manifest)
            .arg("-out")
            .arg(request.signature)
            .arg("-signer")
            .arg(request.signer_cert)
            .arg("-inkey")
            .arg(request.signer_key)
            .arg("-certfile")
            .arg(request.wwdr)
            .args(["-passin", "stdin"]);

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for OpensslCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for OpensslCli {
    fn name(&self) -> &'static str {
        "openssl-cli"
    }

    fn sign(&self, request: &SignRequest<'_>) -> Result<()> {
        trace!(
            manifest = %request.manifest.display(),
            signature = %request.signature.display(),
            "signing with openssl"
        );

        let program = self.locate()?;
        let mut child = self
            .command(program, request)
            .spawn()
            .map_err(|source| SigningError::Spawn {
                tool: self.tool(),
                source,
            })?;

        // Drain stderr concurrently so a chatty tool cannot block on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        if let Some(mut stdin) = child.stdin.take() {
            let line = Zeroizing::new(format!("{}\n", request.password.unwrap_or_default()));
            // An unencrypted key never reads stdin; openssl may already be gone.
            if let Err(e) = stdin.write_all(line.as_bytes()) {
                debug!(error = %e, "openssl closed stdin early");
            }
        }

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                let stderr = collect_stderr(stderr);
                debug!(stderr = %stderr, "openssl killed after timeout");
                discard_signature(request.signature);
                return Err(SigningError::Timeout(self.timeout).into());
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                collect_stderr(stderr);
                discard_signature(request.signature);
                return Err(SigningError::Spawn {
                    tool: self.tool(),
                    source,
                }
                .into());
            }
        };

        let stderr = collect_stderr(stderr);
        if !status.success() {
            discard_signature(request.signature);
            return Err(SigningError::Failed {
                tool: self.tool(),
                status: status.to_string(),
                stderr,
            }
            .into());
        }

        ensure_signature(request.signature)?;
        trace!("signed with openssl");
        Ok(())
    }
}

fn collect_stderr(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    let buf = reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&buf).into_owned()
}

/// Adds `wait_timeout` to `Child`.
trait ChildExt {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            match self.try_wait()? {
                Some(status) => return Ok(Some(status)),
                None if start.elapsed() >= timeout => return Ok(None),
                None => std::thread::sleep(POLL_INTERVAL),
            }
        }
    }
}
