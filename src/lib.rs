//! pkpass - Build signed wallet pass archives.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── build         # Run the packaging pipeline
//! │   ├── inspect       # Re-verify a built archive
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # pkpass.toml management
//!     ├── credentials   # Certificate/key sources and temp-file lifecycle
//!     ├── manifest      # SHA-1 manifest of archive entries
//!     ├── signer/       # Signing backends
//!     │   ├── mod       # Signer trait
//!     │   ├── cli       # openssl binary backend
//!     │   └── native    # openssl crate backend (feature = "native")
//!     ├── archive       # Zip assembly and reading
//!     ├── pipeline      # Stage orchestration and cleanup
//!     └── inspect       # Manifest re-verification
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pkpass::core::{Asset, CredentialSource, OpensslCli, PassBuilder, SigningCredentials};
//!
//! let credentials = SigningCredentials::new(
//!     CredentialSource::file("certs/wwdr.pem"),
//!     CredentialSource::file("certs/signer.pem"),
//!     CredentialSource::file("certs/signer.key"),
//! )
//! .with_password("secret");
//!
//! let archive = PassBuilder::new(OpensslCli::new()).generate(
//!     br#"{"description":"Ticket"}"#,
//!     &[Asset::new("icon.png", "assets/icon.png")],
//!     &credentials,
//! )?;
//! println!("{}", archive.path.display());
//! # Ok::<(), pkpass::error::PipelineError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
