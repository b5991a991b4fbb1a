//! Storage infrastructure: settings and history persistence.
//!
//! This module is the thin adapter between the trustroot records and the file
//! system:
//!
//! - `layout`   – Where the files live ([`StoreLayout`]).
//! - `settings` – Loading, first-run bootstrap, and saving of the global
//!   settings ([`SettingsStore`]).
//! - `history`  – Loading of the project history ([`HistoryStore`]).
//! - `fs`       – Owner-only directory creation and atomic file publication.
//!
//! Loaders never fail on bad input: a missing or damaged settings file turns
//! into a freshly bootstrapped one, and a missing or damaged history file
//! turns into an empty history.  What happened is reported through the
//! `*_with_report` variants and logged.
//!
//! Two processes bootstrapping the same directory at once converge on a
//! single CA: the first file published wins and the other process adopts it.

use std::path::PathBuf;

use thiserror::Error;
use trustroot_core::{CaError, CodecError};

mod fs;
pub mod history;
pub mod layout;
pub mod settings;

pub use history::{HistoryLoad, HistoryOutcome, HistoryStore};
pub use layout::StoreLayout;
pub use settings::{BootstrapReason, SettingsLoad, SettingsOutcome, SettingsStore};

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded.
    #[error("failed to encode document: {0}")]
    Codec(#[from] CodecError),

    /// The CA provider failed on every attempt.
    #[error("CA generation failed after {attempts} attempt(s): {source}")]
    Generate {
        attempts: u32,
        #[source]
        source: CaError,
    },

    /// Another process created the settings file first, but it never became
    /// a valid configuration.  It was left untouched.
    #[error("settings at {path} were created concurrently but could not be adopted")]
    Contended { path: PathBuf },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}
