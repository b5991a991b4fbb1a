//! Global settings persistence and first-run CA bootstrap.
//!
//! # Load state machine
//!
//! ```text
//! NoFile ─────────────┐
//!                     ├─► Bootstrap ─► Ready(Configuration)
//! FilePresent+Corrupt ┘
//! FilePresent+Valid ──► Parse ───────► Ready(Configuration)
//! ```
//!
//! A file that cannot be read, cannot be parsed, or parses but holds broken
//! PEM material counts as corrupt and is overwritten.  A valid CA is never
//! regenerated.
//!
//! The only error [`SettingsStore::load`] can return is
//! [`StoreError::Generate`]: when the CA provider fails on every attempt there
//! is no valid configuration to hand out.  Failing to *persist* a bootstrapped
//! configuration is logged and reported in [`SettingsLoad::save_error`], but
//! the configuration is still returned.
//!
//! A process that loses the first-run race only ever reads the winner's file.
//! It re-reads it a few times while the winner finishes, and if the file never
//! becomes valid it keeps its own CA in memory without writing over it.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};
use trustroot_core::{
    decode_settings, encode_settings, CaMaterial, CaProvider, CodecError, Configuration,
    RsaCaProvider,
};

use super::fs::{self, Publish, Published};
use super::layout::StoreLayout;
use super::StoreError;

/// Reads of the winner's file before a lost race is given up on.
const ADOPT_ATTEMPTS: u32 = 5;

/// Pause before the second read; later reads wait proportionally longer.
const ADOPT_BACKOFF: Duration = Duration::from_millis(20);

/// Why a load went through bootstrap.
#[derive(Debug)]
pub enum BootstrapReason {
    /// No settings file existed: the expected first-run case.
    Missing,
    /// The settings file exists but could not be read.
    Unreadable(io::Error),
    /// The settings file was read but is not a valid configuration.
    Corrupt(CodecError),
}

impl BootstrapReason {
    /// `true` for every reason except a plain first run.
    pub fn is_anomalous(&self) -> bool {
        !matches!(self, BootstrapReason::Missing)
    }
}

/// How the returned configuration was obtained.
#[derive(Debug)]
pub enum SettingsOutcome {
    /// An existing valid file was parsed and returned unchanged.
    Reloaded,
    /// Fresh CA material was generated.
    Bootstrapped { reason: BootstrapReason },
    /// A concurrent process bootstrapped first; its configuration was adopted.
    Adopted,
}

/// A loaded configuration plus diagnostics about how it was obtained.
#[derive(Debug)]
pub struct SettingsLoad {
    pub configuration: Configuration,
    pub outcome: SettingsOutcome,
    /// Set when a bootstrapped configuration could not be written to disk.
    pub save_error: Option<StoreError>,
}

impl SettingsLoad {
    pub fn into_configuration(self) -> Configuration {
        self.configuration
    }

    pub fn was_bootstrapped(&self) -> bool {
        matches!(self.outcome, SettingsOutcome::Bootstrapped { .. })
    }
}

/// Owns the lifecycle of the global [`Configuration`]: creation,
/// regeneration, and persistence.
#[derive(Debug)]
pub struct SettingsStore<P = RsaCaProvider> {
    layout: StoreLayout,
    provider: P,
    generate_attempts: u32,
}

impl<P: CaProvider> SettingsStore<P> {
    /// How many times bootstrap asks the provider before giving up.
    pub const DEFAULT_GENERATE_ATTEMPTS: u32 = 3;

    pub fn new(layout: StoreLayout, provider: P) -> Self {
        Self {
            layout,
            provider,
            generate_attempts: Self::DEFAULT_GENERATE_ATTEMPTS,
        }
    }

    /// Overrides the provider attempt count; values below 1 are raised to 1.
    pub fn with_generate_attempts(mut self, attempts: u32) -> Self {
        self.generate_attempts = attempts.max(1);
        self
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn settings_path(&self) -> PathBuf {
        self.layout.settings_path()
    }

    /// Loads the configuration, bootstrapping a new CA if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Generate`] only if CA generation failed on every
    /// attempt.  Read, parse, and write failures are absorbed.
    pub fn load(&self) -> Result<Configuration, StoreError> {
        self.load_with_report().map(SettingsLoad::into_configuration)
    }

    /// Like [`SettingsStore::load`] but also reports how the configuration was
    /// obtained and whether persisting it failed.
    ///
    /// # Errors
    ///
    /// See [`SettingsStore::load`].
    pub fn load_with_report(&self) -> Result<SettingsLoad, StoreError> {
        if let Err(e) = fs::ensure_private_dir(self.layout.dir()) {
            warn!(error = %e, "could not create settings directory");
        }

        let path = self.settings_path();
        let reason = match read_settings(&path) {
            Ok(configuration) => {
                debug!(path = %path.display(), "reloaded settings");
                return Ok(SettingsLoad {
                    configuration,
                    outcome: SettingsOutcome::Reloaded,
                    save_error: None,
                });
            }
            Err(reason) => reason,
        };

        match &reason {
            BootstrapReason::Missing => {
                info!(path = %path.display(), "no settings file, bootstrapping a new CA")
            }
            BootstrapReason::Unreadable(e) => {
                warn!(path = %path.display(), error = %e, "settings file unreadable, regenerating CA")
            }
            BootstrapReason::Corrupt(e) => {
                warn!(path = %path.display(), error = %e, "settings file corrupt, regenerating CA")
            }
        }
        self.bootstrap(&path, reason)
    }

    /// Writes `config` to the settings file with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] for file-system failures or
    /// [`StoreError::Codec`] if the configuration cannot be encoded.
    pub fn save(&self, config: &Configuration) -> Result<(), StoreError> {
        fs::ensure_private_dir(self.layout.dir())?;
        let bytes = encode_settings(config)?;
        fs::write_private(&self.settings_path(), &bytes, Publish::Replace)?;
        Ok(())
    }

    fn bootstrap(&self, path: &Path, reason: BootstrapReason) -> Result<SettingsLoad, StoreError> {
        let material = self.generate_material()?;
        let configuration = Configuration::from_material(&material);

        // Only a first run races other processes for creation; a corrupt file
        // is simply replaced.
        let publish = match reason {
            BootstrapReason::Missing => Publish::CreateNew,
            _ => Publish::Replace,
        };
        let written = encode_settings(&configuration)
            .map_err(StoreError::from)
            .and_then(|bytes| fs::write_private(path, &bytes, publish));

        match written {
            Ok(Published::Written) => {
                info!(path = %path.display(), "persisted bootstrapped settings");
                Ok(SettingsLoad {
                    configuration,
                    outcome: SettingsOutcome::Bootstrapped { reason },
                    save_error: None,
                })
            }
            Ok(Published::AlreadyExists) => match adopt(path) {
                Ok(winner) => {
                    info!(path = %path.display(), "settings created concurrently, adopting them");
                    Ok(SettingsLoad {
                        configuration: winner,
                        outcome: SettingsOutcome::Adopted,
                        save_error: None,
                    })
                }
                Err(unusable) => {
                    warn!(
                        path = %path.display(),
                        reason = ?unusable,
                        "concurrently created settings never became valid, keeping this CA in memory only"
                    );
                    Ok(SettingsLoad {
                        configuration,
                        outcome: SettingsOutcome::Bootstrapped { reason },
                        save_error: Some(StoreError::Contended {
                            path: path.to_path_buf(),
                        }),
                    })
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to persist bootstrapped settings");
                Ok(SettingsLoad {
                    configuration,
                    outcome: SettingsOutcome::Bootstrapped { reason },
                    save_error: Some(e),
                })
            }
        }
    }

    fn generate_material(&self) -> Result<CaMaterial, StoreError> {
        let mut attempt = 1;
        loop {
            let generated = self
                .provider
                .generate()
                .and_then(|material| material.ensure_complete().map(|()| material));
            match generated {
                Ok(material) => return Ok(material),
                Err(source) if attempt >= self.generate_attempts => {
                    return Err(StoreError::Generate {
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "CA generation failed, retrying");
                    attempt += 1;
                }
            }
        }
    }
}

/// Reads the settings another process published, waiting briefly for it to
/// become valid.  Returns the last reason it was unusable.
fn adopt(path: &Path) -> Result<Configuration, BootstrapReason> {
    let mut attempt = 1;
    loop {
        match read_settings(path) {
            Ok(configuration) => return Ok(configuration),
            Err(reason) if attempt >= ADOPT_ATTEMPTS => return Err(reason),
            Err(reason) => {
                debug!(attempt, ?reason, "concurrently created settings not usable yet");
                thread::sleep(ADOPT_BACKOFF * attempt);
                attempt += 1;
            }
        }
    }
}

/// Reads, decodes, and validates the settings file at `path`.
fn read_settings(path: &Path) -> Result<Configuration, BootstrapReason> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(BootstrapReason::Missing),
        Err(e) => return Err(BootstrapReason::Unreadable(e)),
    };
    let configuration = decode_settings(&bytes).map_err(BootstrapReason::Corrupt)?;
    configuration.validate().map_err(BootstrapReason::Corrupt)?;
    Ok(configuration)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
