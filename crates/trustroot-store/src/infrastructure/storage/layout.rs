//! File naming policy for the persisted state.
//!
//! A [`StoreLayout`] is passed into each store at construction, so tests (and
//! embedding applications) can point trustroot at any directory and rename the
//! files without touching shared state.
//!
//! The default directory, used by the binary when none is given, is:
//! - Windows:  `%APPDATA%\trustroot`
//! - Linux:    `$XDG_CONFIG_HOME/trustroot` or `~/.config/trustroot`
//! - macOS:    `~/Library/Application Support/trustroot`

use std::path::{Path, PathBuf};

use super::StoreError;

/// Default file name of the global settings document.
pub const DEFAULT_SETTINGS_FILE: &str = "global_settings";

/// Default file name of the project history document.
pub const DEFAULT_HISTORY_FILE: &str = "history";

/// Directory name appended to the platform config base directory.
pub const APP_DIR_NAME: &str = "trustroot";

/// Directory and file names used by the settings and history stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    dir: PathBuf,
    settings_file: String,
    history_file: String,
}

impl StoreLayout {
    /// A layout rooted at `dir` with the default file names.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            settings_file: DEFAULT_SETTINGS_FILE.to_string(),
            history_file: DEFAULT_HISTORY_FILE.to_string(),
        }
    }

    /// A layout rooted at the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoPlatformConfigDir`] when the platform config base
    /// directory cannot be determined from the environment.
    pub fn platform_default() -> Result<Self, StoreError> {
        platform_config_dir()
            .map(Self::new)
            .ok_or(StoreError::NoPlatformConfigDir)
    }

    pub fn with_settings_file(mut self, name: impl Into<String>) -> Self {
        self.settings_file = name.into();
        self
    }

    pub fn with_history_file(mut self, name: impl Into<String>) -> Self {
        self.history_file = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(&self.settings_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(&self.history_file)
    }
}

/// Resolves the platform config directory including the `trustroot` component.
pub fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join(APP_DIR_NAME))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR_NAME)
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join(APP_DIR_NAME))
    }
}
