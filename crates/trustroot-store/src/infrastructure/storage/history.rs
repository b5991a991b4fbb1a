//! Project history loading.
//!
//! The history file is read-only at this layer.  Any problem reading it
//! yields an empty [`History`]; the caller can tell a first run apart from
//! lost data through [`HistoryStore::load_with_report`].

use std::io;

use tracing::{debug, warn};
use trustroot_core::{decode_history, CodecError, History};

use super::layout::StoreLayout;

/// How the returned history was obtained.
#[derive(Debug)]
pub enum HistoryOutcome {
    /// The file was read and parsed.
    Loaded,
    /// No history file exists yet.
    Missing,
    /// The file exists but could not be read; its content was discarded.
    Unreadable(io::Error),
    /// The file was read but could not be parsed; its content was discarded.
    Corrupt(CodecError),
}

impl HistoryOutcome {
    /// `true` when existing history data was discarded.
    pub fn lost_data(&self) -> bool {
        matches!(self, HistoryOutcome::Unreadable(_) | HistoryOutcome::Corrupt(_))
    }
}

/// A loaded history plus how it was obtained.
#[derive(Debug)]
pub struct HistoryLoad {
    pub history: History,
    pub outcome: HistoryOutcome,
}

/// Reads the project history file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    layout: StoreLayout,
}

impl HistoryStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    /// Loads the history, or an empty one if the file is absent or damaged.
    pub fn load(&self) -> History {
        self.load_with_report().history
    }

    /// Like [`HistoryStore::load`] but also reports why the history may be
    /// empty.
    pub fn load_with_report(&self) -> HistoryLoad {
        let path = self.layout.history_path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no history file");
                return HistoryLoad {
                    history: History::default(),
                    outcome: HistoryOutcome::Missing,
                };
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "history file unreadable, starting empty");
                return HistoryLoad {
                    history: History::default(),
                    outcome: HistoryOutcome::Unreadable(e),
                };
            }
        };

        match decode_history(&bytes) {
            Ok(history) => {
                debug!(path = %path.display(), projects = history.len(), "loaded history");
                HistoryLoad {
                    history,
                    outcome: HistoryOutcome::Loaded,
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "history file corrupt, starting empty");
                HistoryLoad {
                    history: History::default(),
                    outcome: HistoryOutcome::Corrupt(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use trustroot_core::{encode_history, Project};
    use uuid::Uuid;

    use super::*;

    fn temp_layout() -> StoreLayout {
        let dir = std::env::temp_dir().join(format!("trustroot_history_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        StoreLayout::new(dir)
    }

    #[test]
    fn test_missing_file_yields_empty_history() {
        // Arrange
        let layout = temp_layout();
        let store = HistoryStore::new(layout.clone());

        // Act
        let load = store.load_with_report();

        // Assert
        assert!(load.history.is_empty());
        assert!(matches!(load.outcome, HistoryOutcome::Missing));
        assert!(!load.outcome.lost_data());

        std::fs::remove_dir_all(layout.dir()).ok();
    }

    #[test]
    fn test_missing_directory_yields_empty_history() {
        let layout = StoreLayout::new("/nonexistent/path/that/cannot/exist");
        assert!(HistoryStore::new(layout).load().is_empty());
    }

    #[test]
    fn test_malformed_file_yields_empty_history() {
        // Arrange
        let layout = temp_layout();
        std::fs::write(layout.history_path(), b"<History><ProjectsHistory><Title>x").unwrap();
        let store = HistoryStore::new(layout.clone());

        // Act
        let load = store.load_with_report();

        // Assert
        assert!(load.history.is_empty());
        assert!(matches!(load.outcome, HistoryOutcome::Corrupt(_)));
        assert!(load.outcome.lost_data());

        std::fs::remove_dir_all(layout.dir()).ok();
    }

    #[test]
    fn test_valid_file_is_loaded_in_order() {
        // Arrange
        let layout = temp_layout();
        let expected = History::from(vec![
            Project::new("one", "/p/1"),
            Project::new("two", "/p/2"),
            Project::new("three", "/p/3"),
        ]);
        std::fs::write(layout.history_path(), encode_history(&expected).unwrap()).unwrap();
        let store = HistoryStore::new(layout.clone());

        // Act
        let load = store.load_with_report();

        // Assert
        assert!(matches!(load.outcome, HistoryOutcome::Loaded));
        assert_eq!(load.history, expected);

        std::fs::remove_dir_all(layout.dir()).ok();
    }

    #[test]
    fn test_directory_in_place_of_file_is_unreadable() {
        let layout = temp_layout();
        std::fs::create_dir_all(layout.history_path()).unwrap();

        let load = HistoryStore::new(layout.clone()).load_with_report();

        assert!(load.history.is_empty());
        assert!(matches!(load.outcome, HistoryOutcome::Unreadable(_)));

        std::fs::remove_dir_all(layout.dir()).ok();
    }
}
