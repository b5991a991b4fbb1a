//! trustroot-store library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

pub mod infrastructure;

pub use infrastructure::storage::{
    BootstrapReason, HistoryLoad, HistoryOutcome, HistoryStore, SettingsLoad, SettingsOutcome,
    SettingsStore, StoreError, StoreLayout,
};
