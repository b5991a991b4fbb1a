//! Domain records persisted by trustroot.
//!
//! - **`settings`** – [`Configuration`], the global settings record holding the
//!   CA material and the active project.
//! - **`history`** – [`History`], the ordered list of previously opened
//!   projects.
//!
//! Both records carry their serde mapping onto the XML element names used on
//! disk; the actual encoding lives in [`crate::codec`].

pub mod history;
pub mod settings;

pub use history::History;
pub use settings::{Configuration, Project};
