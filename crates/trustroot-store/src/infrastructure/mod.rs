//! Infrastructure layer for trustroot.
//!
//! Contains the OS-facing adapters.  Today that is only file-system storage;
//! the records and codec it persists come from `trustroot_core`.

pub mod storage;
