//! # trustroot-core
//!
//! Shared library for trustroot containing the persisted domain records,
//! the on-disk codec, and the Certificate Authority generator.
//!
//! This crate never touches the file system.  Reading, writing, and the
//! bootstrap policy live in `trustroot-store`.
//!
//! # Architecture overview
//!
//! An application using trustroot keeps three pieces of state between runs:
//! a self-signed CA (its root of trust), the project it currently has open,
//! and a history of projects it has opened before.
//!
//! - **`domain`** – The records themselves: [`Configuration`], [`Project`],
//!   and [`History`], plus the validation rules for CA material.
//!
//! - **`codec`** – How those records look on disk.  Both documents are
//!   indented XML; CA material is stored as PEM text inside the elements.
//!
//! - **`ca`** – The [`CaProvider`] seam that produces fresh CA material, and
//!   [`RsaCaProvider`], the default implementation.

pub mod ca;
pub mod codec;
pub mod domain;

pub use ca::{CaError, CaMaterial, CaProvider, RsaCaProvider};
pub use codec::pem::{encode_certificate, encode_private_key, CERTIFICATE_LABEL, PRIVATE_KEY_LABEL};
pub use codec::xml::{decode_history, decode_settings, encode_history, encode_settings};
pub use codec::CodecError;
pub use domain::{Configuration, History, Project};
