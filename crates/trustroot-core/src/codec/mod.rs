//! On-disk encoding of the trustroot records.
//!
//! - **`xml`** – Indented XML documents for the settings and history files.
//! - **`pem`** – PEM armour for CA material, and the serde adapter that reads
//!   PEM text back out of an XML element.

pub mod pem;
pub mod xml;

use thiserror::Error;

/// Errors produced while encoding or decoding persisted records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document bytes are not UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The XML could not be parsed into the record type.
    #[error("malformed XML document: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    /// The XML writer failed while producing a document.
    #[error("failed to write XML document: {0}")]
    Write(#[from] quick_xml::Error),

    /// A project path cannot be stored as XML text.
    #[error("path {0:?} is not valid UTF-8")]
    NonUtf8Path(std::path::PathBuf),

    /// The PEM armour itself is broken.
    #[error("malformed PEM block: {0}")]
    Pem(#[from] ::pem::PemError),

    /// A field meant to hold a single PEM block holds zero or several.
    #[error("expected exactly one PEM block, found {0}")]
    BlockCount(usize),

    /// The PEM block carries the wrong label.
    #[error("expected PEM label {expected:?}, found {found:?}")]
    UnexpectedLabel {
        expected: &'static str,
        found: String,
    },

    /// The PEM block has a label but no content.
    #[error("PEM block {0:?} has an empty body")]
    EmptyBlock(&'static str),
}
