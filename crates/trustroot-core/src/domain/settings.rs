//! The global settings record.
//!
//! A [`Configuration`] is created once, on the first run, from freshly
//! generated CA material.  After that it is only ever loaded back; the CA is
//! regenerated solely when the stored document is unusable.

use std::path::PathBuf;

use serde::Deserialize;

use crate::ca::CaMaterial;
use crate::codec::pem::{self, CERTIFICATE_LABEL, PRIVATE_KEY_LABEL};
use crate::codec::CodecError;

/// A named reference to a project on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Project {
    /// Display name.
    #[serde(rename = "Title", default)]
    pub title: String,
    /// Filesystem location of the project.
    #[serde(rename = "Path", default)]
    pub path: PathBuf,
}

impl Project {
    pub fn new(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
        }
    }
}

/// Global settings: the application's CA and the currently active project.
///
/// Invariant: a `Configuration` returned by the settings store always passes
/// [`Configuration::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Configuration {
    /// PEM-encoded X.509 CA certificate.
    #[serde(rename = "CACert", deserialize_with = "crate::codec::pem::text::deserialize")]
    pub ca_certificate: Vec<u8>,
    /// PEM-encoded CA private key.
    #[serde(rename = "CAPvt", deserialize_with = "crate::codec::pem::text::deserialize")]
    pub ca_private_key: Vec<u8>,
    /// The active project, if one is open.
    #[serde(rename = "Project", default)]
    pub project: Option<Project>,
}

impl Configuration {
    /// Builds a configuration with no active project from raw CA material.
    ///
    /// The key is wrapped as an `RSA PRIVATE KEY` block and the certificate as
    /// a `CERTIFICATE` block.
    pub fn from_material(material: &CaMaterial) -> Self {
        Self {
            ca_certificate: pem::encode_certificate(&material.certificate_der),
            ca_private_key: pem::encode_private_key(&material.private_key_der),
            project: None,
        }
    }

    /// Checks that both CA fields hold exactly one well-formed PEM block with
    /// the expected label and a non-empty body.
    ///
    /// # Errors
    ///
    /// Returns the first [`CodecError`] found, certificate first.
    pub fn validate(&self) -> Result<(), CodecError> {
        pem::check_block(&self.ca_certificate, CERTIFICATE_LABEL)?;
        pem::check_block(&self.ca_private_key, PRIVATE_KEY_LABEL)?;
        Ok(())
    }

    /// Returns a copy of this configuration with `project` as the active one.
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(project);
        self
    }
}
