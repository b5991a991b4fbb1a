//! Certificate Authority generation.
//!
//! The settings store never creates keys itself; it asks a [`CaProvider`] for
//! fresh material whenever it has to bootstrap.  [`RsaCaProvider`] is the
//! production implementation.  Tests substitute their own provider so they do
//! not pay for RSA key generation and can simulate failures.

use thiserror::Error;

pub mod rsa_ca;

pub use rsa_ca::RsaCaProvider;

/// Raw CA material as produced by a [`CaProvider`].
#[derive(Clone, PartialEq, Eq)]
pub struct CaMaterial {
    /// PKCS#1 DER encoding of the CA private key.
    pub private_key_der: Vec<u8>,
    /// DER encoding of the self-signed CA certificate.
    pub certificate_der: Vec<u8>,
}

impl CaMaterial {
    /// Rejects material with an empty key or certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CaError::EmptyMaterial`] naming the missing half.
    pub fn ensure_complete(&self) -> Result<(), CaError> {
        if self.private_key_der.is_empty() {
            return Err(CaError::EmptyMaterial("private key"));
        }
        if self.certificate_der.is_empty() {
            return Err(CaError::EmptyMaterial("certificate"));
        }
        Ok(())
    }
}

// Key bytes stay out of logs.
impl std::fmt::Debug for CaMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaMaterial")
            .field("private_key_der", &format_args!("<{} bytes>", self.private_key_der.len()))
            .field("certificate_der", &format_args!("<{} bytes>", self.certificate_der.len()))
            .finish()
    }
}

/// Error type for CA generation.
#[derive(Debug, Error)]
pub enum CaError {
    /// The RSA key could not be generated.
    #[error("failed to generate RSA key: {0}")]
    KeyGeneration(#[from] ::rsa::Error),

    /// The generated key could not be serialized.
    #[error("failed to encode private key: {0}")]
    KeyEncoding(String),

    /// The certificate could not be built or signed.
    #[error("failed to build CA certificate: {0}")]
    Certificate(#[from] rcgen::Error),

    /// A provider returned an empty key or certificate.
    #[error("CA provider returned an empty {0}")]
    EmptyMaterial(&'static str),

    /// Failure reported by an external provider implementation.
    #[error("CA provider failed: {0}")]
    Provider(String),
}

/// Produces a fresh private key and matching self-signed CA certificate.
///
/// Every call must return new material; the certificate must verify against
/// its own key.
#[cfg_attr(test, mockall::automock)]
pub trait CaProvider {
    fn generate(&self) -> Result<CaMaterial, CaError>;
}

impl<P: CaProvider + ?Sized> CaProvider for &P {
    fn generate(&self) -> Result<CaMaterial, CaError> {
        (**self).generate()
    }
}

impl<P: CaProvider + ?Sized> CaProvider for Box<P> {
    fn generate(&self) -> Result<CaMaterial, CaError> {
        (**self).generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_complete_rejects_empty_key() {
        let material = CaMaterial {
            private_key_der: Vec::new(),
            certificate_der: vec![1],
        };
        assert!(matches!(
            material.ensure_complete(),
            Err(CaError::EmptyMaterial("private key"))
        ));
    }

    #[test]
    fn test_ensure_complete_rejects_empty_certificate() {
        let material = CaMaterial {
            private_key_der: vec![1],
            certificate_der: Vec::new(),
        };
        assert!(matches!(
            material.ensure_complete(),
            Err(CaError::EmptyMaterial("certificate"))
        ));
    }

    #[test]
    fn test_debug_output_hides_key_bytes() {
        let material = CaMaterial {
            private_key_der: vec![0xDE, 0xAD],
            certificate_der: vec![0xBE, 0xEF, 0x00],
        };
        let debug = format!("{material:?}");
        assert!(debug.contains("<2 bytes>"));
        assert!(debug.contains("<3 bytes>"));
        assert!(!debug.contains("222"), "raw key bytes must not be printed");
    }

    #[test]
    fn test_provider_is_usable_through_box_dyn() {
        // Arrange
        let mut mock = MockCaProvider::new();
        mock.expect_generate().times(1).returning(|| {
            Ok(CaMaterial {
                private_key_der: vec![1],
                certificate_der: vec![2],
            })
        });
        let provider: Box<dyn CaProvider> = Box::new(mock);

        // Act
        let material = provider.generate().expect("generate");

        // Assert
        assert_eq!(material.certificate_der, vec![2]);
    }
}
