//! RSA-backed CA generation.
//!
//! The key is generated with the pure-Rust `rsa` crate and exported twice:
//! as PKCS#1 DER (what gets stored under the `RSA PRIVATE KEY` label) and as
//! PKCS#8 PEM, which is the form `rcgen` accepts for signing the certificate.

use ::rsa::pkcs1::EncodeRsaPrivateKey;
use ::rsa::pkcs8::{EncodePrivateKey, LineEnding};
use ::rsa::RsaPrivateKey;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::{CaError, CaMaterial, CaProvider};

/// Default subject common name of generated CAs.
pub const DEFAULT_COMMON_NAME: &str = "trustroot CA";

/// Default subject organization of generated CAs.
pub const DEFAULT_ORGANIZATION: &str = "trustroot";

/// Default RSA modulus size in bits.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Default certificate lifetime.
pub const DEFAULT_VALIDITY_DAYS: i64 = 3650;

/// Generates a self-signed RSA CA on every call.
#[derive(Debug, Clone)]
pub struct RsaCaProvider {
    common_name: String,
    organization: String,
    key_bits: usize,
    validity_days: i64,
}

impl Default for RsaCaProvider {
    fn default() -> Self {
        Self {
            common_name: DEFAULT_COMMON_NAME.to_string(),
            organization: DEFAULT_ORGANIZATION.to_string(),
            key_bits: DEFAULT_KEY_BITS,
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

impl RsaCaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = common_name.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    /// Sets the modulus size.  The signer refuses keys below 2048 bits.
    pub fn with_key_bits(mut self, key_bits: usize) -> Self {
        self.key_bits = key_bits;
        self
    }

    pub fn with_validity_days(mut self, validity_days: i64) -> Self {
        self.validity_days = validity_days;
        self
    }

    fn certificate_params(&self) -> CertificateParams {
        let mut distinguished_name = DistinguishedName::new();
        distinguished_name.push(DnType::CommonName, self.common_name.clone());
        distinguished_name.push(DnType::OrganizationName, self.organization.clone());

        // Backdate by a day to tolerate clock skew between machines.
        let now = OffsetDateTime::now_utc();

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.not_before = now - Duration::days(1);
        params.not_after = now + Duration::days(self.validity_days);
        params
    }
}

impl CaProvider for RsaCaProvider {
    fn generate(&self) -> Result<CaMaterial, CaError> {
        debug!(bits = self.key_bits, cn = %self.common_name, "generating CA key");
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, self.key_bits)?;

        let pkcs1 = private_key
            .to_pkcs1_der()
            .map_err(|e| CaError::KeyEncoding(e.to_string()))?;
        let pkcs8_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CaError::KeyEncoding(e.to_string()))?;

        let key_pair = KeyPair::from_pem(pkcs8_pem.as_str())?;
        let certificate = self.certificate_params().self_signed(&key_pair)?;

        let material = CaMaterial {
            private_key_der: pkcs1.as_bytes().to_vec(),
            certificate_der: certificate.der().to_vec(),
        };
        material.ensure_complete()?;
        Ok(material)
    }
}
