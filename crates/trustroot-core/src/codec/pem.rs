//! PEM armour for CA material.
//!
//! Blocks are always written with LF line endings and the standard 64-column
//! wrap, so a stored document diffs cleanly and re-encoding the same DER
//! yields identical bytes.

use ::pem::{EncodeConfig, LineEnding, Pem};

use super::CodecError;

/// Label of the CA certificate block.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Label of the CA private key block (PKCS#1 DER inside).
pub const PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// Wraps DER certificate bytes in a `CERTIFICATE` block.
pub fn encode_certificate(der: &[u8]) -> Vec<u8> {
    encode_block(CERTIFICATE_LABEL, der)
}

/// Wraps PKCS#1 DER key bytes in an `RSA PRIVATE KEY` block.
pub fn encode_private_key(der: &[u8]) -> Vec<u8> {
    encode_block(PRIVATE_KEY_LABEL, der)
}

fn encode_block(label: &str, der: &[u8]) -> Vec<u8> {
    let block = Pem::new(label, der.to_vec());
    ::pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF)).into_bytes()
}

/// Parses `bytes` as exactly one PEM block labelled `expected` and returns
/// its DER content.
///
/// # Errors
///
/// - [`CodecError::Pem`] if the armour is broken.
/// - [`CodecError::BlockCount`] unless there is exactly one block.
/// - [`CodecError::UnexpectedLabel`] if the label differs from `expected`.
/// - [`CodecError::EmptyBlock`] if the block has no content.
pub fn decode_block(bytes: &[u8], expected: &'static str) -> Result<Vec<u8>, CodecError> {
    let mut blocks = ::pem::parse_many(bytes)?;
    if blocks.len() != 1 {
        return Err(CodecError::BlockCount(blocks.len()));
    }
    let block = blocks.remove(0);
    if block.tag() != expected {
        return Err(CodecError::UnexpectedLabel {
            expected,
            found: block.tag().to_string(),
        });
    }
    if block.contents().is_empty() {
        return Err(CodecError::EmptyBlock(expected));
    }
    Ok(block.contents().to_vec())
}

/// Like [`decode_block`] but discards the content.
pub fn check_block(bytes: &[u8], expected: &'static str) -> Result<(), CodecError> {
    decode_block(bytes, expected).map(|_| ())
}

/// Serde adapter reading PEM bytes from element text.
///
/// The bytes are taken exactly as the text unescapes.  The writer in
/// [`super::xml`] references edge whitespace such as the final newline, so it
/// comes back here intact.
pub mod text {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}
