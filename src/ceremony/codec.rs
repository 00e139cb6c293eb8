//! Conversions between the wire representations used by the credential
//! ceremonies and the binary buffers the platform capability consumes.
//!
//! Three encodings meet here and must never be swapped for one another:
//!
//! - **Transport**: base64url without padding, used for credential ids.
//! - **Text**: plain UTF-8, used for challenge and user-handle values,
//!   which the server defines as text rather than arbitrary binary.
//! - **Byte arrays**: JSON arrays of integers, used for attestation and
//!   assertion payload fields.
//!
//! Every conversion is lossless in both directions. The server verifies
//! signatures over exactly these bytes, so a mismatch here fails every
//! ceremony.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid base64url encoding")]
    Base64,
    #[error("byte value {0} is out of range")]
    ByteOutOfRange(i64),
    #[error("expected an array of byte values")]
    ExpectedByteArray,
}

/// Encodes bytes as a transport-safe base64url string without padding.
#[must_use]
pub fn bytes_to_transport(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

/// Decodes a transport string back into bytes.
///
/// # Errors
/// Returns `EncodingError::Base64` when the input uses the wrong alphabet,
/// carries padding, or has an invalid length.
pub fn transport_to_bytes(encoded: &str) -> Result<Vec<u8>, EncodingError> {
    Base64UrlUnpadded::decode_vec(encoded).map_err(|_| EncodingError::Base64)
}

/// Encodes a text value as its UTF-8 bytes.
///
/// Challenge and user-handle values are text; decoding them as transport
/// strings would produce different bytes for the same logical value.
#[must_use]
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Represents bytes as a JSON array of integers.
#[must_use]
pub fn byte_array_to_json(bytes: &[u8]) -> Value {
    Value::from(bytes.iter().map(|byte| Value::from(*byte)).collect::<Vec<_>>())
}

/// Rebuilds bytes from a JSON array of integers.
///
/// # Errors
/// Returns `EncodingError::ExpectedByteArray` when the value is not an array
/// of integers, or `EncodingError::ByteOutOfRange` when an element falls
/// outside `0..=255`.
pub fn json_to_byte_array(value: &Value) -> Result<Vec<u8>, EncodingError> {
    let elements = value.as_array().ok_or(EncodingError::ExpectedByteArray)?;

    let mut bytes = Vec::with_capacity(elements.len());
    for element in elements {
        let number = element.as_i64().ok_or(EncodingError::ExpectedByteArray)?;
        let byte = u8::try_from(number).map_err(|_| EncodingError::ByteOutOfRange(number))?;
        bytes.push(byte);
    }

    Ok(bytes)
}
