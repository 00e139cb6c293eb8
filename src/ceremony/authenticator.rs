//! Seam to the platform credential capability.
//!
//! The browser's `navigator.credentials`, an OS passkey dialog, or a FIDO2
//! stack all sit behind [`Authenticator`]; this crate only prepares the
//! binary options they consume and consumes the binary results they
//! produce. Transports (USB/NFC/BLE) are entirely the implementation's
//! concern.

use crate::api::types::{PubKeyCredParam, RelyingParty};
use thiserror::Error;

/// Fixed ceremony timeout handed to the platform capability (milliseconds).
pub const CEREMONY_TIMEOUT_MS: u32 = 60_000;

/// Platform-reported failure, already mapped from whatever error vocabulary
/// the implementation uses.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorError {
    #[error("the user declined the ceremony")]
    Rejected,
    #[error("the ceremony timed out")]
    TimedOut,
    #[error("no usable authenticator is available")]
    Unsupported,
}

/// Account entity for a creation ceremony. The `id` carries the UTF-8 bytes
/// of the server-issued user handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

/// Options for a creation (enrollment) ceremony.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialCreationOptions {
    pub relying_party: RelyingParty,
    pub user: UserEntity,
    pub challenge: Vec<u8>,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
}

/// One entry of the allow-list for an assertion ceremony. The `id` is the
/// raw credential id, decoded from its transport string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedCredential {
    pub id: Vec<u8>,
    pub kind: String,
}

/// Options for an assertion (login) ceremony.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssertionOptions {
    pub challenge: Vec<u8>,
    pub allow_credentials: Vec<AllowedCredential>,
    pub timeout_ms: u32,
}

/// A credential created by the platform capability.
#[derive(Clone, Debug)]
pub struct CreatedCredential {
    pub id: String,
    pub kind: String,
    pub attestation_object: Vec<u8>,
    pub client_data_json: Vec<u8>,
    /// Client extension results, serialized as JSON text.
    pub extensions: String,
}

/// An assertion produced by the platform capability. The credential id is
/// raw bytes; it must reach the server byte-for-byte.
#[derive(Clone, Debug)]
pub struct Assertion {
    pub credential_id: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
}

/// The platform credential capability. Both calls suspend for as long as the
/// user takes to complete or decline the ceremony; the implementation
/// enforces the timeout carried in the options.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    async fn create_credential(
        &self,
        options: &CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError>;

    async fn get_assertion(
        &self,
        options: &AssertionOptions,
    ) -> Result<Assertion, AuthenticatorError>;
}

/// Capability for headless contexts with no platform authenticator. Every
/// ceremony reports `Unsupported`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableAuthenticator;

impl Authenticator for UnavailableAuthenticator {
    async fn create_credential(
        &self,
        _options: &CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        Err(AuthenticatorError::Unsupported)
    }

    async fn get_assertion(
        &self,
        _options: &AssertionOptions,
    ) -> Result<Assertion, AuthenticatorError> {
        Err(AuthenticatorError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_authenticator_reports_unsupported() {
        let authenticator = UnavailableAuthenticator;

        let creation = CredentialCreationOptions {
            relying_party: RelyingParty {
                id: Some("localhost".to_string()),
                name: Some("Example".to_string()),
            },
            user: UserEntity {
                id: b"u1".to_vec(),
                name: "a".to_string(),
                display_name: "A".to_string(),
            },
            challenge: b"xyz".to_vec(),
            pub_key_cred_params: vec![PubKeyCredParam::es256(), PubKeyCredParam::rs256()],
        };
        assert_eq!(
            authenticator.create_credential(&creation).await.err(),
            Some(AuthenticatorError::Unsupported)
        );

        let assertion = AssertionOptions {
            challenge: b"xyz".to_vec(),
            allow_credentials: vec![],
            timeout_ms: CEREMONY_TIMEOUT_MS,
        };
        assert_eq!(
            authenticator.get_assertion(&assertion).await.err(),
            Some(AuthenticatorError::Unsupported)
        );
    }
}
