//! Request and response types for the backend's auth API. Login payloads
//! carry the account password and assertion proofs, so they must never be
//! logged.

use serde::{Deserialize, Serialize};

/// Relying-party info issued by the server and passed unmodified into the
/// platform capability.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelyingParty {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Account undergoing registration. The `id` is the server-issued user
/// handle, transported as text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationUser {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

/// One permitted public-key algorithm, identified by its COSE number.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub kind: String,
    pub alg: i32,
}

impl PubKeyCredParam {
    /// COSE identifier for ECDSA over P-256 with SHA-256.
    pub const ES256: i32 = -7;
    /// COSE identifier for RSA PKCS#1 v1.5 with SHA-256.
    pub const RS256: i32 = -257;

    #[must_use]
    pub fn es256() -> Self {
        Self {
            kind: "public-key".to_string(),
            alg: Self::ES256,
        }
    }

    #[must_use]
    pub fn rs256() -> Self {
        Self {
            kind: "public-key".to_string(),
            alg: Self::RS256,
        }
    }
}

/// Registration challenge options issued by the server.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub rp: RelyingParty,
    pub user: RegistrationUser,
    pub challenge: String,
    #[serde(default)]
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
}

/// An enrolled authenticator acceptable for a login ceremony. The `id` is a
/// transport-encoded credential id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialDescriptor {
    pub id: String,
    pub kind: String,
}

impl CredentialDescriptor {
    #[must_use]
    pub fn public_key(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "public-key".to_string(),
        }
    }
}

/// Result of a password submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The server issued a session; no further proof is needed.
    Authenticated,
    /// The account has enrolled authenticators; the login must be
    /// resubmitted with an assertion over the given challenge.
    SecondFactorRequired {
        challenge: String,
        allowed_credentials: Vec<CredentialDescriptor>,
    },
}

/// Attestation produced by a successful creation ceremony, sent to the
/// server to finalize enrollment.
#[derive(Clone, Debug)]
pub struct AttestationResult {
    /// Credential id as reported by the authenticator, forwarded verbatim.
    pub id: String,
    pub kind: String,
    pub attestation_object: Vec<u8>,
    pub client_data_json: Vec<u8>,
    /// Client extension results, serialized as JSON text.
    pub extensions: String,
}

/// Assertion produced by a successful login ceremony.
#[derive(Clone, Debug)]
pub struct AssertionResult {
    /// Transport-encoded credential id.
    pub credential_id: String,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
}

/// An authenticator already enrolled on an account.
#[derive(Clone, Debug, Deserialize)]
pub struct EnrolledCredential {
    pub id: String,
    pub name: String,
    pub credential_id: String,
    pub sign_count: i64,
}
