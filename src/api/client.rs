//! HTTP client for the backend's challenge and credential endpoints. One
//! method per network step, no retries: replaying a consumed challenge is
//! the server's call to reject, never this client's call to attempt.

use crate::api::types::{
    AssertionResult, AttestationResult, CredentialDescriptor, EnrolledCredential, LoginOutcome,
    RegistrationOptions,
};
use crate::ceremony::codec;
use base64ct::{Base64, Encoding};
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};
use url::Url;

/// Request timeout applied to every call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters surfaced to the caller.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL: {0}")]
    BaseUrl(String),
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("request failed ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Builds the `Authorization` value the backend expects for credential
/// management calls: standard base64 (padded) over `username:password`.
#[must_use]
pub fn basic_authorization(username: &str, password: &SecretString) -> SecretString {
    let pair = format!("{username}:{}", password.expose_secret());
    let token = Base64::encode_string(pair.as_bytes());
    SecretString::from(format!("Basic {token}"))
}

/// Wire shape of a `/login` response body.
#[derive(Debug, Deserialize)]
struct LoginResponseBody {
    #[serde(rename = "mfa-required", default)]
    mfa_required: bool,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    authenticators: Option<Vec<String>>,
}

/// Client for the challenge and credential endpoints.
///
/// Login calls are always anonymous; credential management calls attach the
/// injected `Authorization` value when one was provided. The client holds no
/// session state of its own.
#[derive(Clone, Debug)]
pub struct ChallengeClient {
    client: Client,
    base_url: String,
    authorization: Option<SecretString>,
}

impl ChallengeClient {
    /// Creates a client against the given base URL.
    ///
    /// # Errors
    /// Returns `ApiError::BaseUrl` if the URL cannot be parsed, has no host,
    /// or uses a scheme other than http/https, and `ApiError::Network` if
    /// the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|err| ApiError::BaseUrl(err.to_string()))?;

        if parsed.host().is_none() {
            return Err(ApiError::BaseUrl("no host specified".to_string()));
        }

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ApiError::BaseUrl(format!("unsupported scheme {scheme}")));
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: None,
        })
    }

    /// Attaches an `Authorization` value for credential management calls.
    #[must_use]
    pub fn with_authorization(mut self, authorization: SecretString) -> Self {
        self.authorization = Some(authorization);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.authorization {
            Some(authorization) => builder.header(AUTHORIZATION, authorization.expose_secret()),
            None => builder,
        }
    }

    /// Submits username and password, optionally extended with an assertion
    /// proof, and reports whether the server wants a second factor.
    ///
    /// # Errors
    /// Returns `ApiError::Rejected` on any non-success status (the backend
    /// answers 401 for a bad pair), `ApiError::Network` on transport
    /// failure, or `ApiError::Parse` when the body cannot be decoded.
    pub async fn submit_login(
        &self,
        username: &str,
        password: &SecretString,
        proof: Option<&AssertionResult>,
    ) -> Result<LoginOutcome, ApiError> {
        let url = self.endpoint("/login");

        let mut body = serde_json::Map::new();
        body.insert("username".to_string(), json!(username));
        body.insert("password".to_string(), json!(password.expose_secret()));
        if let Some(proof) = proof {
            body.insert("credentialId".to_string(), json!(proof.credential_id));
            body.insert(
                "authenticatorData".to_string(),
                codec::byte_array_to_json(&proof.authenticator_data),
            );
            body.insert(
                "clientData".to_string(),
                codec::byte_array_to_json(&proof.client_data_json),
            );
            body.insert(
                "signature".to_string(),
                codec::byte_array_to_json(&proof.signature),
            );
        }
        let payload = Value::Object(body);

        let span = info_span!(
            "api.login",
            http.method = "POST",
            url = %url,
            with_proof = proof.is_some()
        );
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: LoginResponseBody = response.json().await?;
        if !body.mfa_required {
            return Ok(LoginOutcome::Authenticated);
        }

        let challenge = body
            .challenge
            .ok_or_else(|| ApiError::Parse("no challenge in mfa-required response".to_string()))?;
        let allowed_credentials = body
            .authenticators
            .unwrap_or_default()
            .into_iter()
            .map(CredentialDescriptor::public_key)
            .collect();

        debug!("second factor required for {username}");

        Ok(LoginOutcome::SecondFactorRequired {
            challenge,
            allowed_credentials,
        })
    }

    /// Requests registration challenge options for a new authenticator.
    ///
    /// # Errors
    /// Returns an error if the request fails, the server answers a
    /// non-success status, or the response is missing expected fields.
    pub async fn request_registration_options(
        &self,
        user_id: &str,
    ) -> Result<RegistrationOptions, ApiError> {
        let url = self.endpoint(&format!("/users/{user_id}/webauthn-credentials"));

        let span = info_span!(
            "api.registration_options",
            http.method = "POST",
            url = %url
        );
        let response = self
            .authorized(self.client.post(&url))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(response.json().await?)
    }

    /// Submits the attestation that finalizes an enrollment.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server answers a
    /// non-success status; a stale attestation is the server's to reject.
    pub async fn submit_attestation(
        &self,
        user_id: &str,
        name: &str,
        attestation: &AttestationResult,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/users/{user_id}/webauthn-credentials/complete"));

        let payload = json!({
            "name": name,
            "publickey": {
                "id": attestation.id,
                "type": attestation.kind,
                "attObj": codec::byte_array_to_json(&attestation.attestation_object),
                "clientData": codec::byte_array_to_json(&attestation.client_data_json),
                "registrationClientExtensions": attestation.extensions,
            },
        });

        let span = info_span!(
            "api.submit_attestation",
            http.method = "POST",
            url = %url
        );
        let response = self
            .authorized(self.client.post(&url))
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }

    /// Lists the authenticators enrolled on an account.
    ///
    /// # Errors
    /// Returns an error if the request fails, the server answers a
    /// non-success status, or the response cannot be decoded.
    pub async fn list_credentials(
        &self,
        user_id: &str,
    ) -> Result<Vec<EnrolledCredential>, ApiError> {
        let url = self.endpoint(&format!("/users/{user_id}/webauthn-credentials"));

        let span = info_span!(
            "api.list_credentials",
            http.method = "GET",
            url = %url
        );
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(response.json().await?)
    }

    /// Renames an enrolled authenticator.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server answers a
    /// non-success status.
    pub async fn rename_credential(
        &self,
        user_id: &str,
        credential_id: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!(
            "/users/{user_id}/webauthn-credentials/{credential_id}"
        ));

        let span = info_span!(
            "api.rename_credential",
            http.method = "PUT",
            url = %url
        );
        let response = self
            .authorized(self.client.put(&url))
            .json(&json!({ "name": name }))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }

    /// Removes an enrolled authenticator.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server answers a
    /// non-success status. The backend answers 201 here; any success status
    /// counts.
    pub async fn remove_credential(
        &self,
        user_id: &str,
        credential_id: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!(
            "/users/{user_id}/webauthn-credentials/{credential_id}"
        ));

        let span = info_span!(
            "api.remove_credential",
            http.method = "DELETE",
            url = %url
        );
        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }

    async fn rejection(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::Rejected {
            status: status.as_u16(),
            message: error_message(status, &body),
        }
    }
}

/// Extracts a user-facing message from an error body: a JSON `message` field
/// when present, otherwise the body itself, trimmed and truncated.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
