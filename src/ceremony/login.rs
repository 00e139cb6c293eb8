//! Login ceremony.
//!
//! Password first, hardware proof second when the account demands it:
//! 1. Submit username and password.
//! 2. On `mfa-required`, hold the challenge and allow-list.
//! 3. On user confirmation, run the assertion ceremony and resubmit the
//!    login with the proof.
//!
//! Each attempt owns a [`LoginSession`]; the session ends in `Authenticated`
//! or `Failed` and is never reused. A challenge is consumed by exactly one
//! ceremony; retrying means a fresh session and a fresh challenge.

use crate::api::client::ApiError;
use crate::api::types::{AssertionResult, CredentialDescriptor, LoginOutcome};
use crate::api::ChallengeClient;
use crate::ceremony::authenticator::{
    AllowedCredential, AssertionOptions, Authenticator, CEREMONY_TIMEOUT_MS,
};
use crate::ceremony::codec::{self, EncodingError};
use crate::ceremony::{CeremonyError, FailureReason};
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    CredentialsSubmitted,
    SecondFactorPending,
    CeremonyInvoked,
    ProofSubmitted,
    Authenticated,
    Failed(FailureReason),
}

impl LoginState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed(_))
    }
}

/// State of one login attempt. Created fresh per attempt and discarded on
/// its terminal state.
#[derive(Debug)]
pub struct LoginSession {
    username: String,
    password: SecretString,
    state: LoginState,
    challenge: Option<String>,
    allowed_credentials: Vec<CredentialDescriptor>,
    submitting: bool,
}

impl LoginSession {
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            state: LoginState::Idle,
            challenge: None,
            allowed_credentials: Vec::new(),
            submitting: false,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Whether the server asked for a hardware proof on this attempt.
    #[must_use]
    pub fn second_factor_required(&self) -> bool {
        self.state == LoginState::SecondFactorPending
    }

    #[must_use]
    pub fn challenge(&self) -> Option<&str> {
        self.challenge.as_deref()
    }

    #[must_use]
    pub fn allowed_credentials(&self) -> &[CredentialDescriptor] {
        &self.allowed_credentials
    }

    fn fail(&mut self, err: &CeremonyError) {
        if let Some(reason) = err.reason() {
            self.state = LoginState::Failed(reason);
        }
    }
}

/// Drives login attempts against the challenge API and the platform
/// capability. Holds no per-attempt state of its own.
pub struct LoginOrchestrator<A> {
    client: ChallengeClient,
    authenticator: A,
}

impl<A: Authenticator> LoginOrchestrator<A> {
    #[must_use]
    pub fn new(client: ChallengeClient, authenticator: A) -> Self {
        Self {
            client,
            authenticator,
        }
    }

    /// Submits the session's username and password.
    ///
    /// Resolves to `Authenticated` for accounts without an enrolled
    /// authenticator, or to `SecondFactorPending` with the server's
    /// challenge and allow-list.
    ///
    /// # Errors
    /// `Busy`/`Finished` when the session is not idle (rejected without a
    /// network request); otherwise the failure recorded on the session.
    pub async fn submit_credentials(
        &self,
        session: &mut LoginSession,
    ) -> Result<LoginState, CeremonyError> {
        self.guard(session, &LoginState::Idle)?;

        session.submitting = true;
        let result = self.submit_credentials_inner(session).await;
        session.submitting = false;

        if let Err(err) = &result {
            session.fail(err);
        }
        result
    }

    /// Runs the assertion ceremony for a pending second factor and
    /// resubmits the login with the proof.
    ///
    /// # Errors
    /// `Busy`/`Finished` when no second factor is pending (rejected without
    /// any I/O); otherwise the failure recorded on the session.
    pub async fn prove_second_factor(
        &self,
        session: &mut LoginSession,
    ) -> Result<LoginState, CeremonyError> {
        self.guard(session, &LoginState::SecondFactorPending)?;

        session.submitting = true;
        let result = self.prove_second_factor_inner(session).await;
        session.submitting = false;

        if let Err(err) = &result {
            session.fail(err);
        }
        result
    }

    fn guard(&self, session: &LoginSession, expected: &LoginState) -> Result<(), CeremonyError> {
        if session.submitting {
            return Err(CeremonyError::Busy);
        }
        if session.state.is_terminal() {
            return Err(CeremonyError::Finished);
        }
        if session.state != *expected {
            return Err(CeremonyError::Busy);
        }
        Ok(())
    }

    async fn submit_credentials_inner(
        &self,
        session: &mut LoginSession,
    ) -> Result<LoginState, CeremonyError> {
        session.state = LoginState::CredentialsSubmitted;

        let outcome = self
            .client
            .submit_login(&session.username, &session.password, None)
            .await
            .map_err(map_login_error)?;

        match outcome {
            LoginOutcome::Authenticated => {
                debug!("{} authenticated without a second factor", session.username);
                session.state = LoginState::Authenticated;
            }
            LoginOutcome::SecondFactorRequired {
                challenge,
                allowed_credentials,
            } => {
                debug!(
                    "{} must prove a second factor ({} allowed credentials)",
                    session.username,
                    allowed_credentials.len()
                );
                session.challenge = Some(challenge);
                session.allowed_credentials = allowed_credentials;
                session.state = LoginState::SecondFactorPending;
            }
        }

        Ok(session.state.clone())
    }

    async fn prove_second_factor_inner(
        &self,
        session: &mut LoginSession,
    ) -> Result<LoginState, CeremonyError> {
        // The challenge is single-use: taking it out makes a replay
        // impossible even if the ceremony fails mid-flight.
        let challenge = session.challenge.take().ok_or(CeremonyError::Busy)?;

        let allow_credentials = session
            .allowed_credentials
            .iter()
            .map(|descriptor| {
                Ok(AllowedCredential {
                    id: codec::transport_to_bytes(&descriptor.id)?,
                    kind: descriptor.kind.clone(),
                })
            })
            .collect::<Result<Vec<_>, EncodingError>>()?;

        let options = AssertionOptions {
            challenge: codec::text_to_bytes(&challenge),
            allow_credentials,
            timeout_ms: CEREMONY_TIMEOUT_MS,
        };

        session.state = LoginState::CeremonyInvoked;
        let assertion = self.authenticator.get_assertion(&options).await?;

        let proof = AssertionResult {
            credential_id: codec::bytes_to_transport(&assertion.credential_id),
            authenticator_data: assertion.authenticator_data,
            client_data_json: assertion.client_data_json,
            signature: assertion.signature,
        };

        session.state = LoginState::ProofSubmitted;
        let outcome = self
            .client
            .submit_login(&session.username, &session.password, Some(&proof))
            .await
            .map_err(map_login_error)?;

        match outcome {
            LoginOutcome::Authenticated => {
                debug!("{} authenticated with hardware proof", session.username);
                session.state = LoginState::Authenticated;
                Ok(session.state.clone())
            }
            // A fresh challenge in answer to a proof means the proof was
            // not accepted; never re-run the ceremony on a cached session.
            LoginOutcome::SecondFactorRequired { .. } => Err(CeremonyError::ProofNotAccepted),
        }
    }
}

/// A 401/403 from `/login` means the username/password pair itself was
/// rejected, which callers must be able to tell apart from a rejected
/// hardware token.
fn map_login_error(err: ApiError) -> CeremonyError {
    match err {
        ApiError::Rejected { status, .. } if status == 401 || status == 403 => {
            CeremonyError::InvalidCredentials
        }
        other => other.into(),
    }
}
