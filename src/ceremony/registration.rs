//! Enrollment ceremony.
//!
//! Registers a new hardware authenticator onto an account:
//! 1. Request creation options from the server.
//! 2. Run the platform creation ceremony (hardware key touch).
//! 3. Submit the resulting attestation.
//!
//! The server's challenge and user handle are text values encoded as UTF-8
//! bytes for the ceremony; the credential id the authenticator reports is
//! forwarded verbatim. The permitted algorithms are fixed, not negotiated.

use crate::api::types::{AttestationResult, PubKeyCredParam, RelyingParty};
use crate::api::ChallengeClient;
use crate::ceremony::authenticator::{Authenticator, CredentialCreationOptions, UserEntity};
use crate::ceremony::codec;
use crate::ceremony::{CeremonyError, FailureReason};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Idle,
    OptionsRequested,
    AwaitingCeremony,
    AttestationSubmitted,
    Enrolled,
    Failed(FailureReason),
}

impl RegistrationState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Enrolled | Self::Failed(_))
    }
}

/// State of one enrollment attempt. Created fresh per attempt and discarded
/// on its terminal state.
#[derive(Debug)]
pub struct RegistrationSession {
    user_id: String,
    credential_name: String,
    state: RegistrationState,
    relying_party: Option<RelyingParty>,
    user_handle: Option<String>,
    challenge: Option<String>,
    submitting: bool,
}

impl RegistrationSession {
    #[must_use]
    pub fn new(user_id: impl Into<String>, credential_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            credential_name: credential_name.into(),
            state: RegistrationState::Idle,
            relying_party: None,
            user_handle: None,
            challenge: None,
            submitting: false,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn credential_name(&self) -> &str {
        &self.credential_name
    }

    #[must_use]
    pub fn state(&self) -> &RegistrationState {
        &self.state
    }

    #[must_use]
    pub fn relying_party(&self) -> Option<&RelyingParty> {
        self.relying_party.as_ref()
    }

    #[must_use]
    pub fn user_handle(&self) -> Option<&str> {
        self.user_handle.as_deref()
    }

    fn fail(&mut self, err: &CeremonyError) {
        if let Some(reason) = err.reason() {
            self.state = RegistrationState::Failed(reason);
        }
    }
}

/// Drives enrollment attempts against the challenge API and the platform
/// capability.
pub struct RegistrationOrchestrator<A> {
    client: ChallengeClient,
    authenticator: A,
}

impl<A: Authenticator> RegistrationOrchestrator<A> {
    #[must_use]
    pub fn new(client: ChallengeClient, authenticator: A) -> Self {
        Self {
            client,
            authenticator,
        }
    }

    /// Runs the enrollment ceremony for the session, from options request
    /// through attestation submission.
    ///
    /// # Errors
    /// `Busy`/`Finished` when the session is not idle (rejected without any
    /// I/O); otherwise the failure recorded on the session.
    pub async fn enroll(
        &self,
        session: &mut RegistrationSession,
    ) -> Result<RegistrationState, CeremonyError> {
        if session.submitting {
            return Err(CeremonyError::Busy);
        }
        if session.state.is_terminal() {
            return Err(CeremonyError::Finished);
        }
        if session.state != RegistrationState::Idle {
            return Err(CeremonyError::Busy);
        }

        session.submitting = true;
        let result = self.enroll_inner(session).await;
        session.submitting = false;

        if let Err(err) = &result {
            session.fail(err);
        }
        result
    }

    async fn enroll_inner(
        &self,
        session: &mut RegistrationSession,
    ) -> Result<RegistrationState, CeremonyError> {
        session.state = RegistrationState::OptionsRequested;
        let options = self
            .client
            .request_registration_options(&session.user_id)
            .await?;

        session.relying_party = Some(options.rp.clone());
        session.user_handle = Some(options.user.id.clone());
        session.challenge = Some(options.challenge);

        // Challenge and user handle are text; encoding them as UTF-8 here
        // must match how the server verifies them. The challenge is taken
        // out so it can never feed a second ceremony.
        let challenge = session.challenge.take().ok_or(CeremonyError::Busy)?;
        let creation = CredentialCreationOptions {
            relying_party: options.rp,
            user: UserEntity {
                id: codec::text_to_bytes(&options.user.id),
                name: options.user.name,
                display_name: options.user.display_name,
            },
            challenge: codec::text_to_bytes(&challenge),
            pub_key_cred_params: vec![PubKeyCredParam::es256(), PubKeyCredParam::rs256()],
        };

        session.state = RegistrationState::AwaitingCeremony;
        let credential = self.authenticator.create_credential(&creation).await?;

        debug!(
            "authenticator created credential {} for {}",
            credential.id, session.user_id
        );

        let attestation = AttestationResult {
            id: credential.id,
            kind: credential.kind,
            attestation_object: credential.attestation_object,
            client_data_json: credential.client_data_json,
            extensions: credential.extensions,
        };

        session.state = RegistrationState::AttestationSubmitted;
        self.client
            .submit_attestation(&session.user_id, &session.credential_name, &attestation)
            .await?;

        session.state = RegistrationState::Enrolled;
        Ok(session.state.clone())
    }
}
