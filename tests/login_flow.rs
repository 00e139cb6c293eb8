//! End-to-end login ceremony flows against a mocked backend.

use claviger::api::types::CredentialDescriptor;
use claviger::api::ChallengeClient;
use claviger::ceremony::authenticator::{
    Assertion, AssertionOptions, Authenticator, AuthenticatorError, CreatedCredential,
    CredentialCreationOptions, CEREMONY_TIMEOUT_MS,
};
use claviger::ceremony::codec;
use claviger::ceremony::login::{LoginOrchestrator, LoginSession, LoginState};
use claviger::ceremony::{CeremonyError, FailureReason};
use secrecy::SecretString;
use std::net::TcpListener;
use std::sync::Mutex;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const USER_AGENT: &str = "claviger-test/0.1";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn password() -> SecretString {
    SecretString::from("hunter2".to_string())
}

/// Matches request bodies that carry (or lack) a given JSON key, used to
/// tell the password submission apart from the proof resubmission.
struct HasJsonKey(&'static str);

impl wiremock::Match for HasJsonKey {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<serde_json::Value>(&request.body)
            .map(|value| value.get(self.0).is_some())
            .unwrap_or(false)
    }
}

struct LacksJsonKey(&'static str);

impl wiremock::Match for LacksJsonKey {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<serde_json::Value>(&request.body)
            .map(|value| value.get(self.0).is_none())
            .unwrap_or(false)
    }
}

/// An authenticator scripted with a fixed answer; records the options it was
/// invoked with.
struct ScriptedKey {
    answer: Result<Assertion, AuthenticatorError>,
    invocations: Mutex<Vec<AssertionOptions>>,
}

impl ScriptedKey {
    fn new(answer: Result<Assertion, AuthenticatorError>) -> Self {
        Self {
            answer,
            invocations: Mutex::new(Vec::new()),
        }
    }

    fn invocations(&self) -> Vec<AssertionOptions> {
        self.invocations.lock().unwrap().clone()
    }
}

// The orchestrator takes ownership of its authenticator; implementing the
// capability on a shared reference lets tests keep a handle for inspection.
impl Authenticator for &ScriptedKey {
    async fn create_credential(
        &self,
        _options: &CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        Err(AuthenticatorError::Unsupported)
    }

    async fn get_assertion(
        &self,
        options: &AssertionOptions,
    ) -> Result<Assertion, AuthenticatorError> {
        self.invocations.lock().unwrap().push(options.clone());
        self.answer.clone()
    }
}

fn assertion_for(credential_id: &str) -> Assertion {
    Assertion {
        credential_id: codec::transport_to_bytes(credential_id).unwrap(),
        authenticator_data: vec![1, 2, 3],
        client_data_json: vec![4, 5],
        signature: vec![9],
    }
}

#[tokio::test]
async fn password_only_account_authenticates_without_second_factor() -> anyhow::Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&server.uri(), USER_AGENT)?;
    let key = ScriptedKey::new(Ok(assertion_for("AA")));
    let orchestrator = LoginOrchestrator::new(client, &key);

    let mut session = LoginSession::new("alice", password());
    let state = orchestrator.submit_credentials(&mut session).await?;

    assert_eq!(state, LoginState::Authenticated);
    assert!(!session.second_factor_required());
    assert!(key.invocations().is_empty());

    // terminal sessions are dead; a retry needs a fresh one
    let err = orchestrator.submit_credentials(&mut session).await;
    assert!(matches!(err, Err(CeremonyError::Finished)));
    Ok(())
}

#[tokio::test]
async fn second_factor_flow_authenticates_with_proof() -> anyhow::Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(LacksJsonKey("credentialId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "mfa-required": true,
            "challenge": "abc123",
            "authenticators": ["cred-1"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(HasJsonKey("credentialId"))
        .and(body_partial_json(serde_json::json!({
            "username": "alice",
            "password": "hunter2",
            "credentialId": "cred-1",
            "authenticatorData": [1, 2, 3],
            "clientData": [4, 5],
            "signature": [9],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&server.uri(), USER_AGENT)?;
    let key = ScriptedKey::new(Ok(assertion_for("cred-1")));
    let orchestrator = LoginOrchestrator::new(client, &key);

    let mut session = LoginSession::new("alice", password());
    let state = orchestrator.submit_credentials(&mut session).await?;

    assert_eq!(state, LoginState::SecondFactorPending);
    assert_eq!(session.challenge(), Some("abc123"));
    assert_eq!(
        session.allowed_credentials(),
        &[CredentialDescriptor::public_key("cred-1")]
    );

    let state = orchestrator.prove_second_factor(&mut session).await?;
    assert_eq!(state, LoginState::Authenticated);

    // the authenticator saw the UTF-8 challenge and the decoded allow-list
    let invocations = key.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].challenge, b"abc123".to_vec());
    assert_eq!(
        invocations[0].allow_credentials[0].id,
        codec::transport_to_bytes("cred-1")?
    );
    assert_eq!(invocations[0].allow_credentials[0].kind, "public-key");
    assert_eq!(invocations[0].timeout_ms, CEREMONY_TIMEOUT_MS);
    Ok(())
}

#[tokio::test]
async fn second_submit_while_pending_is_rejected_without_network() -> anyhow::Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "mfa-required": true,
            "challenge": "abc123",
            "authenticators": ["cred-1"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&server.uri(), USER_AGENT)?;
    let key = ScriptedKey::new(Err(AuthenticatorError::Rejected));
    let orchestrator = LoginOrchestrator::new(client, &key);

    let mut session = LoginSession::new("alice", password());
    orchestrator.submit_credentials(&mut session).await?;
    assert!(session.second_factor_required());

    let err = orchestrator.submit_credentials(&mut session).await;
    assert!(matches!(err, Err(CeremonyError::Busy)));
    // still pending, not failed: the guard rejection is not a ceremony failure
    assert_eq!(session.state(), &LoginState::SecondFactorPending);
    Ok(())
}

#[tokio::test]
async fn declined_ceremony_fails_the_attempt() -> anyhow::Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(LacksJsonKey("credentialId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "mfa-required": true,
            "challenge": "abc123",
            "authenticators": ["cred-1"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    // a declined ceremony must never produce a proof submission
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(HasJsonKey("credentialId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&server.uri(), USER_AGENT)?;
    let key = ScriptedKey::new(Err(AuthenticatorError::Rejected));
    let orchestrator = LoginOrchestrator::new(client, &key);

    let mut session = LoginSession::new("alice", password());
    orchestrator.submit_credentials(&mut session).await?;

    let err = orchestrator.prove_second_factor(&mut session).await;
    assert!(matches!(err, Err(CeremonyError::RejectedByUser)));
    assert_eq!(
        session.state(),
        &LoginState::Failed(FailureReason::RejectedByUser)
    );

    // the session is consumed; no automatic retry is possible
    let err = orchestrator.prove_second_factor(&mut session).await;
    assert!(matches!(err, Err(CeremonyError::Finished)));
    Ok(())
}

#[tokio::test]
async fn timed_out_ceremony_fails_the_attempt() -> anyhow::Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "mfa-required": true,
            "challenge": "abc123",
            "authenticators": ["cred-1"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&server.uri(), USER_AGENT)?;
    let key = ScriptedKey::new(Err(AuthenticatorError::TimedOut));
    let orchestrator = LoginOrchestrator::new(client, &key);

    let mut session = LoginSession::new("alice", password());
    orchestrator.submit_credentials(&mut session).await?;

    let err = orchestrator.prove_second_factor(&mut session).await;
    assert!(matches!(err, Err(CeremonyError::TimedOut)));
    assert_eq!(session.state(), &LoginState::Failed(FailureReason::TimedOut));
    Ok(())
}

#[tokio::test]
async fn rejected_password_is_invalid_credentials() -> anyhow::Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&server.uri(), USER_AGENT)?;
    let key = ScriptedKey::new(Ok(assertion_for("AA")));
    let orchestrator = LoginOrchestrator::new(client, &key);

    let mut session = LoginSession::new("alice", password());
    let err = orchestrator.submit_credentials(&mut session).await;

    // a bad password reads differently from a rejected hardware token
    let err = err.err().expect("expected error");
    assert!(matches!(err, CeremonyError::InvalidCredentials));
    assert!(err.to_string().contains("username and password"));
    assert_eq!(
        session.state(),
        &LoginState::Failed(FailureReason::InvalidCredentials)
    );
    Ok(())
}

#[tokio::test]
async fn fresh_challenge_in_answer_to_proof_is_terminal() -> anyhow::Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    // the server answers every submission with a new challenge: the proof
    // was not accepted, and the client must not retry with a cached one
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "mfa-required": true,
            "challenge": "abc123",
            "authenticators": ["cred-1"],
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = ChallengeClient::new(&server.uri(), USER_AGENT)?;
    let key = ScriptedKey::new(Ok(assertion_for("cred-1")));
    let orchestrator = LoginOrchestrator::new(client, &key);

    let mut session = LoginSession::new("alice", password());
    orchestrator.submit_credentials(&mut session).await?;

    let err = orchestrator.prove_second_factor(&mut session).await;
    assert!(matches!(err, Err(CeremonyError::ProofNotAccepted)));
    assert_eq!(
        session.state(),
        &LoginState::Failed(FailureReason::ServerRejected)
    );
    Ok(())
}
