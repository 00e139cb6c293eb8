use crate::api::ChallengeClient;
use crate::ceremony::authenticator::UnavailableAuthenticator;
use crate::ceremony::login::{LoginOrchestrator, LoginSession};
use crate::cli::globals::GlobalArgs;
use crate::APP_USER_AGENT;
use anyhow::Result;

/// Handle the login action.
///
/// The console runs headless, so accounts that demand a hardware proof end
/// with a clear "no usable authenticator" error instead of a browser dialog.
///
/// # Errors
/// Returns an error when the credentials are rejected, the server is
/// unreachable, or a second factor is required.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let client = ChallengeClient::new(&globals.api_url, APP_USER_AGENT)?;
    let orchestrator = LoginOrchestrator::new(client, UnavailableAuthenticator);

    let mut session = LoginSession::new(&globals.username, globals.password.clone());
    orchestrator.submit_credentials(&mut session).await?;

    if session.second_factor_required() {
        orchestrator.prove_second_factor(&mut session).await?;
    }

    println!("authenticated as {}", session.username());

    Ok(())
}
