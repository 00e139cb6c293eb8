use crate::api::{basic_authorization, ChallengeClient};
use crate::cli::globals::GlobalArgs;
use crate::APP_USER_AGENT;
use anyhow::Result;

fn client(globals: &GlobalArgs) -> Result<ChallengeClient> {
    let authorization = basic_authorization(&globals.username, &globals.password);
    Ok(ChallengeClient::new(&globals.api_url, APP_USER_AGENT)?.with_authorization(authorization))
}

/// Handle the credentials list action.
///
/// # Errors
/// Returns an error if the request fails or the server rejects it.
pub async fn list(globals: &GlobalArgs, user: &str) -> Result<()> {
    for credential in client(globals)?.list_credentials(user).await? {
        println!(
            "{}\t{}\t{}\t{}",
            credential.id, credential.name, credential.credential_id, credential.sign_count
        );
    }

    Ok(())
}

/// Handle the credentials rename action.
///
/// # Errors
/// Returns an error if the request fails or the server rejects it.
pub async fn rename(
    globals: &GlobalArgs,
    user: &str,
    credential_id: &str,
    name: &str,
) -> Result<()> {
    client(globals)?
        .rename_credential(user, credential_id, name)
        .await?;

    println!("renamed credential {credential_id} for {user}");

    Ok(())
}

/// Handle the credentials remove action.
///
/// # Errors
/// Returns an error if the request fails or the server rejects it.
pub async fn remove(globals: &GlobalArgs, user: &str, credential_id: &str) -> Result<()> {
    client(globals)?
        .remove_credential(user, credential_id)
        .await?;

    println!("removed credential {credential_id} for {user}");

    Ok(())
}
