use anyhow::Result;
use claviger::cli::{actions, actions::Action, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    match action {
        Action::Login => actions::login::handle(&globals).await?,
        Action::CredentialsList { user } => actions::credentials::list(&globals, &user).await?,
        Action::CredentialsRename {
            user,
            credential_id,
            name,
        } => actions::credentials::rename(&globals, &user, &credential_id, &name).await?,
        Action::CredentialsRemove {
            user,
            credential_id,
        } => actions::credentials::remove(&globals, &user, &credential_id).await?,
    }

    Ok(())
}
