//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to a console action plus the shared arguments
//! every action needs.

use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let globals = GlobalArgs {
        api_url: matches
            .get_one::<String>("api-url")
            .cloned()
            .context("missing required argument: --api-url")?,
        username: matches
            .get_one::<String>("username")
            .cloned()
            .context("missing required argument: --username")?,
        password: matches
            .get_one::<String>("password")
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --password")?,
    };

    let action = match matches.subcommand() {
        Some(("login", _)) => Action::Login,
        Some(("credentials", credentials)) => match credentials.subcommand() {
            Some(("list", sub)) => Action::CredentialsList {
                user: argument(sub, "user")?,
            },
            Some(("rename", sub)) => Action::CredentialsRename {
                user: argument(sub, "user")?,
                credential_id: argument(sub, "credential-id")?,
                name: argument(sub, "name")?,
            },
            Some(("remove", sub)) => Action::CredentialsRemove {
                user: argument(sub, "user")?,
                credential_id: argument(sub, "credential-id")?,
            },
            _ => anyhow::bail!("unknown credentials subcommand"),
        },
        _ => anyhow::bail!("unknown subcommand"),
    };

    Ok((action, globals))
}

fn argument(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}
