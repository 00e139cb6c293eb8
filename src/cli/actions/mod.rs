pub mod credentials;
pub mod login;

/// Console action selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login,
    CredentialsList {
        user: String,
    },
    CredentialsRename {
        user: String,
        credential_id: String,
        name: String,
    },
    CredentialsRemove {
        user: String,
        credential_id: String,
    },
}
