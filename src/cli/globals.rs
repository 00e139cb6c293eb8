use secrecy::SecretString;

/// Arguments shared by every console action: where the API lives and who is
/// talking to it.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub username: String,
    pub password: SecretString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs {
            api_url: "https://iam.example.com".to_string(),
            username: "alice".to_string(),
            password: SecretString::from("hunter2".to_string()),
        };
        assert_eq!(args.api_url, "https://iam.example.com");
        assert_eq!(args.username, "alice");
        assert_eq!(args.password.expose_secret(), "hunter2");
        // Debug must not leak the password
        assert!(!format!("{args:?}").contains("hunter2"));
    }
}
