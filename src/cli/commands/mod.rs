pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("claviger")
        .about("Identity and Access Management console")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the IAM API, example: https://iam.tld/api/v1")
                .env("CLAVIGER_API_URL")
                .required(true),
        )
        .arg(
            Arg::new("username")
                .long("username")
                .help("Account username")
                .env("CLAVIGER_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Account password")
                .env("CLAVIGER_PASSWORD")
                .required(true)
                .hide_env_values(true),
        )
        .subcommand(Command::new("login").about("Sign in, proving a second factor when required"))
        .subcommand(
            Command::new("credentials")
                .about("Manage hardware credentials enrolled on an account")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list").about("List enrolled credentials").arg(
                        Arg::new("user")
                            .long("user")
                            .help("Account the credentials belong to")
                            .required(true),
                    ),
                )
                .subcommand(
                    Command::new("rename")
                        .about("Rename an enrolled credential")
                        .arg(
                            Arg::new("user")
                                .long("user")
                                .help("Account the credential belongs to")
                                .required(true),
                        )
                        .arg(
                            Arg::new("credential-id")
                                .long("credential-id")
                                .help("Credential to rename")
                                .required(true),
                        )
                        .arg(
                            Arg::new("name")
                                .long("name")
                                .help("New credential name")
                                .required(true),
                        ),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Remove an enrolled credential")
                        .arg(
                            Arg::new("user")
                                .long("user")
                                .help("Account the credential belongs to")
                                .required(true),
                        )
                        .arg(
                            Arg::new("credential-id")
                                .long("credential-id")
                                .help("Credential to remove")
                                .required(true),
                        ),
                ),
        );

    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "claviger");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Identity and Access Management console"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_login_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "claviger",
            "--api-url",
            "https://iam.example.com/api/v1",
            "--username",
            "alice",
            "--password",
            "hunter2",
            "login",
        ]);

        assert_eq!(
            matches.get_one::<String>("api-url").map(String::to_string),
            Some("https://iam.example.com/api/v1".to_string())
        );
        assert_eq!(
            matches.get_one::<String>("username").map(String::to_string),
            Some("alice".to_string())
        );
        assert_eq!(matches.subcommand_name(), Some("login"));
    }

    #[test]
    fn test_check_credentials_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "claviger",
            "--api-url",
            "https://iam.example.com",
            "--username",
            "admin",
            "--password",
            "hunter2",
            "credentials",
            "rename",
            "--user",
            "alice",
            "--credential-id",
            "1",
            "--name",
            "Backup key",
        ]);

        let Some(("credentials", credentials)) = matches.subcommand() else {
            panic!("expected credentials subcommand");
        };
        let Some(("rename", rename)) = credentials.subcommand() else {
            panic!("expected rename subcommand");
        };
        assert_eq!(
            rename.get_one::<String>("user").map(String::to_string),
            Some("alice".to_string())
        );
        assert_eq!(
            rename.get_one::<String>("name").map(String::to_string),
            Some("Backup key".to_string())
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("CLAVIGER_API_URL", Some("https://iam.example.com")),
                ("CLAVIGER_USERNAME", Some("alice")),
                ("CLAVIGER_PASSWORD", Some("hunter2")),
                ("CLAVIGER_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["claviger", "login"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(String::to_string),
                    Some("https://iam.example.com".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("username").map(String::to_string),
                    Some("alice".to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("CLAVIGER_LOG_LEVEL", Some(level)),
                    ("CLAVIGER_API_URL", Some("https://iam.example.com")),
                    ("CLAVIGER_USERNAME", Some("alice")),
                    ("CLAVIGER_PASSWORD", Some("hunter2")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["claviger", "login"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").copied(),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("CLAVIGER_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "claviger".to_string(),
                    "--api-url".to_string(),
                    "https://iam.example.com".to_string(),
                    "--username".to_string(),
                    "alice".to_string(),
                    "--password".to_string(),
                    "hunter2".to_string(),
                    "login".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }
}
