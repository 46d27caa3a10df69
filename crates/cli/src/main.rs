use api_shared::JwtService;
use clap::{Parser, Subcommand};
use survey_core::{
    policy::{can_edit, edit_roles},
    users::hash_password,
    ReportStatus, Role,
};
use survey_uuid::RecordId;

const JWT_SECRET_VAR: &str = "SURVEY_JWT_SECRET";

#[derive(Parser)]
#[command(name = "survey")]
#[command(about = "Survey report service operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a development bearer token signed with SURVEY_JWT_SECRET
    Token {
        /// User id (32 lowercase hex characters)
        #[arg(long)]
        user_id: String,
        /// Username carried in the token
        #[arg(long)]
        username: String,
        /// reader, editor or admin
        #[arg(long)]
        role: Role,
        /// Token lifetime
        #[arg(long, default_value_t = 24)]
        ttl_hours: u64,
    },
    /// Show which roles may edit a report; omit both flags for the full table
    Policy {
        /// Only this role
        #[arg(long)]
        role: Option<Role>,
        /// Only this report status
        #[arg(long)]
        status: Option<String>,
    },
    /// Hash a password with Argon2id
    HashPassword {
        password: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Token {
            user_id,
            username,
            role,
            ttl_hours,
        }) => {
            let user_id = RecordId::parse(&user_id)?;
            let secret = std::env::var(JWT_SECRET_VAR)
                .map_err(|_| format!("{JWT_SECRET_VAR} is not set"))?;
            let jwt = JwtService::new(secret, ttl_hours)?;
            println!("{}", jwt.issue(user_id, &username, role)?);
        }
        Some(Commands::Policy { role, status }) => {
            let roles: Vec<Role> = role.map_or_else(|| Role::ALL.to_vec(), |r| vec![r]);
            let statuses: Vec<String> = status.map_or_else(
                || ReportStatus::NAMES.iter().map(|s| s.to_string()).collect(),
                |s| vec![s],
            );
            for status in &statuses {
                for line in policy_lines(status, &roles) {
                    println!("{line}");
                }
            }
        }
        Some(Commands::HashPassword { password }) => match hash_password(&password) {
            Ok(hash) => println!("{hash}"),
            Err(e) => eprintln!("Error hashing password: {e}"),
        },
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}

/// One line per role: `<status> <role> allow|deny (<allowed roles>)`.
fn policy_lines(status: &str, roles: &[Role]) -> Vec<String> {
    let Ok(parsed) = status.parse::<ReportStatus>() else {
        return roles
            .iter()
            .map(|role| format!("{status} {} deny (unrecognised status)", role.as_str()))
            .collect();
    };

    let allowed: Vec<&str> = edit_roles(parsed).iter().map(|r| r.as_str()).collect();
    roles
        .iter()
        .map(|role| {
            let decision = if can_edit(*role, parsed) { "allow" } else { "deny" };
            format!(
                "{} {} {decision} ({})",
                parsed.as_str(),
                role.as_str(),
                allowed.join(", ")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn full_table_has_a_line_per_role() {
        let lines = policy_lines("immediate_jeopardy", &Role::ALL);
        assert_eq!(
            lines,
            vec![
                "immediate_jeopardy reader deny (admin)",
                "immediate_jeopardy editor deny (admin)",
                "immediate_jeopardy admin allow (admin)",
            ]
        );
    }

    #[test]
    fn unrecognised_status_denies_everyone() {
        let lines = policy_lines("archived", &[Role::Admin]);
        assert_eq!(lines, vec!["archived admin deny (unrecognised status)"]);
    }

    #[test]
    fn parses_token_arguments() {
        let cli = Cli::try_parse_from([
            "survey",
            "token",
            "--user-id",
            "0123456789abcdef0123456789abcdef",
            "--username",
            "editor",
            "--role",
            "editor",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Token { role, ttl_hours, .. }) => {
                assert_eq!(role, Role::Editor);
                assert_eq!(ttl_hours, 24);
            }
            _ => panic!("expected token command"),
        }
    }
}
