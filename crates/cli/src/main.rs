//! Modish CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! modish migrate
//!
//! # Create an administrator
//! modish user create -e admin@example.com -n "Admin" -p 'S3cret!pass' -r admin
//!
//! # Create the demo accounts
//! modish seed --admin-password 'S3cret!pass' --user-password 'S3cret!pass'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create users with a password login
//! - `seed` - Create the demo administrator and shopper accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "modish")]
#[command(author, version, about = "Modish CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Create the demo accounts if they don't exist
    Seed {
        /// Password for admin@test.com
        #[arg(long)]
        admin_password: String,

        /// Password for user@test.com
        #[arg(long)]
        user_password: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user with a password login
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (8 to 20 characters)
        #[arg(short, long)]
        password: String,

        /// Role (`user` or `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::user::create_user(&email, &name, &password, &role).await?;
            }
        },
        Commands::Seed {
            admin_password,
            user_password,
        } => commands::seed::demo_users(&admin_password, &user_password).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_user_create_defaults_to_user_role() {
        let cli = Cli::try_parse_from([
            "modish", "user", "create", "-e", "a@b.co", "-n", "A", "-p", "password1",
        ]);
        let Ok(Cli {
            command:
                Commands::User {
                    action: UserAction::Create { role, .. },
                },
        }) = cli
        else {
            panic!("expected user create");
        };
        assert_eq!(role, "user");
    }

    #[test]
    fn test_seed_requires_both_passwords() {
        assert!(Cli::try_parse_from(["modish", "seed", "--admin-password", "x"]).is_err());
    }
}
