//! Campus CLI - Database migrations and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema and session table)
//! campus-cli migrate
//!
//! # Create the first admin
//! campus-cli user create -e admin@example.com -n "Admin Name" -r admin -p secret1
//!
//! # List users, optionally by role
//! campus-cli user list --role student
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "campus-cli")]
#[command(author, version, about = "Campus CLI tools")]
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
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`student`, `teacher`, `admin`)
        #[arg(short, long, default_value = "student")]
        role: String,

        /// Initial password (at least 6 characters)
        #[arg(short, long)]
        password: String,
    },
    /// List users
    List {
        /// Only list users with this role
        #[arg(long)]
        role: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create(&email, &name, &role, &password).await?;
            }
            UserAction::List { role } => commands::user::list(role.as_deref()).await?,
        },
    }
    Ok(())
}
