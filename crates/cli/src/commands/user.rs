//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Bootstrap an admin account
//! campus-cli user create -e admin@example.com -n "Admin Name" -r admin -p secret1
//!
//! # List teachers
//! campus-cli user list --role teacher
//! ```

use campus_core::{Email, Role};
use campus_server::db::{PgStore, RepositoryError, Store, UserQuery};
use campus_server::models::{NewUser, User};
use campus_server::services::auth::{hash_password, validate_password};

use super::{CommandError, database_url};

async fn connect() -> Result<PgStore, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(PgStore::new(campus_server::db::create_pool(&url).await?))
}

/// Create a user directly in the database.
///
/// Unlike `POST /api/users`, any role may be created here, including the
/// first admin.
///
/// # Errors
///
/// Returns an error for an invalid email, role or password, when the email is
/// already registered, or when the database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<User, CommandError> {
    let email = Email::parse(email)
        .map_err(|e| CommandError::InvalidArgument(format!("Invalid email: {e}")))?;
    let role: Role = role.parse().map_err(CommandError::InvalidArgument)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::InvalidArgument("Name is required".to_owned()));
    }
    validate_password(password).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
    let password_hash =
        hash_password(password).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;

    let store = connect().await?;
    tracing::info!("Creating user: {} ({})", email, role);

    let user = store
        .insert_user(NewUser {
            name: name.to_owned(),
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                CommandError::InvalidArgument("A user with this email already exists".to_owned())
            }
            other => CommandError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user)
}

/// Log every user, optionally restricted to one role.
///
/// # Errors
///
/// Returns an error for an invalid role or when the database is unreachable.
pub async fn list(role: Option<&str>) -> Result<(), CommandError> {
    let role = role
        .map(str::parse::<Role>)
        .transpose()
        .map_err(CommandError::InvalidArgument)?;

    let store = connect().await?;
    let users = store
        .find_users(&UserQuery {
            role,
            ..UserQuery::default()
        })
        .await?;

    tracing::info!("{} user(s)", users.len());
    for user in users {
        tracing::info!("  {} {:<8} {} <{}>", user.id, user.role, user.name, user.email);
    }
    Ok(())
}
