//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! campus-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CAMPUS_DATABASE_URL` - `PostgreSQL` connection string (or `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Schema migrations live in `crates/server/migrations/`. The session table
//! is owned by `tower-sessions-sqlx-store` and created by its own migration.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, database_url};

/// Run the schema migrations, then create the session table.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or
/// a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = campus_server::db::create_pool(&url).await?;

    tracing::info!("Running campus migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
