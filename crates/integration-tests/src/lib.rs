//! Integration tests for Campus.
//!
//! The tests talk to a running server over HTTP and are ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and the admin the tests log in as
//! campus-cli migrate
//! campus-cli user create -e admin@example.com -n Admin -r admin -p admin-secret
//!
//! # Start the server
//! cargo run -p campus-server
//!
//! # Run the ignored tests
//! cargo test -p campus-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `CAMPUS_TEST_URL` - server base URL (default `http://localhost:5000`)
//! - `CAMPUS_TEST_ADMIN_EMAIL` / `CAMPUS_TEST_ADMIN_PASSWORD` - admin login

use reqwest::Client;
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("CAMPUS_TEST_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// A client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}
