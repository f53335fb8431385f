//! Persistence for users, courses and enrollments.
//!
//! The [`Store`] trait is the only way services touch data. Two backends
//! implement it:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx (schema `campus`)
//! - [`MemoryStore`] - process-local tables for tests and local runs
//!
//! # Tables
//!
//! - `campus.users` - Accounts, unique on `email`
//! - `campus.courses` - Courses, referencing a teaching user
//! - `campus.enrollments` - Student/course pairs, unique on `(student_id, course_id)`
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! References between tables are deliberately unconstrained: deleting a user
//! or course leaves enrollments pointing at nothing, and read models expand
//! such references to `null`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p campus-cli -- migrate
//! ```

mod memory;
mod postgres;
mod query;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use campus_core::{CourseId, Email, EnrollmentId, UserId};

use crate::models::{
    Course, CourseUpdate, Enrollment, EnrollmentDetail, NewCourse, NewEnrollment, NewUser, User,
    UserUpdate,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::{CourseQuery, EnrollmentQuery, UserQuery};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Data access used by the services.
///
/// Listing methods return rows oldest first. Inserts that would break a
/// uniqueness rule (user email, enrollment pair) fail with
/// [`RepositoryError::Conflict`] and leave the store unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// First user (oldest) matching every set field of `query`.
    async fn find_user(&self, query: &UserQuery) -> Result<Option<User>, RepositoryError>;

    async fn find_users(&self, query: &UserQuery) -> Result<Vec<User>, RepositoryError>;

    /// User and stored password hash for a login attempt.
    async fn credentials(&self, email: &Email) -> Result<Option<(User, String)>, RepositoryError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Apply `update`; `Ok(None)` when the user does not exist.
    async fn update_user(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, RepositoryError>;

    /// Delete a user; `Ok(false)` when nothing was deleted.
    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError>;

    async fn course_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError>;

    /// First course (oldest) matching every set field of `query`.
    async fn find_course(&self, query: &CourseQuery) -> Result<Option<Course>, RepositoryError>;

    async fn find_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, RepositoryError>;

    async fn insert_course(&self, course: NewCourse) -> Result<Course, RepositoryError>;

    async fn update_course(
        &self,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Option<Course>, RepositoryError>;

    async fn delete_course(&self, id: CourseId) -> Result<bool, RepositoryError>;

    /// The enrollment for a `(student, course)` pair, if any.
    async fn find_enrollment(
        &self,
        student: UserId,
        course: CourseId,
    ) -> Result<Option<Enrollment>, RepositoryError>;

    /// Enrollments matching `query` with student and course expanded.
    async fn enrollment_details(
        &self,
        query: &EnrollmentQuery,
    ) -> Result<Vec<EnrollmentDetail>, RepositoryError>;

    async fn count_enrollments(&self, query: &EnrollmentQuery) -> Result<u64, RepositoryError>;

    /// Insert an enrollment. A duplicate pair yields `RepositoryError::Conflict`.
    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, RepositoryError>;

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<bool, RepositoryError>;
}
