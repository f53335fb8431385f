//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `users` - Profile reads, updates and deletion
//! - `courses` - Course management and course rosters
//! - `enrollments` - Enrollment creation, listing and deletion
//! - `resolver` - Resolution of loosely typed student/course references
//!
//! Services borrow the store for the duration of a request and return
//! [`ServiceError`], except `auth` which has its own [`auth::AuthError`].

pub mod auth;
pub mod courses;
pub mod enrollments;
mod error;
pub mod resolver;
pub mod users;

pub use error::{ServiceError, ServiceResult};
