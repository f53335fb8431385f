//! Reference resolution.
//!
//! Turns a classified [`Reference`] into a concrete student or course. The
//! first branch that applies to the reference decides the lookup; a miss is
//! reported as `Ok(None)` and never falls through to another strategy. What a
//! miss means (validation failure or not-found) is up to the caller.

use campus_core::{CourseCode, CourseId, Email, Reference, Role, UserId};

use crate::db::{CourseQuery, RepositoryError, Store, UserQuery};
use crate::models::{Course, User};

/// Resolves loosely typed references against the store.
pub struct Resolver<'a> {
    store: &'a dyn Store,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Resolve a student.
    ///
    /// - identifier: the user with that id, if they are a student
    /// - email: the student with exactly that email
    /// - anything else: the oldest student whose name contains the text,
    ///   ignoring case
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store lookup fails.
    pub async fn student(&self, reference: &Reference) -> Result<Option<User>, RepositoryError> {
        let query = match reference {
            Reference::Identifier(id) => UserQuery {
                id: Some(UserId::new(*id)),
                ..UserQuery::default()
            },
            Reference::Email(raw) => match Email::parse(raw) {
                Ok(email) => UserQuery::by_email(email),
                // Not a deliverable address, so no stored user can have it.
                Err(_) => return Ok(None),
            },
            Reference::Numeric { .. } | Reference::Text(_) => {
                UserQuery::by_name(reference.as_text())
            }
        };

        self.store.find_user(&query.with_role(Role::Student)).await
    }

    /// Resolve a course.
    ///
    /// - identifier: the course with that id
    /// - integer: the oldest course with that code
    /// - anything else: the oldest course whose name equals the text,
    ///   ignoring case
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store lookup fails.
    pub async fn course(&self, reference: &Reference) -> Result<Option<Course>, RepositoryError> {
        match reference {
            Reference::Identifier(id) => self.store.course_by_id(CourseId::new(*id)).await,
            Reference::Numeric { value, .. } => match CourseCode::new(*value) {
                Ok(code) => self.store.find_course(&CourseQuery::by_code(code)).await,
                Err(_) => Ok(None),
            },
            Reference::Email(name) | Reference::Text(name) => {
                self.store.find_course(&CourseQuery::by_name(name.clone())).await
            }
        }
    }

    /// Ids of every teacher whose name contains `fragment`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store lookup fails.
    pub async fn teachers_named(&self, fragment: &str) -> Result<Vec<UserId>, RepositoryError> {
        let teachers = self
            .store
            .find_users(&UserQuery::by_name(fragment).with_role(Role::Teacher))
            .await?;
        Ok(teachers.into_iter().map(|t| t.id).collect())
    }
}
