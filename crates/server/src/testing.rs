//! Fixtures shared by the unit tests.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};

use campus_core::{CourseCode, Email, Role, UserId};

use crate::db::Store;
use crate::models::{Course, CurrentUser, NewCourse, NewUser, User};

/// Insert a user with a placeholder password hash.
pub async fn seed_user(store: &dyn Store, name: &str, email: &str, role: Role) -> User {
    store
        .insert_user(NewUser {
            name: name.to_owned(),
            email: Email::parse(email).unwrap(),
            password_hash: "not-a-real-hash".to_owned(),
            role,
        })
        .await
        .unwrap()
}

/// Insert a course scheduled on a fixed date.
pub async fn seed_course(store: &dyn Store, name: &str, code: i64, teacher: UserId) -> Course {
    store
        .insert_course(NewCourse {
            name: name.to_owned(),
            description: format!("{name} course"),
            teacher_id: teacher,
            date: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            code: CourseCode::new(code).unwrap(),
        })
        .await
        .unwrap()
}

/// The session identity of `user`.
pub fn actor(user: &User) -> CurrentUser {
    CurrentUser::from(user)
}
