//! Course domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use campus_core::{CourseCode, CourseId, Email, UserId};

use super::User;

/// A course (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub description: String,
    /// Teaching user. Serialized as `teacher` to match the listing shape.
    #[serde(rename = "teacher")]
    pub teacher_id: UserId,
    /// Scheduled date and time.
    pub date: DateTime<Utc>,
    pub code: CourseCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to insert a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub teacher_id: UserId,
    pub date: DateTime<Utc>,
    pub code: CourseCode,
}

/// Partial course update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub teacher_id: Option<UserId>,
    pub date: Option<DateTime<Utc>>,
    pub code: Option<CourseCode>,
}

/// Teacher projection embedded in course read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<&User> for TeacherSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A course with its teacher expanded and its enrollment count.
///
/// `teacher` is `None` when the referenced user no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDetail {
    pub id: CourseId,
    pub name: String,
    pub description: String,
    pub teacher: Option<TeacherSummary>,
    pub date: DateTime<Utc>,
    pub code: CourseCode,
    pub enrolled: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseDetail {
    /// Build the read model from a course and what its references resolved to.
    #[must_use]
    pub fn new(course: Course, teacher: Option<&User>, enrolled: u64) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            teacher: teacher.map(TeacherSummary::from),
            date: course.date,
            code: course.code,
            enrolled,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}
