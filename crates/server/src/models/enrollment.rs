//! Enrollment domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use campus_core::{CourseCode, CourseId, EnrollmentId, UserId};

use super::{StudentSummary, TeacherSummary};

/// An enrollment of one student in one course.
///
/// The `(student_id, course_id)` pair is unique in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    #[serde(rename = "student")]
    pub student_id: UserId,
    #[serde(rename = "course")]
    pub course_id: CourseId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to insert an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEnrollment {
    pub student_id: UserId,
    pub course_id: CourseId,
}

/// Course projection embedded in enrollment listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub id: CourseId,
    pub name: String,
    pub code: CourseCode,
    pub date: DateTime<Utc>,
    pub teacher: Option<TeacherSummary>,
}

/// An enrollment with student and course expanded two levels deep.
///
/// References that point at deleted rows expand to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentDetail {
    pub id: EnrollmentId,
    pub student: Option<StudentSummary>,
    pub course: Option<CourseSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student enrolled in a given course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseStudent {
    pub enrollment_id: EnrollmentId,
    pub enrolled_at: DateTime<Utc>,
    pub student: StudentSummary,
}
