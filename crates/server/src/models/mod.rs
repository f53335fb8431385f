//! Domain models for the server.
//!
//! These types represent validated domain objects separate from database row
//! types. Read models (`*Summary`, `*Detail`) carry the expanded references
//! returned by listing endpoints.

pub mod course;
pub mod enrollment;
pub mod session;
pub mod user;

pub use course::{Course, CourseDetail, CourseUpdate, NewCourse, TeacherSummary};
pub use enrollment::{CourseStudent, CourseSummary, Enrollment, EnrollmentDetail, NewEnrollment};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, StudentSummary, User, UserUpdate};
