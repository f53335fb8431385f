//! Filters accepted by the store's lookup and listing methods.
//!
//! Every set field must match; unset fields do not constrain.

use campus_core::{CourseCode, CourseId, Email, Role, UserId};

/// Filter for users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub id: Option<UserId>,
    pub email: Option<Email>,
    /// Case-insensitive literal substring of the name.
    pub name_contains: Option<String>,
    pub role: Option<Role>,
}

impl UserQuery {
    #[must_use]
    pub fn by_email(email: Email) -> Self {
        Self {
            email: Some(email),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_name(fragment: impl Into<String>) -> Self {
        Self {
            name_contains: Some(fragment.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

/// Filter for courses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseQuery {
    pub id: Option<CourseId>,
    pub code: Option<CourseCode>,
    /// Case-insensitive exact name.
    pub name_eq: Option<String>,
    pub teacher: Option<UserId>,
}

impl CourseQuery {
    #[must_use]
    pub fn by_code(code: CourseCode) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name_eq: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_teacher(teacher: UserId) -> Self {
        Self {
            teacher: Some(teacher),
            ..Self::default()
        }
    }
}

/// Filter for enrollments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentQuery {
    pub student: Option<UserId>,
    pub course: Option<CourseId>,
    /// Course must be one of these. An empty list matches nothing.
    pub course_in: Option<Vec<CourseId>>,
}

impl EnrollmentQuery {
    #[must_use]
    pub fn for_course(course: CourseId) -> Self {
        Self {
            course: Some(course),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_student(student: UserId) -> Self {
        Self {
            student: Some(student),
            ..Self::default()
        }
    }
}

/// Case-insensitive literal substring match.
pub(super) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Escape `%`, `_` and `\` so `needle` is matched literally by `ILIKE`.
pub(super) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
