//! Numeric course code.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`CourseCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("course code must be between {min} and {max} (got {value})", min = CourseCode::MIN, max = CourseCode::MAX)]
pub struct CourseCodeError {
    /// The rejected value.
    pub value: i64,
}

/// A course code in `1..=15`.
///
/// Codes are labels, not keys: several courses may share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct CourseCode(i16);

impl CourseCode {
    /// Smallest valid code.
    pub const MIN: i16 = 1;
    /// Largest valid code.
    pub const MAX: i16 = 15;

    /// Validate a course code.
    ///
    /// # Errors
    ///
    /// Returns `CourseCodeError` when the value is outside `1..=15`.
    pub fn new(value: i64) -> Result<Self, CourseCodeError> {
        i16::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(CourseCodeError { value })
    }

    /// Get the code as a small integer.
    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }
}

impl std::fmt::Display for CourseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for CourseCode {
    type Error = CourseCodeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourseCode> for i16 {
    fn from(code: CourseCode) -> Self {
        code.0
    }
}
