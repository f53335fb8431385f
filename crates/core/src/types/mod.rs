//! Core types for Campus.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod course_code;
pub mod email;
pub mod id;
pub mod reference;
pub mod role;

pub use course_code::{CourseCode, CourseCodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use reference::{Reference, ReferenceError};
pub use role::*;
