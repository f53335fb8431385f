//! Campus Core - Shared types library.
//!
//! This crate provides common types used across all Campus components:
//! - `server` - JSON API for users, courses and enrollments
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and parsing - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, course codes and loose entity references

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
