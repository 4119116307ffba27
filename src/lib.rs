//! Raid Enrollment Library
//!
//! Team enrollment for multi-sport raid races: eligibility filtering, race
//! entry number allocation, team validation, and offline-tolerant
//! persistence that mirrors a remote authority into a local SQLite cache.

pub mod auth;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infrastructure;

pub use domain::{EnrollmentError, EnrollmentResult};
pub use engine::EnrollmentEngine;
