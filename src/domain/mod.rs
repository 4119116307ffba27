// Domain layer module exports
// Entities, value objects and ports; independent of HTTP and SQL

pub(crate) mod ids;

pub mod errors;
pub mod pending_action;
pub mod person;
pub mod race;
pub mod registration;
pub mod repositories;
pub mod team;

pub use errors::{EligibilityRule, EnrollmentError, EnrollmentResult};
