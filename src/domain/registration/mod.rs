// Registration domain module
// Team-to-race and person-to-race pairings plus the enrollment payload

pub mod enrollment;
pub mod person_registration;
pub mod team_registration;

pub use enrollment::Enrollment;
pub use person_registration::{PersonRaceEntry, PersonRaceRegistration};
pub use team_registration::{TeamEntry, TeamRaceRegistration};
