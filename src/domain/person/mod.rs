// Person domain module
// Competitors are owned by the membership service; the engine only reads them

#![allow(clippy::module_inception)]

pub mod person;
pub mod value_objects;

pub use person::{Person, MINIMUM_AGE};
pub use value_objects::{ClubId, Gender, PersonId};
