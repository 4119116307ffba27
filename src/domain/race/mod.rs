// Race domain module
// Races belong to a parent raid and are immutable for the enrollment engine

#![allow(clippy::module_inception)]

pub mod race;
pub mod value_objects;

pub use race::Race;
pub use value_objects::{GenderConstraint, RaceId, RaceWindow, RaidId};
