use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{EnrollmentError, EnrollmentResult};
use crate::domain::ids::uuid_id;
use crate::domain::person::Gender;

uuid_id!(
    /// Identifier of a race
    RaceId
);

uuid_id!(
    /// Identifier of the parent multi-race event
    RaidId
);

/// Gender constraint of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderConstraint {
    Male,
    Female,
    Mixed,
}

impl GenderConstraint {
    /// Whether a competitor of `gender` may enter
    ///
    /// # Example
    /// ```
    /// use raid_enrollment::domain::person::Gender;
    /// use raid_enrollment::domain::race::GenderConstraint;
    ///
    /// assert!(GenderConstraint::Mixed.admits(Gender::Male));
    /// assert!(!GenderConstraint::Female.admits(Gender::Male));
    /// ```
    pub fn admits(&self, gender: Gender) -> bool {
        match self {
            GenderConstraint::Mixed => true,
            GenderConstraint::Male => gender == Gender::Male,
            GenderConstraint::Female => gender == Gender::Female,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(GenderConstraint::Male),
            "female" => Some(GenderConstraint::Female),
            "mixed" => Some(GenderConstraint::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenderConstraint::Male => "male",
            GenderConstraint::Female => "female",
            GenderConstraint::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for GenderConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Half-open time window `[start, end)` of a race
///
/// # Invariants
/// - `start` is strictly before `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RaceWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> EnrollmentResult<Self> {
        if start >= end {
            return Err(EnrollmentError::ValidationViolation(format!(
                "race window must end after it starts ({} >= {})",
                start, end
            )));
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True when the two windows share any instant
    ///
    /// Windows that only touch (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &RaceWindow) -> bool {
        other.start < self.end && other.end > self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, hour, 0, 0).unwrap()
    }

    fn window(start: u32, end: u32) -> RaceWindow {
        RaceWindow::new(at(start), at(end)).unwrap()
    }

    #[test]
    fn window_rejects_empty_or_inverted_range() {
        assert!(RaceWindow::new(at(10), at(10)).is_err());
        assert!(RaceWindow::new(at(12), at(10)).is_err());
    }

    #[test]
    fn partially_shared_windows_overlap() {
        assert!(window(10, 12).overlaps(&window(11, 13)));
        assert!(window(11, 13).overlaps(&window(10, 12)));
    }

    #[test]
    fn contained_window_overlaps() {
        assert!(window(8, 18).overlaps(&window(10, 12)));
        assert!(window(10, 12).overlaps(&window(8, 18)));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        assert!(!window(10, 12).overlaps(&window(12, 14)));
        assert!(!window(12, 14).overlaps(&window(10, 12)));
    }

    #[test]
    fn gender_constraint_admission() {
        assert!(GenderConstraint::Male.admits(Gender::Male));
        assert!(!GenderConstraint::Male.admits(Gender::Female));
        assert!(GenderConstraint::Female.admits(Gender::Female));
        assert!(GenderConstraint::Mixed.admits(Gender::Female));
    }

    #[test]
    fn gender_constraint_parse_round_trips_display() {
        for constraint in [
            GenderConstraint::Male,
            GenderConstraint::Female,
            GenderConstraint::Mixed,
        ] {
            assert_eq!(GenderConstraint::parse(&constraint.to_string()), Some(constraint));
        }
        assert_eq!(GenderConstraint::parse("any"), None);
    }
}
