use chrono::{Datelike, NaiveDate};

use super::value_objects::{ClubId, Gender, PersonId};

/// Minimum age, in full years, to be entered in a race
pub const MINIMUM_AGE: u32 = 12;

/// A competitor as known to the membership service
///
/// Read-only for the enrollment engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub club_id: Option<ClubId>,
    pub license_number: Option<String>,
}

impl Person {
    /// Age in full years on the given date
    ///
    /// Returns 0 for birth dates in the future.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use raid_enrollment::domain::person::{Gender, Person, PersonId};
    ///
    /// let person = Person {
    ///     id: PersonId::new(),
    ///     first_name: "Ada".to_string(),
    ///     last_name: "Lovelace".to_string(),
    ///     birth_date: NaiveDate::from_ymd_opt(2000, 6, 15).unwrap(),
    ///     gender: Gender::Female,
    ///     club_id: None,
    ///     license_number: None,
    /// };
    ///
    /// assert_eq!(person.age_on(NaiveDate::from_ymd_opt(2012, 6, 14).unwrap()), 11);
    /// assert_eq!(person.age_on(NaiveDate::from_ymd_opt(2012, 6, 15).unwrap()), 12);
    /// ```
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        if today < self.birth_date {
            return 0;
        }

        let mut years = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            years -= 1;
        }

        years.max(0) as u32
    }

    /// "First Last" display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_born(y: i32, m: u32, d: u32) -> Person {
        Person {
            id: PersonId::new(),
            first_name: "Lea".to_string(),
            last_name: "Martin".to_string(),
            birth_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            gender: Gender::Female,
            club_id: None,
            license_number: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_counts_full_years_only() {
        let person = person_born(1990, 3, 20);

        assert_eq!(person.age_on(date(2020, 3, 19)), 29);
        assert_eq!(person.age_on(date(2020, 3, 20)), 30);
        assert_eq!(person.age_on(date(2020, 12, 31)), 30);
    }

    #[test]
    fn leap_day_birthday_ages_on_first_of_march() {
        let person = person_born(2008, 2, 29);

        assert_eq!(person.age_on(date(2021, 2, 28)), 12);
        assert_eq!(person.age_on(date(2020, 2, 28)), 11);
        assert_eq!(person.age_on(date(2020, 2, 29)), 12);
    }

    #[test]
    fn future_birth_date_is_age_zero() {
        let person = person_born(2030, 1, 1);
        assert_eq!(person.age_on(date(2026, 1, 1)), 0);
    }

    #[test]
    fn full_name() {
        assert_eq!(person_born(1990, 1, 1).full_name(), "Lea Martin");
    }
}
