//! Race-scoped entry number (dossard) allocation.
//!
//! Allocation reads the current maximum and then writes the new registration.
//! Holding the race lock across that read and write serialises allocations
//! per race within this process; the `(race, number)` uniqueness constraint
//! in the cache and at the authority catches writers in other processes, and
//! callers retry on `Conflict`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::race::RaceId;
use crate::domain::team::EntryNumber;

/// Attempts made before an allocation conflict is reported to the caller
pub const MAX_ALLOCATION_ATTEMPTS: usize = 3;

/// Held while a race's next number is read and written
pub type RaceGuard = OwnedMutexGuard<()>;

/// Hands out per-race serialization points
#[derive(Debug, Default)]
pub struct DossardAllocator {
    locks: Mutex<HashMap<RaceId, Arc<AsyncMutex<()>>>>,
}

impl DossardAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive allocation rights on `race_id`
    pub async fn lock(&self, race_id: RaceId) -> RaceGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(race_id).or_default())
        };

        lock.lock_owned().await
    }

    /// Next free number: one past the highest of the existing numbers and
    /// the race's high-water mark, or 1 when neither exists
    ///
    /// # Example
    /// ```
    /// use raid_enrollment::domain::team::EntryNumber;
    /// use raid_enrollment::engine::dossard::DossardAllocator;
    ///
    /// let existing = [EntryNumber::new(1).unwrap(), EntryNumber::new(2).unwrap()];
    /// assert_eq!(DossardAllocator::next_number(existing, None).value(), 3);
    /// assert_eq!(DossardAllocator::next_number([], None).value(), 1);
    /// ```
    pub fn next_number(
        existing: impl IntoIterator<Item = EntryNumber>,
        high_water: Option<EntryNumber>,
    ) -> EntryNumber {
        existing
            .into_iter()
            .chain(high_water)
            .max()
            .map(|highest| highest.next())
            .unwrap_or(EntryNumber::FIRST)
    }
}
