//! Durable queue of writes the remote authority has not acknowledged yet.
//!
//! Actions are stored in the local cache and replayed in insertion order.
//! A replay pass stops at the first `Unavailable` or `Unauthorized` answer
//! so later actions never overtake earlier ones. An action the authority
//! refuses [`MAX_REPLAY_ATTEMPTS`] times is parked: kept in the cache for
//! inspection but no longer replayed.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::Credential;
use crate::domain::errors::EnrollmentResult;
use crate::domain::pending_action::{PendingAction, QueuedAction};
use crate::domain::registration::Enrollment;
use crate::domain::repositories::{LocalCache, RemoteAuthority, RemoteError};
use crate::engine::dossard::DossardAllocator;

/// Refusals after which a queued action is parked
pub const MAX_REPLAY_ATTEMPTS: u32 = 5;

/// Outcome of one replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Actions acknowledged by the authority and dropped from the queue
    pub replayed: usize,
    /// Creations given a new entry number after a conflict
    pub renumbered: usize,
    /// Actions parked during this pass
    pub parked: usize,
    /// Actions still queued after the pass
    pub remaining: usize,
}

impl ReplayReport {
    pub fn is_drained(&self) -> bool {
        self.remaining == 0
    }
}

enum Replay {
    Done,
    Kept,
    Stop,
}

pub struct PendingActionQueue {
    cache: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteAuthority>,
    allocator: Arc<DossardAllocator>,
    // One replay pass at a time
    replaying: Mutex<()>,
}

impl PendingActionQueue {
    pub fn new(
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteAuthority>,
        allocator: Arc<DossardAllocator>,
    ) -> Self {
        Self {
            cache,
            remote,
            allocator,
            replaying: Mutex::new(()),
        }
    }

    pub async fn enqueue(&self, action: &PendingAction) -> EnrollmentResult<i64> {
        let id = self.cache.enqueue_action(action).await?;
        tracing::info!(action_id = id, kind = action.kind(), "Queued action for replay");
        Ok(id)
    }

    /// Queued actions, oldest first
    pub async fn pending(&self) -> EnrollmentResult<Vec<QueuedAction>> {
        self.cache.pending_actions().await
    }

    pub async fn has_pending(&self) -> EnrollmentResult<bool> {
        Ok(!self.cache.pending_actions().await?.is_empty())
    }

    /// Actions taken out of replay after repeated refusals
    pub async fn parked(&self) -> EnrollmentResult<Vec<QueuedAction>> {
        self.cache.parked_actions().await
    }

    /// Sends every queued action to the authority, oldest first
    pub async fn replay_all(&self, credential: &Credential) -> EnrollmentResult<ReplayReport> {
        let _pass = self.replaying.lock().await;

        let queued = self.pending().await?;
        let mut report = ReplayReport::default();

        if queued.is_empty() {
            return Ok(report);
        }

        tracing::info!(count = queued.len(), "Replaying pending actions");

        for item in queued {
            let outcome = match self.send(credential, &item.action).await {
                Ok(()) => Replay::Done,
                Err(RemoteError::Unavailable(message)) => {
                    tracing::warn!(
                        action_id = item.id,
                        error = %message,
                        "Remote unavailable, stopping replay"
                    );
                    Replay::Stop
                }
                Err(RemoteError::Unauthorized(message)) => {
                    tracing::warn!(
                        action_id = item.id,
                        error = %message,
                        "Credential refused, stopping replay"
                    );
                    Replay::Stop
                }
                Err(RemoteError::Conflict(message)) => match &item.action {
                    PendingAction::CreateEnrollment { enrollment } => {
                        tracing::warn!(
                            action_id = item.id,
                            entry_number = %enrollment.entry_number,
                            error = %message,
                            "Entry number taken while offline, renumbering"
                        );
                        self.renumber_and_retry(credential, &item, enrollment, &mut report)
                            .await?
                    }
                    _ => {
                        self.keep(&item, &RemoteError::Conflict(message), &mut report)
                            .await?
                    }
                },
                Err(err) => self.keep(&item, &err, &mut report).await?,
            };

            match outcome {
                Replay::Done => {
                    self.cache.delete_action(item.id).await?;
                    report.replayed += 1;
                }
                Replay::Kept => {}
                Replay::Stop => break,
            }
        }

        report.remaining = self.cache.pending_actions().await?.len();
        tracing::info!(
            replayed = report.replayed,
            renumbered = report.renumbered,
            parked = report.parked,
            remaining = report.remaining,
            "Replay pass finished"
        );

        Ok(report)
    }

    async fn send(&self, credential: &Credential, action: &PendingAction) -> Result<(), RemoteError> {
        match action {
            PendingAction::CreateEnrollment { enrollment } => {
                self.remote.create_enrollment(credential, enrollment).await
            }
            PendingAction::SetValidation {
                team_id,
                race_id,
                validated,
            } => {
                self.remote
                    .set_validation(credential, *team_id, *race_id, *validated)
                    .await
            }
            PendingAction::RemoveMember {
                team_id,
                person_id,
                race_id,
            } => {
                self.remote
                    .remove_member(credential, *team_id, *person_id, *race_id)
                    .await
            }
            PendingAction::DeleteTeam { team_id } => {
                self.remote.delete_team(credential, *team_id).await
            }
        }
    }

    /// Records a refusal; parks the action once it has been refused
    /// [`MAX_REPLAY_ATTEMPTS`] times
    async fn keep(
        &self,
        item: &QueuedAction,
        err: &RemoteError,
        report: &mut ReplayReport,
    ) -> EnrollmentResult<Replay> {
        let attempts = self.cache.record_rejection(item.id, &err.to_string()).await?;

        if attempts >= MAX_REPLAY_ATTEMPTS {
            self.cache.park_action(item.id).await?;
            report.parked += 1;
            tracing::error!(
                action_id = item.id,
                kind = item.action.kind(),
                attempts,
                error = %err,
                "Authority keeps rejecting queued action, parking it"
            );
        } else {
            tracing::warn!(
                action_id = item.id,
                kind = item.action.kind(),
                attempts,
                error = %err,
                "Authority rejected queued action, keeping it"
            );
        }

        Ok(Replay::Kept)
    }

    /// Moves a conflicting creation past every number the authority and the
    /// cache know of, then sends it once more
    async fn renumber_and_retry(
        &self,
        credential: &Credential,
        item: &QueuedAction,
        enrollment: &Enrollment,
        report: &mut ReplayReport,
    ) -> EnrollmentResult<Replay> {
        let action_id = item.id;
        let race_id = enrollment.race_id;
        let _guard = self.allocator.lock(race_id).await;

        let authoritative = match self.remote.fetch_team_entries(credential, race_id).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(race_id = %race_id, error = %err, "Cannot read authoritative entries");
                return Ok(Replay::Stop);
            }
        };

        let others: Vec<_> = authoritative
            .iter()
            .filter(|entry| entry.team.id() != enrollment.team.id())
            .cloned()
            .collect();
        self.cache.upsert_team_entries(race_id, &others).await?;

        let high_water = self.cache.entry_number_high_water(race_id).await?;
        let number = DossardAllocator::next_number(
            others.iter().map(|entry| entry.registration.entry_number()),
            high_water,
        );
        let renumbered = enrollment.renumbered(number);

        self.cache.apply_enrollment(&renumbered).await?;
        self.cache
            .replace_action(
                action_id,
                &PendingAction::CreateEnrollment {
                    enrollment: renumbered.clone(),
                },
            )
            .await?;
        report.renumbered += 1;

        tracing::info!(
            action_id,
            team_id = %renumbered.team.id(),
            entry_number = %number,
            "Creation renumbered"
        );

        match self.remote.create_enrollment(credential, &renumbered).await {
            Ok(()) => Ok(Replay::Done),
            Err(RemoteError::Unavailable(message)) => {
                tracing::warn!(action_id, error = %message, "Remote unavailable, stopping replay");
                Ok(Replay::Stop)
            }
            Err(RemoteError::Unauthorized(message)) => {
                tracing::warn!(action_id, error = %message, "Credential refused, stopping replay");
                Ok(Replay::Stop)
            }
            Err(err) => self.keep(item, &err, report).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_drained() {
        assert!(ReplayReport::default().is_drained());
        assert!(!ReplayReport {
            remaining: 1,
            ..ReplayReport::default()
        }
        .is_drained());
    }
}
