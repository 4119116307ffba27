// Repository implementations (data access layer)
// Combine the remote authority and the local cache behind one interface

pub mod dual_source;
pub mod pending_queue;

pub use dual_source::{DualSourceRepository, SyncStatus};
pub use pending_queue::{PendingActionQueue, ReplayReport, MAX_REPLAY_ATTEMPTS};
