//! Offline queue and reconciliation.
//!
//! Student writes that cannot reach the registration service are parked in a
//! durable queue and replayed, in order, once the service answers again.
//!
//! Features:
//! - Durable queue stored in the local database
//! - On-demand connectivity checks with bounded backoff
//! - Ordered replay that stops at the first network failure
//! - Dead-letter list for writes the service refused

pub mod context;
pub mod dispatch;
pub mod executor;
pub mod monitor;
pub mod operation;
pub mod queue;
pub mod store;

pub use context::{AvailabilityChange, SyncContext};
pub use dispatch::{DeleteTarget, StudentDispatcher, Submission};
pub use executor::{
    format_sync_result, ExecutionResult, ExecutionStatus, ExecutorConfig, SyncExecutor,
    SyncOutcome, SyncResult,
};
pub use monitor::ConnectivityMonitor;
pub use operation::{DeadLetter, QueuedOperation};
pub use queue::{DeadLetters, SyncQueue};
pub use store::{SlotStore, DEAD_LETTER_SLOT, QUEUE_SLOT};
