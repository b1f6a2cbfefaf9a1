//! One-way mirroring: reconcile a replica against its source on a fixed interval.

pub mod engine;
pub mod executor;
pub mod scheduler;

pub use engine::{Plan, Reconciler, SyncAction};
pub use executor::{ActionOutcome, Executor};
pub use scheduler::{Scheduler, SchedulerState, StopSignal, TickReport};
