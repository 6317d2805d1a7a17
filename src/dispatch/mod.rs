//! User dispatching - deterministic fleet balancing with paced ramp-up
//!
//! The dispatcher turns a fleet-wide target mix into a finite sequence of
//! fleet snapshots: the balancer splits the target evenly across the ordered
//! worker list, the ramp scheduler grows the fleet toward that plan one wave
//! at a time under the spawn-rate budget, and the progress predicates decide
//! when a class, and eventually the whole ramp, is complete. The coordinator
//! pulls snapshots and ships each one to the workers.

pub mod balancer;
pub mod progress;
pub mod scheduler;

pub use balancer::balance_users;
pub use progress::{all_users_dispatched, class_fully_dispatched, users_left_to_dispatch};
pub use scheduler::RampScheduler;

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::DispatchResult;
use crate::types::{ClassMix, Count, FleetSnapshot, WorkerNode};

/// Entry point for a dispatch session.
///
/// Wires the balancer and the ramp scheduler together and exposes the lazy
/// snapshot sequence. The caller's worker ordering (the slice order) and
/// class ordering (the target's insertion order) drive every allocation
/// decision downstream; inputs are owned or copied at construction, so the
/// caller is free to mutate its own state afterwards.
pub struct UsersDispatcher {
    scheduler: RampScheduler,
}

/// Prime a dispatch session for the given fleet, target mix, and spawn rate.
///
/// Convenience wrapper around [`UsersDispatcher::new`].
pub fn dispatch_users(
    worker_nodes: &[WorkerNode],
    target: ClassMix,
    spawn_rate: f64,
) -> DispatchResult<UsersDispatcher> {
    UsersDispatcher::new(worker_nodes, target, spawn_rate)
}

impl UsersDispatcher {
    /// Validate the inputs and prime a session.
    ///
    /// Fails synchronously, before any worker is contacted, when the worker
    /// list is empty or the spawn rate is not a positive finite number.
    pub fn new(
        worker_nodes: &[WorkerNode],
        target: ClassMix,
        spawn_rate: f64,
    ) -> DispatchResult<Self> {
        Ok(UsersDispatcher {
            scheduler: RampScheduler::new(worker_nodes, target, spawn_rate)?,
        })
    }

    /// Pull the next fleet snapshot, or `None` once the sequence has ended
    pub async fn next_snapshot(&mut self) -> Option<FleetSnapshot> {
        self.scheduler.next_snapshot().await
    }

    /// The steady-state plan this session converges on
    pub fn balanced_plan(&self) -> &FleetSnapshot {
        self.scheduler.balanced_plan()
    }

    /// Users still to start before the ramp is complete
    pub fn users_left(&self) -> Count {
        self.scheduler.users_left()
    }

    /// Users added per emitted snapshot
    pub fn wave_size(&self) -> Count {
        self.scheduler.wave_size()
    }

    /// Pause between successive emissions
    pub fn delay(&self) -> Duration {
        self.scheduler.delay()
    }

    /// Run the session on a background task, pushing snapshots into a
    /// bounded channel of capacity one.
    ///
    /// The channel closes once the plan is reached. Dropping the receiver
    /// cancels the session: the task stops at its next emission without
    /// contacting anything. Must be called from within a tokio runtime.
    pub fn spawn(mut self) -> mpsc::Receiver<FleetSnapshot> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            while let Some(snapshot) = self.scheduler.next_snapshot().await {
                if tx.send(snapshot).await.is_err() {
                    debug!("snapshot receiver dropped, abandoning dispatch session");
                    return;
                }
            }
        });
        rx
    }
}
