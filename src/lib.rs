//! # Horde: distributed load-generation core
//!
//! The dispatch core of a load-testing coordinator: given a fleet of worker
//! nodes (each possibly already running users) and a target mix of user
//! classes, it produces a finite, deterministic sequence of fleet-wide
//! assignment snapshots that converges the fleet on an evenly balanced plan
//! at a caller-supplied spawn rate.
//!
//! The RPC channel that ships snapshots to workers, the worker-side user
//! runtime, and the coordinator's UI are external collaborators; this crate
//! owns only the balancing, pacing, and reconciliation logic.
//!
//! ```no_run
//! use horde::{ClassMix, UsersDispatcher, WorkerNode};
//!
//! # async fn run() -> horde::DispatchResult<()> {
//! let workers = vec![WorkerNode::new("worker-1"), WorkerNode::new("worker-2")];
//! let target: ClassMix = [("Browse", 40), ("Checkout", 10)].into_iter().collect();
//!
//! let mut dispatcher = UsersDispatcher::new(&workers, target, 5.0)?;
//! while let Some(snapshot) = dispatcher.next_snapshot().await {
//!     // ship the snapshot to each worker
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod dispatch;
pub mod error;
pub mod types;

// Re-export main types
pub use dispatch::{balance_users, dispatch_users, RampScheduler, UsersDispatcher};
pub use error::{DispatchError, DispatchResult};
pub use types::{ClassMix, Count, FleetSnapshot, UserClassName, WorkerId, WorkerNode};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
