//! Core types and data structures for user dispatching
//!
//! Every mapping in the dispatch data model preserves insertion order: the
//! caller-supplied ordering of workers and of user classes drives the
//! deterministic allocation, so the containers here are `IndexMap`-backed.

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// Non-negative count of users
pub type Count = usize;

/// Opaque identifier of a user class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserClassName(String);

impl UserClassName {
    /// Get the class name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserClassName {
    fn from(name: &str) -> Self {
        UserClassName(name.to_string())
    }
}

impl From<String> for UserClassName {
    fn from(name: String) -> Self {
        UserClassName(name)
    }
}

impl Borrow<str> for UserClassName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of a worker node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Get the worker id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(id: &str) -> Self {
        WorkerId(id.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(id: String) -> Self {
        WorkerId(id)
    }
}

impl Borrow<str> for WorkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Ordered mapping from user class to count.
///
/// Serves both as a fleet-wide target mix and as the per-worker state of
/// running users. A class missing from the map counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassMix {
    counts: IndexMap<UserClassName, Count>,
}

impl ClassMix {
    /// Create an empty mix
    pub fn new() -> Self {
        ClassMix::default()
    }

    /// Build a mix from signed counts, rejecting negatives.
    ///
    /// This is the seam where a coordinator's config layer hands over parsed
    /// integers; anything below zero is a configuration error.
    pub fn try_from_signed<I, S>(pairs: I) -> DispatchResult<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut mix = ClassMix::new();
        for (class, count) in pairs {
            let class = class.into();
            let count = Count::try_from(count).map_err(|_| DispatchError::InvalidTarget {
                class: class.clone(),
                count,
            })?;
            mix.set(class, count);
        }
        Ok(mix)
    }

    /// Set the count for a class, inserting it at the end of the order if new
    pub fn set(&mut self, class: impl Into<UserClassName>, count: Count) {
        self.counts.insert(class.into(), count);
    }

    /// Count for a class; missing classes count as zero
    pub fn get(&self, class: &str) -> Count {
        self.counts.get(class).copied().unwrap_or(0)
    }

    /// Add one user of the given class
    pub fn add_one(&mut self, class: &UserClassName) {
        *self.counts.entry(class.clone()).or_insert(0) += 1;
    }

    /// Class names in insertion order
    pub fn classes(&self) -> impl Iterator<Item = &UserClassName> {
        self.counts.keys()
    }

    /// Iterate `(class, count)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&UserClassName, Count)> {
        self.counts.iter().map(|(class, count)| (class, *count))
    }

    /// Total user count across all classes
    pub fn total(&self) -> Count {
        self.counts.values().sum()
    }

    /// Number of classes in the mix
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when the mix holds no classes
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<S: Into<UserClassName>> FromIterator<(S, Count)> for ClassMix {
    fn from_iter<I: IntoIterator<Item = (S, Count)>>(pairs: I) -> Self {
        ClassMix {
            counts: pairs
                .into_iter()
                .map(|(class, count)| (class.into(), count))
                .collect(),
        }
    }
}

/// Complete fleet assignment: each worker id mapped to its user class mix.
///
/// Used for the balanced plan, for the evolving dispatched state, and for
/// every snapshot handed to the coordinator. Worker iteration order is the
/// caller-supplied order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FleetSnapshot {
    workers: IndexMap<WorkerId, ClassMix>,
}

impl FleetSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        FleetSnapshot::default()
    }

    /// Set the class mix for a worker
    pub fn insert(&mut self, worker: impl Into<WorkerId>, mix: ClassMix) {
        self.workers.insert(worker.into(), mix);
    }

    /// Class mix of a worker, if the worker is known
    pub fn get(&self, worker: &str) -> Option<&ClassMix> {
        self.workers.get(worker)
    }

    /// Count of users of `class` on `worker`; missing keys count as zero
    pub fn count(&self, worker: &str, class: &str) -> Count {
        self.workers.get(worker).map_or(0, |mix| mix.get(class))
    }

    /// Start one user of `class` on `worker`
    pub fn add_user(&mut self, worker: &WorkerId, class: &UserClassName) {
        self.workers
            .entry(worker.clone())
            .or_default()
            .add_one(class);
    }

    /// Fleet-wide count of users of `class`
    pub fn class_total(&self, class: &str) -> Count {
        self.workers.values().map(|mix| mix.get(class)).sum()
    }

    /// Iterate `(worker, mix)` pairs in worker order
    pub fn iter(&self) -> impl Iterator<Item = (&WorkerId, &ClassMix)> {
        self.workers.iter()
    }

    /// Worker ids in worker order
    pub fn worker_ids(&self) -> impl Iterator<Item = &WorkerId> {
        self.workers.keys()
    }

    /// Number of workers in the snapshot
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// True when the snapshot holds no workers
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl<W: Into<WorkerId>> FromIterator<(W, ClassMix)> for FleetSnapshot {
    fn from_iter<I: IntoIterator<Item = (W, ClassMix)>>(pairs: I) -> Self {
        FleetSnapshot {
            workers: pairs
                .into_iter()
                .map(|(worker, mix)| (worker.into(), mix))
                .collect(),
        }
    }
}

/// A worker node as seen by the coordinator: a stable id plus the user
/// classes currently running on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerNode {
    /// Stable worker identifier
    pub id: WorkerId,
    /// Users currently running on this worker, by class
    pub running_users: ClassMix,
}

impl WorkerNode {
    /// Create a worker node with no running users
    pub fn new(id: impl Into<WorkerId>) -> Self {
        WorkerNode {
            id: id.into(),
            running_users: ClassMix::new(),
        }
    }

    /// Create a worker node with the given running users
    pub fn with_running_users(id: impl Into<WorkerId>, running_users: ClassMix) -> Self {
        WorkerNode {
            id: id.into(),
            running_users,
        }
    }
}
