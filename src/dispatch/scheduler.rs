//! Paced ramp scheduling of user waves across the fleet

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

use crate::dispatch::balancer::balance_users;
use crate::dispatch::progress::{
    all_users_dispatched, class_fully_dispatched, users_left_to_dispatch,
};
use crate::error::{DispatchError, DispatchResult};
use crate::types::{ClassMix, Count, FleetSnapshot, UserClassName, WorkerId, WorkerNode};

/// Phase of a dispatch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RampPhase {
    /// Users remain to be started; waves are being emitted
    Ramping,
    /// The initial fleet state already meets the plan; one snapshot left
    Satisfied,
    /// The sequence has ended
    Done,
}

/// Lazy producer of fleet snapshots converging on the balanced plan.
///
/// Snapshots are pulled one at a time with [`next_snapshot`]; between waves
/// the producer sleeps toward an absolute deadline so the spawn rate holds
/// without drift. Dropping the scheduler at any point, including mid-sleep,
/// abandons the session with nothing to clean up.
///
/// [`next_snapshot`]: RampScheduler::next_snapshot
pub struct RampScheduler {
    /// Caller-supplied worker order
    worker_order: Vec<WorkerId>,

    /// Caller-supplied class order
    class_order: Vec<UserClassName>,

    /// Fleet-wide target mix
    target: ClassMix,

    /// Per-worker steady-state plan
    balanced: FleetSnapshot,

    /// Users accounted for so far: pre-existing users plus started waves
    dispatched: FleetSnapshot,

    /// Users added per emitted snapshot
    wave: Count,

    /// Pause between successive emissions
    delay: Duration,

    /// Absolute deadline of the next emission, once the first has gone out
    deadline: Option<Instant>,

    /// Current phase
    phase: RampPhase,
}

impl RampScheduler {
    /// Prime a dispatch session.
    ///
    /// Computes the balanced plan, restricts the initial fleet state to the
    /// target's classes (missing workers or classes count as zero), and
    /// derives the wave size and pacing from the spawn rate: `wave =
    /// max(1, floor(rate))` users per snapshot, `wave / rate` seconds apart.
    pub fn new(
        worker_nodes: &[WorkerNode],
        target: ClassMix,
        spawn_rate: f64,
    ) -> DispatchResult<Self> {
        if worker_nodes.is_empty() {
            return Err(DispatchError::EmptyWorkerSet);
        }
        if !spawn_rate.is_finite() || spawn_rate <= 0.0 {
            return Err(DispatchError::InvalidSpawnRate(spawn_rate));
        }

        let worker_order: Vec<WorkerId> =
            worker_nodes.iter().map(|node| node.id.clone()).collect();
        let class_order: Vec<UserClassName> = target.classes().cloned().collect();
        let balanced = balance_users(&worker_order, &target)?;

        let dispatched: FleetSnapshot = worker_nodes
            .iter()
            .map(|node| {
                let running: ClassMix = class_order
                    .iter()
                    .map(|class| (class.clone(), node.running_users.get(class.as_str())))
                    .collect();
                (node.id.clone(), running)
            })
            .collect();

        let wave = (spawn_rate.floor() as Count).max(1);
        let delay = Duration::from_secs_f64(wave as f64 / spawn_rate);

        let phase = if all_users_dispatched(&dispatched, &balanced, &target) {
            RampPhase::Satisfied
        } else {
            RampPhase::Ramping
        };

        debug!(
            workers = worker_order.len(),
            classes = class_order.len(),
            spawn_rate,
            wave,
            delay_ms = delay.as_millis() as u64,
            users_left = users_left_to_dispatch(&dispatched, &balanced, &target),
            "dispatch session primed"
        );

        Ok(RampScheduler {
            worker_order,
            class_order,
            target,
            balanced,
            dispatched,
            wave,
            delay,
            deadline: None,
            phase,
        })
    }

    /// Produce the next fleet snapshot, or `None` once the plan is reached.
    ///
    /// The first snapshot emits immediately; each later one waits for the
    /// inter-wave delay first. The emission that completes the ramp is the
    /// balanced plan verbatim, shrinking any over-provisioned cells in one
    /// step; intermediate snapshots leave pre-existing excess untouched.
    pub async fn next_snapshot(&mut self) -> Option<FleetSnapshot> {
        match self.phase {
            RampPhase::Done => None,
            RampPhase::Satisfied => {
                self.phase = RampPhase::Done;
                trace!("initial fleet state meets the plan, emitting it verbatim");
                Some(self.balanced.clone())
            }
            RampPhase::Ramping => {
                match self.deadline {
                    None => self.deadline = Some(Instant::now() + self.delay),
                    Some(deadline) => {
                        sleep_until(deadline).await;
                        self.deadline = Some(deadline + self.delay);
                    }
                }

                let added = self.fill_wave();
                if all_users_dispatched(&self.dispatched, &self.balanced, &self.target) {
                    self.phase = RampPhase::Done;
                    debug!(added, "ramp complete, emitting balanced plan");
                    Some(self.balanced.clone())
                } else {
                    trace!(added, users_left = self.users_left(), "wave emitted");
                    Some(self.dispatched.clone())
                }
            }
        }
    }

    /// The steady-state plan this session converges on
    pub fn balanced_plan(&self) -> &FleetSnapshot {
        &self.balanced
    }

    /// Users still to start before the ramp is complete
    pub fn users_left(&self) -> Count {
        users_left_to_dispatch(&self.dispatched, &self.balanced, &self.target)
    }

    /// Users added per emitted snapshot
    pub fn wave_size(&self) -> Count {
        self.wave
    }

    /// Pause between successive emissions
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start up to one wave of users, class-major in target order.
    ///
    /// Stays on a class until it is satisfied, then moves to the next, so a
    /// wave crosses a class boundary when the current class saturates
    /// mid-wave. Returns the number of users actually started.
    fn fill_wave(&mut self) -> Count {
        let mut added = 0;
        for class in &self.class_order {
            while added < self.wave
                && !class_satisfied(&self.dispatched, &self.balanced, &self.target, class)
            {
                if !spawn_on_least_loaded(
                    &mut self.dispatched,
                    &self.balanced,
                    &self.worker_order,
                    class,
                ) {
                    break;
                }
                added += 1;
            }
            if added == self.wave {
                break;
            }
        }
        added
    }
}

/// A class needs no further users once every worker reached its balanced
/// share, or the fleet as a whole already runs at least the target count.
fn class_satisfied(
    dispatched: &FleetSnapshot,
    balanced: &FleetSnapshot,
    target: &ClassMix,
    class: &UserClassName,
) -> bool {
    class_fully_dispatched(dispatched, balanced, class.as_str())
        || dispatched.class_total(class.as_str()) >= target.get(class.as_str())
}

/// Start one user of `class` on the worker with the fewest users of that
/// class among workers still below their balanced share, ties broken by
/// worker order. Returns false when no worker is eligible.
fn spawn_on_least_loaded(
    dispatched: &mut FleetSnapshot,
    balanced: &FleetSnapshot,
    worker_order: &[WorkerId],
    class: &UserClassName,
) -> bool {
    let mut chosen: Option<&WorkerId> = None;
    let mut lowest = Count::MAX;
    for worker in worker_order {
        let current = dispatched.count(worker.as_str(), class.as_str());
        if current >= balanced.count(worker.as_str(), class.as_str()) {
            continue;
        }
        if current < lowest {
            lowest = current;
            chosen = Some(worker);
        }
    }

    match chosen {
        Some(worker) => {
            dispatched.add_user(worker, class);
            true
        }
        None => false,
    }
}
