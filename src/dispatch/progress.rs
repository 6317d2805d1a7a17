//! Progress predicates over a ramp in flight
//!
//! Pure functions shared by the ramp scheduler: they compare the dispatched
//! state against the balanced plan and the fleet-wide target without mutating
//! either.

use crate::types::{ClassMix, Count, FleetSnapshot};

/// Number of users still to start before the ramp is complete.
///
/// Sums the per-worker deficits against the balanced plan, except that a
/// class whose fleet-wide dispatched total already meets its target
/// contributes nothing: a worker that entered the session with excess users
/// of a class parks that class until the terminal collapse.
pub fn users_left_to_dispatch(
    dispatched: &FleetSnapshot,
    balanced: &FleetSnapshot,
    target: &ClassMix,
) -> Count {
    target
        .iter()
        .map(|(class, wanted)| {
            if dispatched.class_total(class.as_str()) >= wanted {
                return 0;
            }
            balanced
                .iter()
                .map(|(worker, mix)| {
                    mix.get(class.as_str())
                        .saturating_sub(dispatched.count(worker.as_str(), class.as_str()))
                })
                .sum()
        })
        .sum()
}

/// True once every worker has reached its balanced share of `class`.
pub fn class_fully_dispatched(
    dispatched: &FleetSnapshot,
    balanced: &FleetSnapshot,
    class: &str,
) -> bool {
    balanced
        .iter()
        .all(|(worker, mix)| dispatched.count(worker.as_str(), class) >= mix.get(class))
}

/// True once no users are left to dispatch anywhere in the fleet.
///
/// Over-provisioned workers are accepted; under-provisioned ones are not.
pub fn all_users_dispatched(
    dispatched: &FleetSnapshot,
    balanced: &FleetSnapshot,
    target: &ClassMix,
) -> bool {
    users_left_to_dispatch(dispatched, balanced, target) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mix(pairs: &[(&str, usize)]) -> ClassMix {
        pairs.iter().map(|&(class, count)| (class, count)).collect()
    }

    fn two_worker_fleet(worker1: &[(&str, usize)], worker2: &[(&str, usize)]) -> FleetSnapshot {
        [("Worker1", mix(worker1)), ("Worker2", mix(worker2))]
            .into_iter()
            .collect()
    }

    fn balanced_plan() -> FleetSnapshot {
        two_worker_fleet(
            &[("User1", 3), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        )
    }

    #[test]
    fn test_number_of_users_left_to_dispatch() {
        let target = mix(&[("User1", 6), ("User2", 2), ("User3", 8)]);
        let balanced = balanced_plan();

        let dispatched = two_worker_fleet(
            &[("User1", 5), ("User2", 2), ("User3", 6)],
            &[("User1", 5), ("User2", 2), ("User3", 6)],
        );
        assert_eq!(users_left_to_dispatch(&dispatched, &balanced, &target), 0);

        let dispatched = two_worker_fleet(
            &[("User1", 2), ("User2", 0), ("User3", 4)],
            &[("User1", 2), ("User2", 0), ("User3", 4)],
        );
        assert_eq!(users_left_to_dispatch(&dispatched, &balanced, &target), 4);

        let dispatched = two_worker_fleet(
            &[("User1", 3), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 0), ("User3", 4)],
        );
        assert_eq!(users_left_to_dispatch(&dispatched, &balanced, &target), 1);

        let dispatched = two_worker_fleet(
            &[("User1", 3), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        );
        assert_eq!(users_left_to_dispatch(&dispatched, &balanced, &target), 0);
    }

    #[test]
    fn test_all_users_dispatched() {
        let target = mix(&[("User1", 6), ("User2", 2), ("User3", 8)]);
        let balanced = balanced_plan();

        let dispatched = two_worker_fleet(
            &[("User1", 3), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        );
        assert!(all_users_dispatched(&dispatched, &balanced, &target));

        // Over-provision on one worker is accepted
        let dispatched = two_worker_fleet(
            &[("User1", 4), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        );
        assert!(all_users_dispatched(&dispatched, &balanced, &target));

        let dispatched = two_worker_fleet(
            &[("User1", 2), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        );
        assert!(!all_users_dispatched(&dispatched, &balanced, &target));

        let dispatched = two_worker_fleet(
            &[("User1", 0), ("User2", 0), ("User3", 0)],
            &[("User1", 0), ("User2", 0), ("User3", 0)],
        );
        assert!(!all_users_dispatched(&dispatched, &balanced, &target));

        // Excess in one class does not cover the others
        let dispatched = two_worker_fleet(
            &[("User1", 4), ("User2", 0), ("User3", 0)],
            &[("User1", 4), ("User2", 0), ("User3", 0)],
        );
        assert!(!all_users_dispatched(&dispatched, &balanced, &target));
    }

    #[test]
    fn test_all_users_of_current_class_have_been_dispatched() {
        let balanced = balanced_plan();

        let dispatched = two_worker_fleet(
            &[("User1", 3), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        );
        assert!(class_fully_dispatched(&dispatched, &balanced, "User1"));
        assert!(class_fully_dispatched(&dispatched, &balanced, "User2"));
        assert!(class_fully_dispatched(&dispatched, &balanced, "User3"));

        let dispatched = two_worker_fleet(
            &[("User1", 4), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        );
        assert!(class_fully_dispatched(&dispatched, &balanced, "User1"));

        let dispatched = two_worker_fleet(
            &[("User1", 2), ("User2", 1), ("User3", 4)],
            &[("User1", 3), ("User2", 1), ("User3", 4)],
        );
        assert!(!class_fully_dispatched(&dispatched, &balanced, "User1"));
        assert!(class_fully_dispatched(&dispatched, &balanced, "User2"));
        assert!(class_fully_dispatched(&dispatched, &balanced, "User3"));

        let dispatched = two_worker_fleet(
            &[("User1", 0), ("User2", 0), ("User3", 0)],
            &[("User1", 0), ("User2", 0), ("User3", 0)],
        );
        assert!(!class_fully_dispatched(&dispatched, &balanced, "User1"));
        assert!(!class_fully_dispatched(&dispatched, &balanced, "User2"));
        assert!(!class_fully_dispatched(&dispatched, &balanced, "User3"));

        let dispatched = two_worker_fleet(
            &[("User1", 4), ("User2", 0), ("User3", 0)],
            &[("User1", 4), ("User2", 0), ("User3", 0)],
        );
        assert!(class_fully_dispatched(&dispatched, &balanced, "User1"));
        assert!(!class_fully_dispatched(&dispatched, &balanced, "User2"));
        assert!(!class_fully_dispatched(&dispatched, &balanced, "User3"));
    }
}
