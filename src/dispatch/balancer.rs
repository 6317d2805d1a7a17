//! Even distribution of a target user mix across worker nodes

use crate::error::{DispatchError, DispatchResult};
use crate::types::{ClassMix, FleetSnapshot, WorkerId};

/// Distribute the target mix evenly across the ordered worker list.
///
/// Each class is dealt round-robin starting at the first worker: with `w`
/// workers and a class target of `n`, every worker receives `n / w` users of
/// the class and the first `n % w` workers take one extra. Classes with a
/// zero target keep their key on every worker. The plan depends only on the
/// ordered inputs.
pub fn balance_users(workers: &[WorkerId], target: &ClassMix) -> DispatchResult<FleetSnapshot> {
    if workers.is_empty() {
        return Err(DispatchError::EmptyWorkerSet);
    }

    let mut shares = vec![ClassMix::new(); workers.len()];
    for (class, count) in target.iter() {
        let base = count / workers.len();
        let remainder = count % workers.len();
        for (position, mix) in shares.iter_mut().enumerate() {
            mix.set(class.clone(), base + usize::from(position < remainder));
        }
    }

    Ok(workers.iter().cloned().zip(shares).collect())
}
