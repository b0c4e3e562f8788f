use std::collections::HashSet;

use crate::drive::Drive;

/// upper bound on parent lookups for a single check. ancestry deeper than
/// this is treated as outside the root
pub const MAX_LOOKUPS: usize = 512;

/// true if `id` is the root or has the root as a transitive parent.
///
/// walks the parent graph depth first with an explicit stack. every id is
/// visited at most once so cycles and diamonds terminate. a failed parent
/// lookup closes that branch, it is never retried.
pub async fn is_under_root(drive: &dyn Drive, id: &str, root: &str) -> bool {
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack = vec![id.to_owned()];
    let mut lookups = 0;

    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }

        if current == root {
            return true;
        }

        if lookups == MAX_LOOKUPS {
            tracing::warn!("containment check for {id} exceeded {MAX_LOOKUPS} lookups");

            return false;
        }

        lookups += 1;

        match drive.parents(&current).await {
            Ok(parents) => {
                for parent in parents.into_iter().rev() {
                    if !visited.contains(&parent) {
                        stack.push(parent);
                    }
                }
            }
            Err(err) => {
                tracing::debug!("parent lookup for {current} failed: {err}");
            }
        }
    }

    false
}
