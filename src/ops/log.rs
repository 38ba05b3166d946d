use std::collections::HashSet;

use crate::error::Result;
use crate::hash::ObjectId;
use crate::object::read_commit;
use crate::repo::Repository;

/// graphviz edges `c_<sha> -> c_<parent>;` for every parent link reachable
/// from `start`; the caller wraps them in a `digraph` block
pub fn log_edges(repo: &Repository, start: ObjectId) -> Result<Vec<String>> {
    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let commit = read_commit(repo, &id)?;
        for parent in commit.parents()? {
            edges.push(format!("c_{} -> c_{};", id, parent));
            stack.push(parent);
        }
    }
    Ok(edges)
}
