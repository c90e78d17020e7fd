//! Kahn's topological sort over topology nodes.
//!
//! Run when a topology is registered so a cyclic topology never reaches the
//! inventory. O(V + E).

use crate::domain::entities::Topology;
use crate::domain::errors::GraphError;
use std::collections::HashSet;

/// Node indices in parent-before-child order.
///
/// Returns [`GraphError::Cycle`] naming the cache group of the first node
/// left unscheduled, [`GraphError::DanglingParent`] for an out of range
/// parent index, or [`GraphError::DuplicateCacheGroup`] when a cache group
/// sits at two nodes.
pub fn topology_order(topology: &Topology) -> Result<Vec<usize>, GraphError> {
    let node_count = topology.nodes.len();

    // 0. One node per cache group
    let mut seen = HashSet::with_capacity(node_count);
    if let Some(repeated) = topology.cache_groups().find(|cg| !seen.insert(*cg)) {
        return Err(GraphError::DuplicateCacheGroup {
            topology: topology.name.clone(),
            cache_group: repeated,
        });
    }

    // 1. Build child adjacency and in-degrees
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree: Vec<usize> = vec![0; node_count];
    for (index, node) in topology.nodes.iter().enumerate() {
        for &parent in &node.parents {
            if parent >= node_count {
                return Err(GraphError::DanglingParent {
                    topology: topology.name.clone(),
                    node: index,
                    parent,
                });
            }
            children[parent].push(index);
            in_degree[index] += 1;
        }
    }

    // 2. Seed with roots, lowest index first
    let mut queue: Vec<usize> = (0..node_count).filter(|&i| in_degree[i] == 0).collect();
    queue.reverse();

    // 3. Drain
    let mut order = Vec::with_capacity(node_count);
    while let Some(node) = queue.pop() {
        order.push(node);
        for &child in &children[node] {
            in_degree[child] = in_degree[child].saturating_sub(1);
            if in_degree[child] == 0 {
                queue.push(child);
            }
        }
    }

    // 4. Anything left has a parent on a cycle
    if order.len() < node_count {
        let stuck = (0..node_count)
            .find(|&i| in_degree[i] > 0)
            .map(|i| topology.nodes[i].cache_group)
            .unwrap_or_default();
        return Err(GraphError::Cycle {
            graph: format!("topology '{}'", topology.name),
            cache_group: stuck,
        });
    }

    Ok(order)
}
