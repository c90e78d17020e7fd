//! Cache-group graph walks.
//!
//! Each hierarchy a cache group sits in is its own [`GroupGraph`]: one per
//! topology containing the group, plus the legacy parent/secondary-parent
//! forest. Hierarchies are walked separately and only the reached sets are
//! merged, so an edge from one topology never extends a path in another.
//! Walks are iterative three-colour DFS so a back edge is reported as a
//! cycle instead of looping, and the number of groups visited is bounded.

use crate::domain::entities::{CacheGroup, Topology};
use crate::domain::errors::GraphError;
use crate::domain::inventory::Inventory;
use crate::domain::value_objects::CacheGroupId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Which edges a walk follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Parent to child.
    Down,
    /// Child to parent.
    Up,
}

/// Directed cache-group graph with edges stored both ways.
#[derive(Clone, Debug, Default)]
pub struct GroupGraph {
    label: String,
    children: BTreeMap<CacheGroupId, BTreeSet<CacheGroupId>>,
    parents: BTreeMap<CacheGroupId, BTreeSet<CacheGroupId>>,
}

impl GroupGraph {
    /// An empty graph; `label` names it in errors.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Every hierarchy `cache_group` takes part in: the topologies it is
    /// placed in, in name order, followed by the legacy forest.
    pub fn hierarchies_of(
        inventory: &Inventory,
        cache_group: CacheGroupId,
    ) -> Result<Vec<Self>, GraphError> {
        let mut graphs = inventory
            .topologies_containing(cache_group)
            .map(Self::topology)
            .collect::<Result<Vec<_>, _>>()?;
        graphs.push(Self::legacy(inventory.cache_groups()));
        Ok(graphs)
    }

    /// Edges of a single topology.
    pub fn topology(topology: &Topology) -> Result<Self, GraphError> {
        let mut graph = Self::new(format!("topology '{}'", topology.name));
        graph.merge_topology(topology)?;
        Ok(graph)
    }

    /// Legacy parent forest only.
    pub fn legacy<'a>(groups: impl IntoIterator<Item = &'a CacheGroup>) -> Self {
        let mut graph = Self::new("legacy parent hierarchy");
        graph.merge_legacy(groups);
        graph
    }

    /// Name used in errors.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Add `parent -> child`.
    pub fn add_edge(&mut self, parent: CacheGroupId, child: CacheGroupId) {
        self.children.entry(parent).or_default().insert(child);
        self.parents.entry(child).or_default().insert(parent);
    }

    /// Add every node-to-parent edge of a topology.
    pub fn merge_topology(&mut self, topology: &Topology) -> Result<(), GraphError> {
        for (index, node) in topology.nodes.iter().enumerate() {
            for &parent in &node.parents {
                let parent_node =
                    topology
                        .nodes
                        .get(parent)
                        .ok_or_else(|| GraphError::DanglingParent {
                            topology: topology.name.clone(),
                            node: index,
                            parent,
                        })?;
                self.add_edge(parent_node.cache_group, node.cache_group);
            }
        }
        Ok(())
    }

    /// Add every legacy parent and secondary-parent edge.
    pub fn merge_legacy<'a>(&mut self, groups: impl IntoIterator<Item = &'a CacheGroup>) {
        for group in groups {
            for parent in group.legacy_parents() {
                self.add_edge(parent, group.id);
            }
        }
    }

    /// Direct neighbours in one direction.
    pub fn neighbours(&self, cache_group: CacheGroupId, direction: Direction) -> Vec<CacheGroupId> {
        let edges = match direction {
            Direction::Down => &self.children,
            Direction::Up => &self.parents,
        };
        edges
            .get(&cache_group)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.children.values().map(BTreeSet::len).sum()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    Grey,
    Black,
}

struct Frame {
    group: CacheGroupId,
    neighbours: Vec<CacheGroupId>,
    cursor: usize,
}

/// Groups reachable from `start` in `direction`, excluding `start`.
///
/// Fails with [`GraphError::Cycle`] on a back edge and with
/// [`GraphError::TooLarge`] once more than `max_groups` groups are reached.
pub fn reachable(
    graph: &GroupGraph,
    start: CacheGroupId,
    direction: Direction,
    max_groups: usize,
) -> Result<BTreeSet<CacheGroupId>, GraphError> {
    let mut colours: HashMap<CacheGroupId, Colour> = HashMap::new();
    let mut reached = BTreeSet::new();
    let mut stack = vec![Frame {
        group: start,
        neighbours: graph.neighbours(start, direction),
        cursor: 0,
    }];
    colours.insert(start, Colour::Grey);

    while let Some(frame) = stack.last_mut() {
        let Some(&next) = frame.neighbours.get(frame.cursor) else {
            let done = frame.group;
            stack.pop();
            colours.insert(done, Colour::Black);
            continue;
        };
        frame.cursor += 1;

        match colours.get(&next) {
            Some(Colour::Grey) => {
                return Err(GraphError::Cycle {
                    graph: graph.label().to_string(),
                    cache_group: next,
                });
            }
            Some(Colour::Black) => continue,
            None => {
                reached.insert(next);
                if reached.len() > max_groups {
                    return Err(GraphError::TooLarge {
                        graph: graph.label().to_string(),
                        max: max_groups,
                    });
                }
                colours.insert(next, Colour::Grey);
                stack.push(Frame {
                    group: next,
                    neighbours: graph.neighbours(next, direction),
                    cursor: 0,
                });
            }
        }
    }

    Ok(reached)
}

/// Union of the groups reached in each hierarchy of `cache_group`.
fn walk_hierarchies(
    inventory: &Inventory,
    cache_group: CacheGroupId,
    direction: Direction,
    max_groups: usize,
) -> Result<BTreeSet<CacheGroupId>, GraphError> {
    let mut reached = BTreeSet::new();
    for graph in GroupGraph::hierarchies_of(inventory, cache_group)? {
        reached.extend(reachable(&graph, cache_group, direction, max_groups)?);
    }
    Ok(reached)
}

/// Strict descendants of a cache group, unioned over its hierarchies.
pub fn descendant_groups(
    inventory: &Inventory,
    cache_group: CacheGroupId,
    max_groups: usize,
) -> Result<BTreeSet<CacheGroupId>, GraphError> {
    walk_hierarchies(inventory, cache_group, Direction::Down, max_groups)
}

/// Strict ancestors of a cache group, unioned over its hierarchies.
pub fn ancestor_groups(
    inventory: &Inventory,
    cache_group: CacheGroupId,
    max_groups: usize,
) -> Result<BTreeSet<CacheGroupId>, GraphError> {
    walk_hierarchies(inventory, cache_group, Direction::Up, max_groups)
}
