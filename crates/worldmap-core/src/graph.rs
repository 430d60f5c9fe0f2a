use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::entity::{AdjacencyKind, Province};
use crate::id::EntityId;

// ---------------------------------------------------------------------------
// Province adjacency graph
// ---------------------------------------------------------------------------

/// Undirected adjacency between provinces, impassable borders excluded.
///
/// Built once per province load and shared by every consumer that needs
/// reachability (supply-area contiguity).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvinceGraph {
    neighbours: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl ProvinceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the edges stored on each province.
    pub fn from_provinces<'a>(provinces: impl IntoIterator<Item = &'a Province>) -> Self {
        let mut graph = Self::new();
        for province in provinces {
            for edge in &province.edges {
                graph.connect(province.id, edge.to, edge.kind);
            }
        }
        graph
    }

    /// Build from bare `(from, to, kind)` triples.
    pub fn from_edges(edges: impl IntoIterator<Item = (EntityId, EntityId, AdjacencyKind)>) -> Self {
        let mut graph = Self::new();
        for (from, to, kind) in edges {
            graph.connect(from, to, kind);
        }
        graph
    }

    /// Record an adjacency in both directions. Impassable and self edges are
    /// ignored.
    pub fn connect(&mut self, a: EntityId, b: EntityId, kind: AdjacencyKind) {
        if kind == AdjacencyKind::Impassable || a == b {
            return;
        }
        self.neighbours.entry(a).or_default().insert(b);
        self.neighbours.entry(b).or_default().insert(a);
    }

    pub fn is_adjacent(&self, a: EntityId, b: EntityId) -> bool {
        self.neighbours.get(&a).is_some_and(|n| n.contains(&b))
    }

    pub fn neighbours(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.neighbours.get(&id).into_iter().flatten().copied()
    }

    /// Number of undirected passable edges.
    pub fn edge_count(&self) -> usize {
        self.neighbours.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

// ---------------------------------------------------------------------------
// Contiguity
// ---------------------------------------------------------------------------

/// Checks that a set of composite members forms one connected component.
///
/// Each member is `(member_id, leaf_province_ids)`. Two members are linked
/// when any province of one is adjacent to any province of the other. The
/// traversal starts at the first member.
///
/// Returns `None` when every member is reachable (trivially so for fewer
/// than two members), otherwise `(reached, unreached)`: the starting member
/// and the first member in input order that could not be reached.
pub fn check_contiguous(
    members: &[(EntityId, Vec<EntityId>)],
    graph: &ProvinceGraph,
) -> Option<(EntityId, EntityId)> {
    if members.len() < 2 {
        return None;
    }

    let linked = |a: &[EntityId], b: &[EntityId]| {
        a.iter()
            .any(|&p| b.iter().any(|&q| p != q && graph.is_adjacent(p, q)))
    };

    let mut visited = vec![false; members.len()];
    let mut queue = VecDeque::new();
    visited[0] = true;
    queue.push_back(0usize);

    while let Some(current) = queue.pop_front() {
        for (next, (_, provinces)) in members.iter().enumerate() {
            if visited[next] {
                continue;
            }
            if linked(&members[current].1, provinces) {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }

    visited
        .iter()
        .position(|v| !v)
        .map(|unreached| (members[0].0, members[unreached].0))
}
