//! Shortest path search.
//!
//! Two strategies share one call contract:
//!
//! - constant weight: breadth-first search, every edge costs the same
//! - attribute weight: Dijkstra over weights read from edge documents
//!
//! The strategy is fixed when the finder is built, from whether a weight
//! attribute is configured. Both poll a cancellation callback before
//! expanding each vertex and abort with its error.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use waypoint_common::types::DocumentId;

use super::{Direction, EdgeCollectionInfo, GraphAccess, GraphError, Neighbor, PathResult};
use crate::execution::blocks::BlockError;

/// Weight configuration of a path search.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPathOptions {
    /// Edge attribute holding the weight; `None` weighs every edge the same.
    pub weight_attribute: Option<Arc<str>>,
    /// Weight of edges without a usable weight attribute.
    pub default_weight: f64,
}

impl ShortestPathOptions {
    /// Returns true if edges are weighted by an attribute.
    #[must_use]
    pub fn uses_weight(&self) -> bool {
        self.weight_attribute.is_some()
    }
}

impl Default for ShortestPathOptions {
    fn default() -> Self {
        Self {
            weight_attribute: None,
            default_weight: 1.0,
        }
    }
}

/// Predecessor of a vertex on the search tree: previous vertex and the edge
/// leading from it.
type Predecessors = HashMap<DocumentId, (DocumentId, DocumentId)>;

/// Shortest path search over a set of edge collections.
#[derive(Debug, Clone)]
pub enum ShortestPathFinder {
    /// Breadth-first search; path weight is the edge count.
    ConstantWeight {
        /// Collections to follow.
        collections: Vec<EdgeCollectionInfo>,
    },
    /// Dijkstra over edge weights.
    AttributeWeight {
        /// Collections to follow.
        collections: Vec<EdgeCollectionInfo>,
    },
}

impl ShortestPathFinder {
    /// Picks the strategy matching `options`.
    #[must_use]
    pub fn new(options: &ShortestPathOptions, collections: Vec<EdgeCollectionInfo>) -> Self {
        if options.uses_weight() {
            ShortestPathFinder::AttributeWeight { collections }
        } else {
            ShortestPathFinder::ConstantWeight { collections }
        }
    }

    /// Resolves the named edge collections against `graph` and builds a finder.
    ///
    /// # Errors
    ///
    /// Returns the first collection that fails to resolve.
    pub fn resolve(
        graph: &dyn GraphAccess,
        options: &ShortestPathOptions,
        collections: &[(String, Direction)],
    ) -> Result<Self, GraphError> {
        let infos = collections
            .iter()
            .map(|(name, direction)| {
                graph.resolve_edge_collection(
                    name,
                    *direction,
                    options.weight_attribute.clone(),
                    options.default_weight,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(options, infos))
    }

    /// Returns the collections searched.
    #[must_use]
    pub fn collections(&self) -> &[EdgeCollectionInfo] {
        match self {
            ShortestPathFinder::ConstantWeight { collections }
            | ShortestPathFinder::AttributeWeight { collections } => collections,
        }
    }

    /// Returns the strategy name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ShortestPathFinder::ConstantWeight { .. } => "constant-weight",
            ShortestPathFinder::AttributeWeight { .. } => "attribute-weight",
        }
    }

    /// Searches a path from `start` to `end` into `result`.
    ///
    /// Returns `Ok(false)` when no path exists. `result` is cleared first and
    /// only holds a path after `Ok(true)`.
    ///
    /// # Errors
    ///
    /// Returns the error of `check` if it fails; the search stops at once.
    pub fn shortest_path(
        &self,
        graph: &dyn GraphAccess,
        start: &DocumentId,
        end: &DocumentId,
        result: &mut PathResult,
        check: &mut dyn FnMut() -> Result<(), BlockError>,
    ) -> Result<bool, BlockError> {
        result.clear();
        match self {
            ShortestPathFinder::ConstantWeight { collections } => {
                breadth_first(graph, collections, start, end, result, check)
            }
            ShortestPathFinder::AttributeWeight { collections } => {
                dijkstra(graph, collections, start, end, result, check)
            }
        }
    }
}

fn expand(
    graph: &dyn GraphAccess,
    collections: &[EdgeCollectionInfo],
    vertex: &DocumentId,
    scratch: &mut Vec<super::AdjacentEdge>,
    out: &mut Vec<Neighbor>,
) {
    out.clear();
    for info in collections {
        info.neighbors(graph, vertex, scratch, out);
    }
}

fn breadth_first(
    graph: &dyn GraphAccess,
    collections: &[EdgeCollectionInfo],
    start: &DocumentId,
    end: &DocumentId,
    result: &mut PathResult,
    check: &mut dyn FnMut() -> Result<(), BlockError>,
) -> Result<bool, BlockError> {
    if start == end {
        result.add_vertex(start.clone());
        return Ok(true);
    }

    let mut predecessors = Predecessors::new();
    let mut visited: HashSet<DocumentId> = HashSet::new();
    visited.insert(start.clone());
    let mut queue = VecDeque::from([start.clone()]);
    let mut scratch = Vec::new();
    let mut neighbors = Vec::new();

    while let Some(vertex) = queue.pop_front() {
        check()?;
        expand(graph, collections, &vertex, &mut scratch, &mut neighbors);
        for neighbor in neighbors.drain(..) {
            if !visited.insert(neighbor.vertex.clone()) {
                continue;
            }
            let found = neighbor.vertex == *end;
            predecessors.insert(neighbor.vertex.clone(), (vertex.clone(), neighbor.edge));
            if found {
                build_path(&predecessors, start, end, result)?;
                result.set_weight(result.length() as f64);
                return Ok(true);
            }
            queue.push_back(neighbor.vertex);
        }
    }
    Ok(false)
}

/// Priority queue entry; lower cost pops first.
#[derive(Debug, Clone, PartialEq)]
struct QueueEntry {
    cost: f64,
    vertex: DocumentId,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

fn dijkstra(
    graph: &dyn GraphAccess,
    collections: &[EdgeCollectionInfo],
    start: &DocumentId,
    end: &DocumentId,
    result: &mut PathResult,
    check: &mut dyn FnMut() -> Result<(), BlockError>,
) -> Result<bool, BlockError> {
    let mut predecessors = Predecessors::new();
    let mut distances: HashMap<DocumentId, f64> = HashMap::new();
    let mut settled: HashSet<DocumentId> = HashSet::new();
    let mut heap = BinaryHeap::new();
    let mut scratch = Vec::new();
    let mut neighbors = Vec::new();

    distances.insert(start.clone(), 0.0);
    heap.push(QueueEntry {
        cost: 0.0,
        vertex: start.clone(),
    });

    while let Some(QueueEntry { cost, vertex }) = heap.pop() {
        if vertex == *end {
            build_path(&predecessors, start, end, result)?;
            result.set_weight(cost);
            return Ok(true);
        }
        if !settled.insert(vertex.clone()) {
            // stale entry
            continue;
        }
        check()?;
        expand(graph, collections, &vertex, &mut scratch, &mut neighbors);
        for neighbor in neighbors.drain(..) {
            if settled.contains(&neighbor.vertex) {
                continue;
            }
            let next = cost + neighbor.weight;
            if distances.get(&neighbor.vertex).is_none_or(|known| next < *known) {
                distances.insert(neighbor.vertex.clone(), next);
                predecessors.insert(neighbor.vertex.clone(), (vertex.clone(), neighbor.edge));
                heap.push(QueueEntry {
                    cost: next,
                    vertex: neighbor.vertex,
                });
            }
        }
    }
    Ok(false)
}

fn build_path(
    predecessors: &Predecessors,
    start: &DocumentId,
    end: &DocumentId,
    result: &mut PathResult,
) -> Result<(), BlockError> {
    let mut current = end;
    result.add_vertex(end.clone());
    while current != start {
        let Some((previous, edge)) = predecessors.get(current) else {
            return Err(BlockError::Internal(format!(
                "search tree has no predecessor for '{current}'"
            )));
        };
        result.add_edge(edge.clone());
        result.add_vertex(previous.clone());
        current = previous;
    }
    result.reverse();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use waypoint_common::types::Value;

    fn id(s: &str) -> DocumentId {
        DocumentId::parse(s).unwrap()
    }

    /// a -> b -> c -> d with a heavy shortcut a -> d.
    fn diamond() -> MemoryGraph {
        let graph = MemoryGraph::new();
        graph.create_vertex_collection("v").unwrap();
        graph.create_edge_collection("e").unwrap();
        for key in ["a", "b", "c", "d", "x"] {
            graph.insert_vertex("v", Some(key), Value::Null).unwrap();
        }
        for (key, from, to, w) in [
            ("ab", "v/a", "v/b", 1.0),
            ("bc", "v/b", "v/c", 1.0),
            ("cd", "v/c", "v/d", 1.0),
            ("ad", "v/a", "v/d", 10.0),
        ] {
            graph
                .insert_edge("e", Some(key), &id(from), &id(to), Value::object([("w", w)]))
                .unwrap();
        }
        graph
    }

    fn finder(graph: &MemoryGraph, weight: Option<&str>, direction: Direction) -> ShortestPathFinder {
        let options = ShortestPathOptions {
            weight_attribute: weight.map(Into::into),
            default_weight: 1.0,
        };
        ShortestPathFinder::resolve(graph, &options, &[("e".to_string(), direction)]).unwrap()
    }

    fn no_check() -> Result<(), BlockError> {
        Ok(())
    }

    #[test]
    fn test_strategy_selection() {
        let graph = diamond();
        assert!(matches!(
            finder(&graph, None, Direction::Outbound),
            ShortestPathFinder::ConstantWeight { .. }
        ));
        assert_eq!(finder(&graph, Some("w"), Direction::Outbound).name(), "attribute-weight");
    }

    #[test]
    fn test_bfs_takes_fewest_edges() {
        let graph = diamond();
        let mut path = PathResult::new();
        let found = finder(&graph, None, Direction::Outbound)
            .shortest_path(&graph, &id("v/a"), &id("v/d"), &mut path, &mut no_check)
            .unwrap();
        assert!(found);
        assert_eq!(path.vertices(), &[id("v/a"), id("v/d")]);
        assert_eq!(path.edges(), &[id("e/ad")]);
        assert_eq!(path.weight(), 1.0);
    }

    #[test]
    fn test_dijkstra_takes_lightest_path() {
        let graph = diamond();
        let mut path = PathResult::new();
        let found = finder(&graph, Some("w"), Direction::Outbound)
            .shortest_path(&graph, &id("v/a"), &id("v/d"), &mut path, &mut no_check)
            .unwrap();
        assert!(found);
        assert_eq!(path.length(), 3);
        assert_eq!(path.edges(), &[id("e/ab"), id("e/bc"), id("e/cd")]);
        assert_eq!(path.weight(), 3.0);
    }

    #[test]
    fn test_direction_is_respected() {
        let graph = diamond();
        let mut path = PathResult::new();
        let outbound = finder(&graph, None, Direction::Outbound);
        assert!(!outbound
            .shortest_path(&graph, &id("v/d"), &id("v/a"), &mut path, &mut no_check)
            .unwrap());
        assert!(path.is_empty());

        let inbound = finder(&graph, None, Direction::Inbound);
        assert!(inbound
            .shortest_path(&graph, &id("v/d"), &id("v/a"), &mut path, &mut no_check)
            .unwrap());
        assert_eq!(path.vertices(), &[id("v/d"), id("v/a")]);

        let any = finder(&graph, Some("w"), Direction::Any);
        assert!(any
            .shortest_path(&graph, &id("v/c"), &id("v/a"), &mut path, &mut no_check)
            .unwrap());
        assert_eq!(path.vertices(), &[id("v/c"), id("v/b"), id("v/a")]);
    }

    #[test]
    fn test_start_equals_end() {
        let graph = diamond();
        for weight in [None, Some("w")] {
            let mut path = PathResult::new();
            assert!(finder(&graph, weight, Direction::Outbound)
                .shortest_path(&graph, &id("v/b"), &id("v/b"), &mut path, &mut no_check)
                .unwrap());
            assert_eq!(path.vertex_count(), 1);
            assert_eq!(path.length(), 0);
        }
    }

    #[test]
    fn test_unreachable() {
        let graph = diamond();
        for weight in [None, Some("w")] {
            let mut path = PathResult::new();
            assert!(!finder(&graph, weight, Direction::Any)
                .shortest_path(&graph, &id("v/a"), &id("v/x"), &mut path, &mut no_check)
                .unwrap());
        }
    }

    #[test]
    fn test_cancellation_aborts() {
        let graph = diamond();
        for weight in [None, Some("w")] {
            let mut path = PathResult::new();
            let mut polls = 0;
            let mut check = || {
                polls += 1;
                if polls > 1 { Err(BlockError::Killed) } else { Ok(()) }
            };
            let err = finder(&graph, weight, Direction::Outbound)
                .shortest_path(&graph, &id("v/a"), &id("v/x"), &mut path, &mut check)
                .unwrap_err();
            assert_eq!(err, BlockError::Killed);
            assert!(path.is_empty());
        }
    }

    #[test]
    fn test_result_is_cleared_between_searches() {
        let graph = diamond();
        let finder = finder(&graph, None, Direction::Outbound);
        let mut path = PathResult::new();
        finder
            .shortest_path(&graph, &id("v/a"), &id("v/c"), &mut path, &mut no_check)
            .unwrap();
        assert_eq!(path.length(), 2);
        finder
            .shortest_path(&graph, &id("v/c"), &id("v/d"), &mut path, &mut no_check)
            .unwrap();
        assert_eq!(path.vertices(), &[id("v/c"), id("v/d")]);
    }
}
