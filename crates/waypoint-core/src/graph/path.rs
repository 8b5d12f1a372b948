//! Path result buffer.

use waypoint_common::types::{DocumentId, Value};

use super::GraphAccess;

/// One discovered path: vertices from start to end and the edges between them.
///
/// Once filled, `edges.len() == vertices.len() - 1`. The buffer is owned by
/// the block that runs the search and is cleared before every new search;
/// values handed out are rendered copies, never references into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResult {
    vertices: Vec<DocumentId>,
    edges: Vec<DocumentId>,
    weight: f64,
}

impl PathResult {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the path, keeping its allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.weight = 0.0;
    }

    /// Appends a vertex.
    pub fn add_vertex(&mut self, vertex: DocumentId) {
        self.vertices.push(vertex);
    }

    /// Appends an edge.
    pub fn add_edge(&mut self, edge: DocumentId) {
        self.edges.push(edge);
    }

    /// Sets the total weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Reverses a path that was collected from end to start.
    pub(crate) fn reverse(&mut self) {
        self.vertices.reverse();
        self.edges.reverse();
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn length(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if no path is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the total weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns the vertex identifiers in order.
    #[must_use]
    pub fn vertices(&self) -> &[DocumentId] {
        &self.vertices
    }

    /// Returns the edge identifiers in order.
    #[must_use]
    pub fn edges(&self) -> &[DocumentId] {
        &self.edges
    }

    /// Renders the document of the vertex at `pos`.
    ///
    /// Out-of-range positions and missing documents render as null.
    #[must_use]
    pub fn vertex_to_value(&self, graph: &dyn GraphAccess, pos: usize) -> Value {
        self.vertices
            .get(pos)
            .and_then(|id| graph.document(id))
            .unwrap_or(Value::Null)
    }

    /// Renders the document of the edge leading into the vertex at `pos`.
    ///
    /// The start vertex has no incoming edge, so `pos == 0` renders as null.
    #[must_use]
    pub fn edge_to_value(&self, graph: &dyn GraphAccess, pos: usize) -> Value {
        pos.checked_sub(1)
            .and_then(|idx| self.edges.get(idx))
            .and_then(|id| graph.document(id))
            .unwrap_or(Value::Null)
    }
}
