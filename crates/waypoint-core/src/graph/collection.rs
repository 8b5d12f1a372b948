//! Resolved edge collections.

use std::sync::Arc;

use waypoint_common::types::{DocumentId, Value};

use super::{AdjacentEdge, Direction, GraphAccess};

/// A neighbour reached over one weighted edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// The edge followed.
    pub edge: DocumentId,
    /// The vertex reached.
    pub vertex: DocumentId,
    /// Cost of following the edge.
    pub weight: f64,
}

/// An edge collection as used by path search: name, direction to follow and
/// how to weigh its edges.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCollectionInfo {
    name: Arc<str>,
    direction: Direction,
    weight_attribute: Option<Arc<str>>,
    default_weight: f64,
}

impl EdgeCollectionInfo {
    pub(crate) fn new(
        name: &str,
        direction: Direction,
        weight_attribute: Option<Arc<str>>,
        default_weight: f64,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            weight_attribute,
            default_weight,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the direction edges are followed in.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the attribute edge weights are read from, if any.
    #[must_use]
    pub fn weight_attribute(&self) -> Option<&str> {
        self.weight_attribute.as_deref()
    }

    /// Returns the weight of edges without a usable weight attribute.
    #[must_use]
    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Returns the weight of an edge document.
    ///
    /// Missing, non-numeric, negative and NaN attributes fall back to the
    /// default weight.
    #[must_use]
    pub fn weight_of(&self, edge: Option<&Value>) -> f64 {
        let Some(attribute) = self.weight_attribute.as_deref() else {
            return self.default_weight;
        };
        edge.and_then(|doc| doc.get(attribute))
            .and_then(Value::as_number)
            .filter(|w| *w >= 0.0)
            .unwrap_or(self.default_weight)
    }

    /// Appends the neighbours of `vertex` reachable over this collection.
    ///
    /// `scratch` is reused between calls to avoid reallocating.
    pub fn neighbors(
        &self,
        graph: &dyn GraphAccess,
        vertex: &DocumentId,
        scratch: &mut Vec<AdjacentEdge>,
        out: &mut Vec<Neighbor>,
    ) {
        scratch.clear();
        graph.edges(&self.name, vertex, self.direction, scratch);
        for adjacent in scratch.drain(..) {
            let weight = if self.weight_attribute.is_some() {
                self.weight_of(graph.document(&adjacent.edge).as_ref())
            } else {
                self.default_weight
            };
            out.push(Neighbor {
                edge: adjacent.edge,
                vertex: adjacent.vertex,
                weight,
            });
        }
    }
}
