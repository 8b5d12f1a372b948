//! Graph access for path search.
//!
//! The execution layer never talks to storage directly. Everything it needs
//! goes through [`GraphAccess`]: document lookup, adjacency, edge collection
//! resolution and identifier extraction.
//!
//! - [`MemoryGraph`] - In-memory document graph
//! - [`EdgeCollectionInfo`] - A resolved edge collection with weight settings
//! - [`PathResult`] - Reusable buffer for one discovered path
//! - [`ShortestPathFinder`] - Constant- or attribute-weighted search

mod collection;
mod finder;
mod memory;
mod path;

pub use collection::{EdgeCollectionInfo, Neighbor};
pub use finder::{ShortestPathFinder, ShortestPathOptions};
pub use memory::{CollectionKind, CollectionStats, MemoryGraph};
pub use path::PathResult;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use waypoint_common::types::{DocumentId, IdError, Value};

/// Attribute holding a document's identifier.
pub const ID_ATTRIBUTE: &str = "_id";
/// Attribute holding a document's key.
pub const KEY_ATTRIBUTE: &str = "_key";
/// Attribute holding an edge's source vertex.
pub const FROM_ATTRIBUTE: &str = "_from";
/// Attribute holding an edge's target vertex.
pub const TO_ATTRIBUTE: &str = "_to";

/// Direction to follow edges in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// From `_from` to `_to`.
    #[default]
    Outbound,
    /// From `_to` to `_from`.
    Inbound,
    /// Both ways.
    Any,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
            Direction::Any => "any",
        })
    }
}

impl FromStr for Direction {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outbound" | "out" => Ok(Direction::Outbound),
            "inbound" | "in" => Ok(Direction::Inbound),
            "any" | "both" => Ok(Direction::Any),
            _ => Err(GraphError::InvalidDirection(s.to_string())),
        }
    }
}

/// Error raised by graph construction and collection resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// No collection of that name exists.
    #[error("collection '{0}' not found")]
    UnknownCollection(String),
    /// The collection exists but is of the other kind.
    #[error("collection '{name}' is not {expected} collection")]
    WrongCollectionKind {
        /// Collection name.
        name: String,
        /// "a vertex" or "an edge".
        expected: &'static str,
    },
    /// A collection of that name already exists.
    #[error("collection '{0}' already exists")]
    DuplicateCollection(String),
    /// A document with that identifier already exists.
    #[error("document '{0}' already exists")]
    DuplicateKey(String),
    /// A malformed document identifier.
    #[error(transparent)]
    InvalidId(#[from] IdError),
    /// A document body that is not an object.
    #[error("document must be an object, got {0}")]
    NotAnObject(&'static str),
    /// An edge document without `_from` or `_to`.
    #[error("edge document is missing '{0}'")]
    MissingEndpoint(&'static str),
    /// An unusable default weight.
    #[error("invalid default weight {0}")]
    InvalidWeight(f64),
    /// An unknown direction name.
    #[error("invalid direction '{0}', expected outbound, inbound or any")]
    InvalidDirection(String),
}

/// Error raised when a document value carries no usable identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The value is not a document.
    #[error("expected an object, got {0}")]
    NotAnObject(&'static str),
    /// The document has no string `_id` attribute.
    #[error("document has no '_id' attribute")]
    MissingId,
    /// The `_id` attribute is malformed.
    #[error(transparent)]
    InvalidId(#[from] IdError),
}

/// One edge adjacent to a vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacentEdge {
    /// The edge document's identifier.
    pub edge: DocumentId,
    /// The vertex at the other end.
    pub vertex: DocumentId,
}

/// Read access to a document graph.
pub trait GraphAccess: Send + Sync {
    /// Returns the document with the given identifier.
    fn document(&self, id: &DocumentId) -> Option<Value>;

    /// Returns whether `name` is an edge collection, or `None` if it does not exist.
    fn is_edge_collection(&self, name: &str) -> Option<bool>;

    /// Appends the edges of `collection` adjacent to `vertex` in `direction`.
    fn edges(&self, collection: &str, vertex: &DocumentId, direction: Direction, out: &mut Vec<AdjacentEdge>);

    /// Resolves an edge collection for path search.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is missing, is not an edge
    /// collection, or the default weight is negative or NaN.
    fn resolve_edge_collection(
        &self,
        name: &str,
        direction: Direction,
        weight_attribute: Option<Arc<str>>,
        default_weight: f64,
    ) -> Result<EdgeCollectionInfo, GraphError> {
        match self.is_edge_collection(name) {
            None => return Err(GraphError::UnknownCollection(name.to_string())),
            Some(false) => {
                return Err(GraphError::WrongCollectionKind {
                    name: name.to_string(),
                    expected: "an edge",
                });
            }
            Some(true) => {}
        }
        if default_weight.is_nan() || default_weight < 0.0 {
            return Err(GraphError::InvalidWeight(default_weight));
        }
        Ok(EdgeCollectionInfo::new(name, direction, weight_attribute, default_weight))
    }

    /// Reads the identifier of a document value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or has no valid `_id`.
    fn extract_identifier(&self, document: &Value) -> Result<DocumentId, ExtractionError> {
        let Some(map) = document.as_object() else {
            return Err(ExtractionError::NotAnObject(document.type_name()));
        };
        let id = map
            .get(ID_ATTRIBUTE)
            .and_then(Value::as_str)
            .ok_or(ExtractionError::MissingId)?;
        Ok(DocumentId::parse(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!("OUTBOUND".parse::<Direction>(), Ok(Direction::Outbound));
        assert_eq!("in".parse::<Direction>(), Ok(Direction::Inbound));
        assert_eq!("any".parse::<Direction>(), Ok(Direction::Any));
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::Any.to_string(), "any");
    }

    #[test]
    fn test_extract_identifier() {
        let graph = MemoryGraph::new();
        let doc = Value::object([("_id", "persons/alice")]);
        assert_eq!(
            graph.extract_identifier(&doc).unwrap().as_str(),
            "persons/alice"
        );
        assert_eq!(
            graph.extract_identifier(&Value::object([("_key", "alice")])),
            Err(ExtractionError::MissingId)
        );
        assert_eq!(
            graph.extract_identifier(&Value::from(3i64)),
            Err(ExtractionError::NotAnObject("number"))
        );
        assert!(matches!(
            graph.extract_identifier(&Value::object([("_id", "alice")])),
            Err(ExtractionError::InvalidId(_))
        ));
    }

    #[test]
    fn test_resolve_edge_collection() {
        let graph = MemoryGraph::new();
        graph.create_vertex_collection("persons").unwrap();
        graph.create_edge_collection("knows").unwrap();

        let info = graph
            .resolve_edge_collection("knows", Direction::Any, Some("w".into()), 2.0)
            .unwrap();
        assert_eq!(info.name(), "knows");
        assert_eq!(info.direction(), Direction::Any);

        assert_eq!(
            graph.resolve_edge_collection("nope", Direction::Outbound, None, 1.0),
            Err(GraphError::UnknownCollection("nope".into()))
        );
        assert!(matches!(
            graph.resolve_edge_collection("persons", Direction::Outbound, None, 1.0),
            Err(GraphError::WrongCollectionKind { .. })
        ));
        assert_eq!(
            graph.resolve_edge_collection("knows", Direction::Outbound, None, -1.0),
            Err(GraphError::InvalidWeight(-1.0))
        );
    }
}
