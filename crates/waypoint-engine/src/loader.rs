//! Loads graphs from JSON documents.
//!
//! The format groups documents by collection:
//!
//! ```json
//! {
//!   "vertices": { "cities": [ { "_key": "berlin" }, { "_key": "rome" } ] },
//!   "edges": { "roads": [ { "_from": "cities/berlin", "_to": "cities/rome", "km": 1500 } ] }
//! }
//! ```
//!
//! Vertex collections are created before edge collections, so an edge may
//! point at any vertex in the file.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use waypoint_common::types::{DocumentId, Value};
use waypoint_common::utils::error::{Error, Result};
use waypoint_core::MemoryGraph;
use waypoint_core::graph::{FROM_ATTRIBUTE, KEY_ATTRIBUTE, TO_ATTRIBUTE};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GraphFile {
    vertices: IndexMap<String, Vec<Value>>,
    edges: IndexMap<String, Vec<Value>>,
}

/// Builds a graph from a JSON string.
///
/// # Errors
///
/// Returns `Error::Json` for malformed JSON and `Error::Load` for documents
/// the graph rejects.
pub fn load_graph_str(json: &str) -> Result<MemoryGraph> {
    let file: GraphFile = serde_json::from_str(json)?;
    let graph = MemoryGraph::new();

    for (name, docs) in &file.vertices {
        graph.create_vertex_collection(name).map_err(load_error)?;
        for doc in docs {
            graph
                .insert_vertex(name, key_of(doc), doc.clone())
                .map_err(load_error)?;
        }
    }

    for (name, docs) in &file.edges {
        graph.create_edge_collection(name).map_err(load_error)?;
        for (i, doc) in docs.iter().enumerate() {
            let from = endpoint(doc, FROM_ATTRIBUTE, name, i)?;
            let to = endpoint(doc, TO_ATTRIBUTE, name, i)?;
            graph
                .insert_edge(name, key_of(doc), &from, &to, doc.clone())
                .map_err(load_error)?;
        }
    }

    tracing::info!(
        vertex_collections = file.vertices.len(),
        edge_collections = file.edges.len(),
        "graph loaded"
    );
    Ok(graph)
}

/// Builds a graph from a JSON file.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read, otherwise as
/// [`load_graph_str`].
pub fn load_graph(path: impl AsRef<Path>) -> Result<MemoryGraph> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading graph");
    let json = std::fs::read_to_string(path)?;
    load_graph_str(&json)
}

fn key_of(doc: &Value) -> Option<&str> {
    doc.get(KEY_ATTRIBUTE).and_then(Value::as_str)
}

fn endpoint(doc: &Value, attribute: &str, collection: &str, index: usize) -> Result<DocumentId> {
    let raw = doc.get(attribute).and_then(Value::as_str).ok_or_else(|| {
        Error::Load(format!("edge {index} in '{collection}' has no string {attribute}"))
    })?;
    DocumentId::parse(raw)
        .map_err(|e| Error::Load(format!("edge {index} in '{collection}': {attribute}: {e}")))
}

fn load_error(err: impl std::fmt::Display) -> Error {
    Error::Load(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::graph::GraphAccess;

    const CITIES: &str = r#"{
        "vertices": {"cities": [{"_key": "berlin", "pop": 3.6}, {"_key": "rome"}, {}]},
        "edges": {"roads": [
            {"_key": "r1", "_from": "cities/berlin", "_to": "cities/rome", "km": 1500}
        ]}
    }"#;

    #[test]
    fn test_load_str() {
        let graph = load_graph_str(CITIES).unwrap();
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        let berlin = graph.document(&DocumentId::parse("cities/berlin").unwrap()).unwrap();
        assert_eq!(berlin.get("pop"), Some(&Value::Float64(3.6)));
        let road = graph.document(&DocumentId::parse("roads/r1").unwrap()).unwrap();
        assert_eq!(road.get("_to").and_then(Value::as_str), Some("cities/rome"));
        assert_eq!(graph.is_edge_collection("roads"), Some(true));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, CITIES).unwrap();
        assert_eq!(load_graph(&path).unwrap().vertex_count(), 3);
        assert!(matches!(load_graph(dir.path().join("none.json")), Err(Error::Io(_))));
    }

    #[test]
    fn test_rejects_bad_edges() {
        let missing = r#"{"vertices": {"v": [{"_key": "a"}]}, "edges": {"e": [{"_from": "v/a"}]}}"#;
        assert!(matches!(load_graph_str(missing), Err(Error::Load(msg)) if msg.contains("_to")));

        let malformed = r#"{"edges": {"e": [{"_from": "v/a", "_to": "nope"}]}}"#;
        assert!(matches!(load_graph_str(malformed), Err(Error::Load(_))));
    }

    #[test]
    fn test_rejects_duplicates_and_unknown_sections() {
        let dup = r#"{"vertices": {"v": [{"_key": "a"}, {"_key": "a"}]}}"#;
        assert!(matches!(load_graph_str(dup), Err(Error::Load(_))));
        assert!(matches!(load_graph_str(r#"{"nodes": {}}"#), Err(Error::Json(_))));
    }
}
