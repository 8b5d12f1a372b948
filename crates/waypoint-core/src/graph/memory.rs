//! In-memory document graph.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use waypoint_common::types::{DocumentId, Value};

use super::{
    AdjacentEdge, Direction, FROM_ATTRIBUTE, GraphAccess, GraphError, ID_ATTRIBUTE, KEY_ATTRIBUTE,
    TO_ATTRIBUTE,
};

/// Kind of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Holds vertex documents.
    Vertex,
    /// Holds edge documents with `_from`/`_to`.
    Edge,
}

impl CollectionKind {
    fn article(self) -> &'static str {
        match self {
            CollectionKind::Vertex => "a vertex",
            CollectionKind::Edge => "an edge",
        }
    }
}

/// Name, kind and size of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Collection kind.
    pub kind: CollectionKind,
    /// Number of documents.
    pub count: usize,
}

#[derive(Debug, Default)]
struct Adjacency {
    outgoing: SmallVec<[AdjacentEdge; 4]>,
    incoming: SmallVec<[AdjacentEdge; 4]>,
}

#[derive(Debug)]
struct CollectionMeta {
    kind: CollectionKind,
    count: usize,
}

/// A graph of JSON-like documents held in memory.
///
/// Documents live in named vertex and edge collections and are addressed by
/// `collection/key` identifiers. Every edge collection keeps forward and
/// backward adjacency per vertex.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    /// Collection name to kind and size.
    collections: RwLock<HashMap<Arc<str>, CollectionMeta>>,

    /// All documents by identifier.
    documents: RwLock<HashMap<DocumentId, Value>>,

    /// Edge collection name to per-vertex adjacency.
    adjacency: RwLock<HashMap<Arc<str>, HashMap<DocumentId, Adjacency>>>,

    /// Counter for generated keys.
    next_key: AtomicU64,
}

impl MemoryGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Collections ===

    /// Creates a vertex collection.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection of that name exists.
    pub fn create_vertex_collection(&self, name: &str) -> Result<(), GraphError> {
        self.create_collection(name, CollectionKind::Vertex)
    }

    /// Creates an edge collection.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection of that name exists.
    pub fn create_edge_collection(&self, name: &str) -> Result<(), GraphError> {
        self.create_collection(name, CollectionKind::Edge)?;
        self.adjacency.write().insert(name.into(), HashMap::new());
        Ok(())
    }

    fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), GraphError> {
        if name.is_empty() || name.contains(DocumentId::SEPARATOR) {
            return Err(GraphError::InvalidId(
                waypoint_common::IdError::EmptyComponent(name.to_string()),
            ));
        }
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(GraphError::DuplicateCollection(name.to_string()));
        }
        collections.insert(name.into(), CollectionMeta { kind, count: 0 });
        Ok(())
    }

    /// Returns every collection, sorted by name.
    #[must_use]
    pub fn collections(&self) -> Vec<CollectionStats> {
        let mut stats: Vec<CollectionStats> = self
            .collections
            .read()
            .iter()
            .map(|(name, meta)| CollectionStats {
                name: name.to_string(),
                kind: meta.kind,
                count: meta.count,
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    fn check_kind(&self, name: &str, kind: CollectionKind) -> Result<(), GraphError> {
        match self.collections.read().get(name) {
            None => Err(GraphError::UnknownCollection(name.to_string())),
            Some(meta) if meta.kind != kind => Err(GraphError::WrongCollectionKind {
                name: name.to_string(),
                expected: kind.article(),
            }),
            Some(_) => Ok(()),
        }
    }

    // === Documents ===

    /// Inserts a vertex document and returns its identifier.
    ///
    /// The key is taken from `key`, else from the document's `_key`, else
    /// generated. `attributes` may be null for an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not a vertex collection, the
    /// document is not an object, or the key is taken.
    pub fn insert_vertex(
        &self,
        collection: &str,
        key: Option<&str>,
        attributes: Value,
    ) -> Result<DocumentId, GraphError> {
        self.check_kind(collection, CollectionKind::Vertex)?;
        let (id, mut entries) = self.prepare(collection, key, &attributes)?;
        entries.extend(user_attributes(&attributes));
        self.store(collection, &id, entries)?;
        Ok(id)
    }

    /// Inserts an edge document from `from` to `to` and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not an edge collection, the
    /// document is not an object, or the key is taken.
    pub fn insert_edge(
        &self,
        collection: &str,
        key: Option<&str>,
        from: &DocumentId,
        to: &DocumentId,
        attributes: Value,
    ) -> Result<DocumentId, GraphError> {
        self.check_kind(collection, CollectionKind::Edge)?;
        let (id, mut entries) = self.prepare(collection, key, &attributes)?;
        entries.push((FROM_ATTRIBUTE.into(), Value::from(from.as_str())));
        entries.push((TO_ATTRIBUTE.into(), Value::from(to.as_str())));
        entries.extend(user_attributes(&attributes));
        self.store(collection, &id, entries)?;

        let mut adjacency = self.adjacency.write();
        let lists = adjacency.entry(collection.into()).or_default();
        lists.entry(from.clone()).or_default().outgoing.push(AdjacentEdge {
            edge: id.clone(),
            vertex: to.clone(),
        });
        lists.entry(to.clone()).or_default().incoming.push(AdjacentEdge {
            edge: id.clone(),
            vertex: from.clone(),
        });
        Ok(id)
    }

    fn prepare(
        &self,
        collection: &str,
        key: Option<&str>,
        attributes: &Value,
    ) -> Result<(DocumentId, Vec<(Arc<str>, Value)>), GraphError> {
        if !attributes.is_null() && !attributes.is_object() {
            return Err(GraphError::NotAnObject(attributes.type_name()));
        }
        let key = match key.or_else(|| attributes.get(KEY_ATTRIBUTE).and_then(Value::as_str)) {
            Some(key) => key.to_string(),
            None => self.next_key.fetch_add(1, Ordering::Relaxed).to_string(),
        };
        let id = DocumentId::from_parts(collection, &key)?;
        let entries = vec![
            (ID_ATTRIBUTE.into(), Value::from(id.as_str())),
            (KEY_ATTRIBUTE.into(), Value::from(key)),
        ];
        Ok((id, entries))
    }

    fn store(
        &self,
        collection: &str,
        id: &DocumentId,
        entries: Vec<(Arc<str>, Value)>,
    ) -> Result<(), GraphError> {
        let mut documents = self.documents.write();
        if documents.contains_key(id) {
            return Err(GraphError::DuplicateKey(id.to_string()));
        }
        documents.insert(id.clone(), Value::object(entries));
        if let Some(meta) = self.collections.write().get_mut(collection) {
            meta.count += 1;
        }
        Ok(())
    }

    /// Returns the number of vertex documents.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.count_of(CollectionKind::Vertex)
    }

    /// Returns the number of edge documents.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.count_of(CollectionKind::Edge)
    }

    fn count_of(&self, kind: CollectionKind) -> usize {
        self.collections
            .read()
            .values()
            .filter(|meta| meta.kind == kind)
            .map(|meta| meta.count)
            .sum()
    }
}

/// Attributes of a document other than the system attributes.
fn user_attributes(attributes: &Value) -> impl Iterator<Item = (Arc<str>, Value)> + '_ {
    attributes
        .as_object()
        .into_iter()
        .flat_map(|map| map.iter())
        .filter(|(name, _)| !matches!(&***name, "_id" | "_key" | "_from" | "_to"))
        .map(|(name, value)| (Arc::clone(name), value.clone()))
}

impl GraphAccess for MemoryGraph {
    fn document(&self, id: &DocumentId) -> Option<Value> {
        self.documents.read().get(id).cloned()
    }

    fn is_edge_collection(&self, name: &str) -> Option<bool> {
        self.collections
            .read()
            .get(name)
            .map(|meta| meta.kind == CollectionKind::Edge)
    }

    fn edges(&self, collection: &str, vertex: &DocumentId, direction: Direction, out: &mut Vec<AdjacentEdge>) {
        let adjacency = self.adjacency.read();
        let Some(lists) = adjacency.get(collection).and_then(|c| c.get(vertex)) else {
            return;
        };
        match direction {
            Direction::Outbound => out.extend(lists.outgoing.iter().cloned()),
            Direction::Inbound => out.extend(lists.incoming.iter().cloned()),
            Direction::Any => {
                out.extend(lists.outgoing.iter().cloned());
                out.extend(lists.incoming.iter().cloned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persons() -> MemoryGraph {
        let graph = MemoryGraph::new();
        graph.create_vertex_collection("persons").unwrap();
        graph.create_edge_collection("knows").unwrap();
        graph
    }

    #[test]
    fn test_insert_vertex() {
        let graph = persons();
        let id = graph
            .insert_vertex("persons", Some("alice"), Value::object([("age", 30i64)]))
            .unwrap();
        assert_eq!(id.as_str(), "persons/alice");

        let doc = graph.document(&id).unwrap();
        assert_eq!(doc.get("_id").and_then(Value::as_str), Some("persons/alice"));
        assert_eq!(doc.get("_key").and_then(Value::as_str), Some("alice"));
        assert_eq!(doc.get("age").and_then(Value::as_int64), Some(30));
        assert_eq!(graph.vertex_count(), 1);
    }

    #[test]
    fn test_key_sources() {
        let graph = persons();
        let from_doc = graph
            .insert_vertex("persons", None, Value::object([("_key", "bob"), ("_id", "x/y")]))
            .unwrap();
        assert_eq!(from_doc.as_str(), "persons/bob");
        assert_eq!(
            graph.document(&from_doc).unwrap().get("_id").and_then(Value::as_str),
            Some("persons/bob")
        );

        let generated = graph.insert_vertex("persons", None, Value::Null).unwrap();
        assert_eq!(generated.collection(), "persons");
        assert!(!generated.key().is_empty());
    }

    #[test]
    fn test_insert_errors() {
        let graph = persons();
        graph.insert_vertex("persons", Some("a"), Value::Null).unwrap();
        assert_eq!(
            graph.insert_vertex("persons", Some("a"), Value::Null),
            Err(GraphError::DuplicateKey("persons/a".into()))
        );
        assert!(matches!(
            graph.insert_vertex("knows", Some("b"), Value::Null),
            Err(GraphError::WrongCollectionKind { .. })
        ));
        assert_eq!(
            graph.insert_vertex("cities", None, Value::Null),
            Err(GraphError::UnknownCollection("cities".into()))
        );
        assert_eq!(
            graph.insert_vertex("persons", None, Value::from(1i64)),
            Err(GraphError::NotAnObject("number"))
        );
        assert_eq!(
            graph.create_vertex_collection("persons"),
            Err(GraphError::DuplicateCollection("persons".into()))
        );
        assert!(graph.create_edge_collection("a/b").is_err());
    }

    #[test]
    fn test_edges_and_adjacency() {
        let graph = persons();
        let a = graph.insert_vertex("persons", Some("a"), Value::Null).unwrap();
        let b = graph.insert_vertex("persons", Some("b"), Value::Null).unwrap();
        let e = graph
            .insert_edge("knows", Some("ab"), &a, &b, Value::object([("since", 2020i64)]))
            .unwrap();

        let doc = graph.document(&e).unwrap();
        assert_eq!(doc.get("_from").and_then(Value::as_str), Some("persons/a"));
        assert_eq!(doc.get("_to").and_then(Value::as_str), Some("persons/b"));
        assert_eq!(doc.get("since").and_then(Value::as_int64), Some(2020));

        let mut out = Vec::new();
        graph.edges("knows", &a, Direction::Outbound, &mut out);
        assert_eq!(out, vec![AdjacentEdge { edge: e.clone(), vertex: b.clone() }]);
        out.clear();
        graph.edges("knows", &a, Direction::Inbound, &mut out);
        assert!(out.is_empty());
        graph.edges("knows", &b, Direction::Any, &mut out);
        assert_eq!(out, vec![AdjacentEdge { edge: e, vertex: a }]);

        out.clear();
        graph.edges("missing", &b, Direction::Any, &mut out);
        assert!(out.is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_collections_listing() {
        let graph = persons();
        graph.insert_vertex("persons", None, Value::Null).unwrap();
        let listing = graph.collections();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "knows");
        assert_eq!(listing[0].kind, CollectionKind::Edge);
        assert_eq!(listing[1].count, 1);
    }
}
