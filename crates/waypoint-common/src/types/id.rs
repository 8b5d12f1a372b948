//! Identifier types.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a value slot within a row.
pub type RegisterId = usize;

/// Upper bound on the number of registers a row may carry.
pub const MAX_REGISTERS: usize = 1000;

/// Error raised when a string is not a valid document identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier does not contain the `/` separator.
    #[error("'{0}' is not a document identifier: missing '/' separator")]
    MissingSeparator(String),
    /// The collection or key part is empty.
    #[error("'{0}' is not a document identifier: empty collection or key")]
    EmptyComponent(String),
}

/// A document identifier of the form `collection/key`.
///
/// Identifiers address vertices and edges alike. They are cheap to clone
/// since the underlying string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(Arc<str>);

impl DocumentId {
    /// Separator between collection name and key.
    pub const SEPARATOR: char = '/';

    /// Parses an identifier, validating the `collection/key` shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the separator is missing or one side is empty.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let Some(split) = s.find(Self::SEPARATOR) else {
            return Err(IdError::MissingSeparator(s.to_string()));
        };
        if split == 0 || split + 1 == s.len() {
            return Err(IdError::EmptyComponent(s.to_string()));
        }
        Ok(Self(s.into()))
    }

    /// Builds an identifier from a collection name and a key.
    ///
    /// # Errors
    ///
    /// Returns an error if either part is empty or the collection contains
    /// the separator.
    pub fn from_parts(collection: &str, key: &str) -> Result<Self, IdError> {
        if collection.contains(Self::SEPARATOR) {
            return Err(IdError::EmptyComponent(format!("{collection}/{key}")));
        }
        Self::parse(&format!("{collection}/{key}"))
    }

    /// Returns the collection part.
    #[must_use]
    pub fn collection(&self) -> &str {
        let split = self.split_at();
        &self.0[..split]
    }

    /// Returns the key part.
    #[must_use]
    pub fn key(&self) -> &str {
        let split = self.split_at();
        &self.0[split + 1..]
    }

    /// Returns the full identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split_at(&self) -> usize {
        // parse() guarantees the separator is present
        self.0.find(Self::SEPARATOR).unwrap_or(0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0.to_string()
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let id = DocumentId::parse("persons/alice").unwrap();
        assert_eq!(id.collection(), "persons");
        assert_eq!(id.key(), "alice");
        assert_eq!(id.as_str(), "persons/alice");
        assert_eq!(id.to_string(), "persons/alice");
    }

    #[test]
    fn test_parse_missing_separator() {
        assert_eq!(
            DocumentId::parse("alice"),
            Err(IdError::MissingSeparator("alice".to_string()))
        );
    }

    #[test]
    fn test_parse_empty_components() {
        assert!(matches!(
            DocumentId::parse("/alice"),
            Err(IdError::EmptyComponent(_))
        ));
        assert!(matches!(
            DocumentId::parse("persons/"),
            Err(IdError::EmptyComponent(_))
        ));
    }

    #[test]
    fn test_key_may_contain_separator() {
        let id = DocumentId::parse("files/a/b").unwrap();
        assert_eq!(id.collection(), "files");
        assert_eq!(id.key(), "a/b");
    }

    #[test]
    fn test_from_parts() {
        let id = DocumentId::from_parts("edges", "42").unwrap();
        assert_eq!(id.as_str(), "edges/42");
        assert!(DocumentId::from_parts("a/b", "c").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = DocumentId::parse("persons/bob").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"persons/bob\"");
        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<DocumentId>("\"bob\"").is_err());
    }
}
