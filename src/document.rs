//! Typed ontology document tree.
//!
//! A loaded ontology is held as a closed [`Node`] tree: a mapping (insertion
//! ordered, unique keys), a sequence, or a scalar. The renderer in
//! [`crate::context`] and the keyword search in [`crate::query`] match on it
//! exhaustively.
//!
//! Non-JSON formats (RDF/Turtle) are not parsed. They are represented by a
//! synthetic *marker record*, `{file_path: <path>, type: "rdf"}`, which the
//! renderer treats as an opaque reference.

use serde_json::Value;
use std::fmt;

/// Key that marks a mapping as an opaque reference to an unparsed file.
pub const MARKER_KEY: &str = "file_path";

/// A node in the ontology tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Key/value entries in document order. Keys are unique.
    Mapping(Vec<(String, Node)>),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

/// Leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Node {
    /// An empty mapping: the "nothing loaded" state.
    pub fn empty() -> Self {
        Node::Mapping(Vec::new())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(s.into()))
    }

    /// True for an empty container, an empty string, null, `false` or zero.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Mapping(entries) => entries.is_empty(),
            Node::Sequence(items) => items.is_empty(),
            Node::Scalar(Scalar::Null) => true,
            Node::Scalar(Scalar::Bool(b)) => !b,
            Node::Scalar(Scalar::Number(n)) => n.as_f64() == Some(0.0),
            Node::Scalar(Scalar::String(s)) => s.is_empty(),
        }
    }

    /// Looks up a direct child of a mapping by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Node::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Node::Sequence(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
        }
    }
}

/// Display form used in rendered context and query results.
///
/// Strings print raw, other scalars in JSON spelling, and containers as
/// compact JSON.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Scalar(Scalar::String(s)) => f.write_str(s),
            Node::Scalar(Scalar::Null) => f.write_str("null"),
            Node::Scalar(Scalar::Bool(b)) => write!(f, "{}", b),
            Node::Scalar(Scalar::Number(n)) => write!(f, "{}", n),
            Node::Mapping(_) | Node::Sequence(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// The currently loaded ontology and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct OntologyDocument {
    /// Path the document was loaded from; `None` before the first load.
    pub source: Option<String>,
    pub data: Node,
}

impl OntologyDocument {
    pub fn empty() -> Self {
        Self {
            source: None,
            data: Node::empty(),
        }
    }

    pub fn new(source: impl Into<String>, data: Node) -> Self {
        Self {
            source: Some(source.into()),
            data,
        }
    }

    /// Builds the marker record standing in for an unparsed RDF/Turtle file.
    pub fn marker(path: impl Into<String>) -> Self {
        let path = path.into();
        let data = Node::Mapping(vec![
            (MARKER_KEY.to_string(), Node::string(path.clone())),
            ("type".to_string(), Node::string("rdf")),
        ]);
        Self::new(path, data)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the referenced file when the root mapping carries the marker key.
    pub fn external_reference(&self) -> Option<&Node> {
        self.data.get(MARKER_KEY)
    }
}

impl Default for OntologyDocument {
    fn default() -> Self {
        Self::empty()
    }
}
