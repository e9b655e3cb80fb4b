//! Registry of named ontologies with one active entry.
//!
//! Each name owns an independent [`OntologyDocument`]. The first document to
//! load successfully becomes active; afterwards the active entry only changes
//! through [`OntologyRegistry::set_active`]. There is no removal.
//!
//! ```rust
//! use ontology_harness::registry::OntologyRegistry;
//!
//! let mut registry = OntologyRegistry::new();
//! assert!(registry.load("schema", "/srv/schema.ttl"));
//! assert_eq!(registry.active_name(), Some("schema"));
//! assert_eq!(registry.active_context(), "Ontology loaded from: /srv/schema.ttl");
//! ```

use serde::Serialize;

use crate::context::render_context;
use crate::document::OntologyDocument;
use crate::loader::read_document;
use crate::query::query_document;

pub const NO_ACTIVE_ONTOLOGY: &str = "No active ontology loaded.";
pub const NO_ACTIVE_ONTOLOGY_TO_QUERY: &str = "No active ontology loaded to query.";

/// Summary returned by [`OntologyRegistry::describe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologyInfo {
    pub name: String,
    pub context: String,
    pub is_active: bool,
}

struct NamedOntology {
    name: String,
    document: OntologyDocument,
}

#[derive(Default)]
pub struct OntologyRegistry {
    entries: Vec<NamedOntology>,
    active: Option<String>,
}

impl OntologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` under `name`.
    ///
    /// On failure nothing is registered and an existing entry of the same
    /// name is left untouched. Reloading a name replaces its document in place.
    pub fn load(&mut self, name: &str, path: &str) -> bool {
        match read_document(path) {
            Ok(doc) => {
                self.insert(name, doc);
                tracing::info!(name, path, "ontology registered");
                true
            }
            Err(e) => {
                tracing::warn!(name, path, error = %e, "failed to load ontology");
                false
            }
        }
    }

    /// Registers an already-loaded document under `name`, with the same
    /// first-becomes-active rule as [`load`](Self::load).
    pub fn insert(&mut self, name: &str, document: OntologyDocument) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.document = document,
            None => self.entries.push(NamedOntology {
                name: name.to_string(),
                document,
            }),
        }

        if self.active.is_none() {
            self.active = Some(name.to_string());
        }
    }

    /// Makes `name` the active ontology. Unknown names are rejected.
    pub fn set_active(&mut self, name: &str) -> bool {
        if self.find(name).is_none() {
            return false;
        }
        self.active = Some(name.to_string());
        true
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_context(&self) -> String {
        match self.active_document() {
            Some(doc) => render_context(doc),
            None => NO_ACTIVE_ONTOLOGY.to_string(),
        }
    }

    pub fn active_query(&self, term: &str) -> String {
        match self.active_document() {
            Some(doc) => query_document(doc, term),
            None => NO_ACTIVE_ONTOLOGY_TO_QUERY.to_string(),
        }
    }

    /// Registered names in registration order.
    pub fn list_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn describe(&self, name: &str) -> Option<OntologyInfo> {
        self.find(name).map(|doc| OntologyInfo {
            name: name.to_string(),
            context: render_context(doc),
            is_active: self.active.as_deref() == Some(name),
        })
    }

    pub fn get(&self, name: &str) -> Option<&OntologyDocument> {
        self.find(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn find(&self, name: &str) -> Option<&OntologyDocument> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.document)
    }

    fn active_document(&self) -> Option<&OntologyDocument> {
        self.active.as_deref().and_then(|name| self.find(name))
    }
}
