//! Process-wide holder for the current ontology document.
//!
//! The relay server shares one [`OntologyStore`] across request handlers.
//! Loads read and parse the file without holding the lock, then swap the
//! `Arc` in a single write, so a concurrent reader sees either the previous
//! document or the new one, never a half-built one.

use std::sync::{Arc, RwLock};

use crate::context::render_context;
use crate::document::OntologyDocument;
use crate::loader::{read_document, LoadError};
use crate::query::query_document;

pub struct OntologyStore {
    current: RwLock<Arc<OntologyDocument>>,
}

impl OntologyStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(OntologyDocument::empty())),
        }
    }

    /// Loads `path` and replaces the current document.
    ///
    /// Returns `false` on any failure (unsupported suffix, I/O, parse) and
    /// leaves the previous document in place. The cause is logged.
    pub fn load(&self, path: &str) -> bool {
        match self.try_load(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to load ontology");
                false
            }
        }
    }

    /// Like [`load`](Self::load) but reports why the load failed.
    pub fn try_load(&self, path: &str) -> Result<(), LoadError> {
        let doc = read_document(path)?;
        self.replace(doc);
        tracing::info!(path, "ontology loaded");
        Ok(())
    }

    /// Installs an already-built document.
    pub fn replace(&self, doc: OntologyDocument) {
        let doc = Arc::new(doc);
        match self.current.write() {
            Ok(mut guard) => *guard = doc,
            Err(poisoned) => *poisoned.into_inner() = doc,
        }
    }

    /// Resets to the initial empty state.
    pub fn clear(&self) {
        self.replace(OntologyDocument::empty());
    }

    /// The current document. Cheap: clones the `Arc`, not the tree.
    pub fn snapshot(&self) -> Arc<OntologyDocument> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn source(&self) -> Option<String> {
        self.snapshot().source.clone()
    }

    pub fn context(&self) -> String {
        render_context(&self.snapshot())
    }

    pub fn query(&self, term: &str) -> String {
        query_document(&self.snapshot(), term)
    }
}

impl Default for OntologyStore {
    fn default() -> Self {
        Self::new()
    }
}
