//! Ontology file loading.
//!
//! Dispatches purely on the path suffix:
//!
//! | Suffix | Result |
//! |--------|--------|
//! | `.json` | parsed into a [`Node`] tree |
//! | `.ttl`, `.rdf` | marker record only; the body is never read |
//! | anything else | [`LoadError::UnsupportedFormat`] |
//!
//! [`read_document`] reports *why* a load failed. The store and registry
//! collapse that to the boolean contract callers rely on.

use std::path::PathBuf;
use thiserror::Error;

use crate::document::{Node, OntologyDocument};

/// Recognized ontology file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OntologyFormat {
    Json,
    Rdf,
}

impl OntologyFormat {
    /// Detects the format from the path suffix. Matching is case-sensitive.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".json") {
            Some(OntologyFormat::Json)
        } else if path.ends_with(".ttl") || path.ends_with(".rdf") {
            Some(OntologyFormat::Rdf)
        } else {
            None
        }
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unsupported ontology format: {0} (expected .json, .ttl or .rdf)")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads an ontology document from `path`.
pub fn read_document(path: &str) -> Result<OntologyDocument, LoadError> {
    match OntologyFormat::from_path(path) {
        Some(OntologyFormat::Json) => {
            let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: PathBuf::from(path),
                source,
            })?;
            let value: serde_json::Value =
                serde_json::from_str(&content).map_err(|source| LoadError::Parse {
                    path: PathBuf::from(path),
                    source,
                })?;
            Ok(OntologyDocument::new(path, Node::from(value)))
        }
        Some(OntologyFormat::Rdf) => Ok(OntologyDocument::marker(path)),
        None => Err(LoadError::UnsupportedFormat(path.to_string())),
    }
}
