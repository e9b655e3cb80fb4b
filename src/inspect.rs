//! Offline inspection of an ontology file.
//!
//! `onto inspect <path>` loads the file in-process and prints the rendered
//! context; with `--query <term>` it prints the keyword query result instead.
//! No relay or model backend is involved.

use anyhow::{Context, Result};

use crate::store::OntologyStore;

/// Loads `path` and returns the text `onto inspect` prints.
pub fn inspect(path: &str, query: Option<&str>) -> Result<String> {
    let store = OntologyStore::new();
    store
        .try_load(path)
        .with_context(|| format!("Failed to load ontology: {}", path))?;

    Ok(match query {
        Some(term) => store.query(term),
        None => store.context(),
    })
}

/// CLI entry point.
pub fn run_inspect(path: &str, query: Option<&str>) -> Result<()> {
    let output = inspect(path, query)?;
    println!("{}", output.trim_end_matches('\n'));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_rdf_reference() {
        let out = inspect("/srv/core.rdf", None).unwrap();
        assert_eq!(out, "Ontology loaded from: /srv/core.rdf");
    }

    #[test]
    fn test_inspect_query() {
        let out = inspect("/srv/core.ttl", Some("type")).unwrap();
        assert_eq!(out, "Found 1 matches for 'type':\ntype: rdf");
    }

    #[test]
    fn test_inspect_unsupported() {
        let err = inspect("core.csv", None).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("Failed to load ontology: core.csv"));
        assert!(chain.contains("unsupported ontology format"));
    }
}
