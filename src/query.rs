//! Keyword search over an ontology document.
//!
//! A case-insensitive substring search, depth-first, that tracks a dotted /
//! bracketed path (`entities.products[2].name`) as it descends:
//!
//! - mapping keys are matched against the term; a hit records the child path
//!   and the value's display form, and the search still descends into
//!   container values, so hits at several nesting levels all appear;
//! - sequence elements that are scalars are matched on their display form;
//! - a scalar root is matched on its display form.
//!
//! Scalar values held directly under a mapping key are not matched on their
//! content; only their key is.
//!
//! Matches keep traversal order. The rendered result shows at most
//! [`MAX_DISPLAYED_MATCHES`] lines while the header reports the full count.

use serde::Serialize;

use crate::document::{Node, OntologyDocument};

pub const NO_ONTOLOGY_TO_QUERY: &str = "No ontology loaded to query.";

/// Upper bound on match lines included in a rendered query result.
pub const MAX_DISPLAYED_MATCHES: usize = 10;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryMatch {
    pub path: String,
    pub value: String,
}

impl std::fmt::Display for QueryMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.value)
    }
}

/// Collects every match for `term` under `root`, in traversal order.
pub fn find_matches(root: &Node, term: &str) -> Vec<QueryMatch> {
    let needle = term.to_lowercase();
    let mut matches = Vec::new();
    search(root, "", &needle, &mut matches);
    matches
}

fn search(node: &Node, path: &str, needle: &str, out: &mut Vec<QueryMatch>) {
    match node {
        Node::Mapping(entries) => {
            for (key, value) in entries {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                if key.to_lowercase().contains(needle) {
                    out.push(QueryMatch {
                        path: child.clone(),
                        value: value.to_string(),
                    });
                }
                if matches!(value, Node::Mapping(_) | Node::Sequence(_)) {
                    search(value, &child, needle, out);
                }
            }
        }
        Node::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                let child = format!("{}[{}]", path, i);
                match item {
                    Node::Mapping(_) | Node::Sequence(_) => search(item, &child, needle, out),
                    Node::Scalar(_) => push_if_contains(item, child, needle, out),
                }
            }
        }
        Node::Scalar(_) => push_if_contains(node, path.to_string(), needle, out),
    }
}

fn push_if_contains(node: &Node, path: String, needle: &str, out: &mut Vec<QueryMatch>) {
    let shown = node.to_string();
    if shown.to_lowercase().contains(needle) {
        out.push(QueryMatch { path, value: shown });
    }
}

/// Formats a list of matches the way the relay returns them to clients.
pub fn format_matches(term: &str, matches: &[QueryMatch]) -> String {
    if matches.is_empty() {
        return format!("No matches found for '{}' in the ontology.", term);
    }

    let lines: Vec<String> = matches
        .iter()
        .take(MAX_DISPLAYED_MATCHES)
        .map(QueryMatch::to_string)
        .collect();

    format!(
        "Found {} matches for '{}':\n{}",
        matches.len(),
        term,
        lines.join("\n")
    )
}

/// Runs a keyword query against the document and renders the result.
pub fn query_document(doc: &OntologyDocument, term: &str) -> String {
    if doc.is_empty() {
        return NO_ONTOLOGY_TO_QUERY.to_string();
    }
    format_matches(term, &find_matches(&doc.data, term))
}
