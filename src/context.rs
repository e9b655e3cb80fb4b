//! Rendering an ontology as prompt context.
//!
//! Produces a deterministic, indentation-structured text block that is
//! injected verbatim into the language-model prompt. Rendering never fails:
//! an empty store or an unparsed RDF file yields explanatory text instead.
//!
//! # Layout
//!
//! ```text
//! Current Ontology Context:
//! Loaded from: ./storage/ontologies/example.json
//!
//! entities:
//!   product:
//!     name: Widget
//! tags:
//!   - alpha
//!   - beta
//! ```
//!
//! Keys keep document order. Mapping elements of a sequence are rendered
//! one level deeper without an index label.

use crate::document::{Node, OntologyDocument};

pub const NO_ONTOLOGY_LOADED: &str = "No ontology loaded.";
pub const CONTEXT_HEADER: &str = "Current Ontology Context:";

const INDENT: &str = "  ";

/// Renders the document as prompt context.
pub fn render_context(doc: &OntologyDocument) -> String {
    if doc.is_empty() {
        return NO_ONTOLOGY_LOADED.to_string();
    }

    if let Some(path) = doc.external_reference() {
        return format!("Ontology loaded from: {}", path);
    }

    let mut out = String::new();
    out.push_str(CONTEXT_HEADER);
    out.push('\n');
    out.push_str(&format!(
        "Loaded from: {}\n\n",
        doc.source.as_deref().unwrap_or("(unknown)")
    ));

    // Only a mapping root has a body; sequence and scalar roots stop at the header.
    if let Node::Mapping(entries) = &doc.data {
        render_mapping(entries, 0, &mut out);
    }

    out
}

fn render_mapping(entries: &[(String, Node)], depth: usize, out: &mut String) {
    let spaces = INDENT.repeat(depth);

    for (key, value) in entries {
        match value {
            Node::Mapping(children) => {
                out.push_str(&format!("{}{}:\n", spaces, key));
                render_mapping(children, depth + 1, out);
            }
            Node::Sequence(items) => {
                out.push_str(&format!("{}{}:\n", spaces, key));
                for item in items {
                    match item {
                        Node::Mapping(children) => render_mapping(children, depth + 1, out),
                        other => out.push_str(&format!("{}{}- {}\n", spaces, INDENT, other)),
                    }
                }
            }
            Node::Scalar(_) => {
                out.push_str(&format!("{}{}: {}\n", spaces, key, value));
            }
        }
    }
}
