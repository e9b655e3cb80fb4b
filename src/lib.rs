//! # Ontology Harness
//!
//! Ontology-grounded context for a locally hosted language model.
//!
//! A JSON ontology (or a reference to an RDF/Turtle file) is loaded into an
//! in-memory store, flattened into an indentation-structured text block that
//! is injected into the model prompt, and searched with case-insensitive
//! keyword queries. A small HTTP relay and the `onto` CLI sit on top.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────────┐
//! │  Loader  │──▶│    Store    │──▶│   Context    │──┐
//! │ json/ttl │   │  / Registry │   │   / Query    │  │
//! └──────────┘   └─────────────┘   └──────────────┘  │
//!                                                    ▼
//!                 ┌──────────┐   ┌──────────┐   ┌──────────┐
//!                 │   CLI    │──▶│   HTTP   │──▶│  Ollama  │
//!                 │  (onto)  │   │  relay   │   │   chat   │
//!                 └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! onto inspect ./storage/ontologies/example.json            # render context offline
//! onto inspect ./storage/ontologies/example.json --query name
//! onto serve                                                 # start the relay
//! onto load example.json                                     # load on the relay
//! onto chat "What products exist?"
//! onto repl                                                  # terminal chat
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`document`] | Typed ontology tree and document |
//! | [`loader`] | Suffix-based file loading |
//! | [`context`] | Prompt context rendering |
//! | [`query`] | Keyword search |
//! | [`store`] | Shared current-document store |
//! | [`registry`] | Named ontologies with an active entry |
//! | [`chat`] | Language-model chat relay |
//! | [`server`] | HTTP relay server |
//! | [`client`] | HTTP client commands |
//! | [`repl`] | Terminal chat loop |
//! | [`inspect`] | Offline inspection |
//! | [`config`] | TOML configuration parsing |

pub mod chat;
pub mod client;
pub mod config;
pub mod context;
pub mod document;
pub mod inspect;
pub mod loader;
pub mod query;
pub mod registry;
pub mod repl;
pub mod server;
pub mod store;
