//! # Ontology Harness CLI (`onto`)
//!
//! The `onto` binary starts the relay server, talks to a running relay, and
//! inspects ontology files offline.
//!
//! ## Usage
//!
//! ```bash
//! onto --config ./config/onto.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `onto serve` | Start the HTTP relay |
//! | `onto status` | Check that the relay is running |
//! | `onto ontologies` | List ontologies in relay storage |
//! | `onto load <name>` | Load a stored ontology on the relay |
//! | `onto upload <path>` | Upload and load a local ontology file |
//! | `onto chat "<message>"` | Ask the model one question |
//! | `onto context` | Print the relay's current ontology context |
//! | `onto query "<term>"` | Keyword query over the relay's ontology |
//! | `onto repl` | Interactive terminal chat |
//! | `onto inspect <path>` | Render or query a file locally, no relay needed |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ontology_harness::client::{self, RelayClient};
use ontology_harness::{config, inspect, repl, server};

/// Ontology Harness CLI: ontology-grounded context for a local language model.
///
/// All commands accept `--config` pointing to a TOML file. A missing file is
/// not an error; built-in defaults are used instead.
#[derive(Parser)]
#[command(
    name = "onto",
    about = "Ontology Harness: ontology-grounded context for a local language model",
    version,
    long_about = "Ontology Harness loads a JSON ontology (or references an RDF/Turtle file), \
    renders it as prompt context, answers keyword queries against it, and relays chat \
    questions to a locally hosted model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/onto.toml")]
    config: PathBuf,

    /// Base URL of a running relay, used by the client commands.
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP relay server.
    ///
    /// Binds to `[server].bind` and loads `[storage].default_ontology`
    /// first when it is configured.
    Serve,

    /// Check whether the relay is running.
    Status,

    /// List ontology files available in relay storage.
    Ontologies,

    /// Load an ontology from relay storage by file name.
    Load {
        /// File name inside the relay's storage directory.
        name: String,
    },

    /// Upload a local ontology file to the relay and load it.
    Upload {
        /// Path to a `.json`, `.ttl` or `.rdf` file.
        path: PathBuf,
    },

    /// Ask the model one question.
    Chat {
        /// The question.
        message: String,
    },

    /// Print the relay's current ontology context.
    Context,

    /// Run a keyword query against the relay's ontology.
    Query {
        /// Case-insensitive search term.
        term: String,
    },

    /// Interactive terminal chat.
    Repl {
        /// Stored ontology to load before the first prompt.
        #[arg(long)]
        load: Option<String>,
    },

    /// Load an ontology file locally and print its context.
    ///
    /// Does not need a running relay. Exits non-zero when the file cannot
    /// be loaded.
    Inspect {
        /// Path to a `.json`, `.ttl` or `.rdf` file.
        path: String,

        /// Print the keyword query result for this term instead of the context.
        #[arg(long)]
        query: Option<String>,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config_or_default(&cli.config)?;
    init_tracing(&cfg.logging.level);

    let relay = RelayClient::new(&cli.url, cfg.model.timeout_secs)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Status => {
            client::run_status(&relay).await?;
        }
        Commands::Ontologies => {
            client::run_ontologies(&relay).await?;
        }
        Commands::Load { name } => {
            client::run_load(&relay, &name).await?;
        }
        Commands::Upload { path } => {
            client::run_upload(&relay, &path).await?;
        }
        Commands::Chat { message } => {
            client::run_chat(&relay, &message).await?;
        }
        Commands::Context => {
            client::run_context(&relay).await?;
        }
        Commands::Query { term } => {
            client::run_query(&relay, &term).await?;
        }
        Commands::Repl { load } => {
            repl::run_repl(&relay, load.as_deref()).await?;
        }
        Commands::Inspect { path, query } => {
            inspect::run_inspect(&path, query.as_deref())?;
        }
    }

    Ok(())
}
