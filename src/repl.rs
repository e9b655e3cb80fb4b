//! Interactive terminal chat against a running relay.
//!
//! Lines are read from stdin until EOF or `quit` / `exit` / `bye`. The
//! words `help`, `context` and `status` are local commands; anything else
//! is sent to `POST /chat`.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::client::RelayClient;

#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Quit,
    Help,
    Context,
    Status,
    Skip,
    Chat(&'a str),
}

/// Classifies one input line. Command words are case-insensitive.
pub fn parse_line(line: &str) -> ReplCommand<'_> {
    let input = line.trim();
    match input.to_lowercase().as_str() {
        "" => ReplCommand::Skip,
        "quit" | "exit" | "bye" => ReplCommand::Quit,
        "help" => ReplCommand::Help,
        "context" => ReplCommand::Context,
        "status" => ReplCommand::Status,
        _ => ReplCommand::Chat(input),
    }
}

fn print_help() {
    println!();
    println!("Available commands:");
    println!("  help     - Show this help message");
    println!("  context  - Show current ontology context");
    println!("  status   - Check relay status");
    println!("  quit     - Exit the chat");
    println!();
    println!("Anything else is sent to the model as a question.");
}

/// Runs the chat loop. `preload` names a stored ontology to load first.
pub async fn run_repl(client: &RelayClient, preload: Option<&str>) -> Result<()> {
    if let Some(name) = preload {
        match client.load(name).await {
            Ok(Ok(_)) => println!("Loaded ontology: {}", name),
            Ok(Err(error)) => println!("Could not load ontology: {}", error),
            Err(e) => println!("Could not load ontology: {:#}", e),
        }
    }

    println!("Ontology Harness terminal chat");
    println!("{}", "=".repeat(50));
    println!("Type 'quit', 'exit', or 'bye' to end the conversation");
    println!("Type 'help' for available commands");
    println!("{}", "=".repeat(50));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            println!("Goodbye!");
            break;
        };

        match parse_line(&line) {
            ReplCommand::Quit => {
                println!("Goodbye!");
                break;
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Context => match client.context().await {
                Ok(context) => {
                    println!();
                    println!("Current Ontology Context:");
                    println!("{}", "-".repeat(40));
                    println!("{}", context);
                }
                Err(e) => println!("Error getting context: {:#}", e),
            },
            ReplCommand::Status => match client.status().await {
                Ok(body) => {
                    println!("Relay status: running");
                    println!("Relay URL: {}", client.base_url());
                    println!(
                        "Model URL: {}",
                        body["model_url"].as_str().unwrap_or("Unknown")
                    );
                }
                Err(e) => println!("Relay status: cannot connect - {:#}", e),
            },
            ReplCommand::Skip => {}
            ReplCommand::Chat(message) => match client.chat(message).await {
                Ok(reply) => println!("AI: {}", reply),
                Err(e) => println!("AI: Error: {:#}", e),
            },
        }
    }

    Ok(())
}
