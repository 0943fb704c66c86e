//! ABC Retailers CLI - storage provisioning and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Create tables, containers, queues and the payments share
//! abc-cli provision
//!
//! # Insert sample customers and products
//! abc-cli seed
//!
//! # Dequeue up to 5 order events and print them
//! abc-cli queue receive order-notifications -n 5
//!
//! # Download a proof of payment from contracts/payments
//! abc-cli files get 20240309_143000_receipt.pdf -o receipt.pdf
//! ```
//!
//! # Environment Variables
//!
//! - `STORAGE_BACKEND` - `azure` (default) or `memory`
//! - `AZURE_STORAGE_CONNECTION_STRING` - required for the azure backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "abc-cli")]
#[command(author, version, about = "ABC Retailers CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every table, container, queue and share the app uses
    Provision,
    /// Insert sample customers and products
    Seed,
    /// Inspect event queues
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Work with files on the contracts share
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// Dequeue messages and print them (messages are deleted)
    Receive {
        /// Queue name (`order-notifications` or `stock-updates`)
        queue: String,

        /// Maximum number of messages to receive
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(Subcommand)]
enum FilesAction {
    /// Download a file from the share
    Get {
        /// File name in the directory
        name: String,

        /// Share name
        #[arg(long, default_value = "contracts")]
        share: String,

        /// Directory within the share
        #[arg(long, default_value = "payments")]
        directory: String,

        /// Where to write the file (defaults to the file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let storage = commands::connect()?;

    match cli.command {
        Commands::Provision => commands::provision::run(&storage).await?,
        Commands::Seed => {
            commands::seed::run(&storage).await?;
        }
        Commands::Queue { action } => match action {
            QueueAction::Receive { queue, count } => {
                for message in commands::queue::receive(&storage, &queue, count).await? {
                    commands::queue::print_message(&message);
                }
            }
        },
        Commands::Files { action } => match action {
            FilesAction::Get {
                name,
                share,
                directory,
                output,
            } => {
                let output = output.unwrap_or_else(|| PathBuf::from(&name));
                commands::files::get(&storage, &share, &directory, &name, &output).await?;
            }
        },
    }
    Ok(())
}
