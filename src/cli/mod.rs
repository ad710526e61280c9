//! CLI module for Rosana Desk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Rosana Desk - RAG chat backend
///
/// Answers questions from the contents of a Postgres database using an LLM.
#[derive(Parser, Debug)]
#[command(name = "rosana-desk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the knowledge base and start the HTTP chat service
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question from the terminal
    Ask {
        /// The question to ask
        question: String,
    },

    /// Print the knowledge document generated for one table
    Export {
        /// Table name
        table: String,
    },

    /// List the tables of a database schema
    Tables {
        /// Schema to inspect
        #[arg(short, long, default_value = "public")]
        schema: String,
    },

    /// Check configuration, API key and database connectivity
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
