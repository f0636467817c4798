//! Command-line interface

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "automod")]
#[command(about = "Persistent hate-speech moderation service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the persistent moderation service
    Serve {
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Moderate one content record from stdin and print the result to stdout
    ///
    /// One-shot fallback for callers that cannot reach the persistent
    /// service; applies the same pipeline and fail-open semantics.
    Moderate {
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Query the health endpoint of a running service
    Status {
        /// Service host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Service port
        #[arg(long, default_value_t = 8001)]
        port: u16,
    },
}
