// CLI - Command Line Interface for the BDNS node
// Principle: Simple, clear, composable commands

pub mod config;
pub mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// BDNS Node - blockchain-backed, gossip-networked DNS resolution peer
#[derive(Parser, Debug)]
#[command(name = "bdns-node")]
#[command(author = "BDNS Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "BDNS peer - replicated domain ledger with epoch randomness")]
#[command(long_about = r#"
A BDNS peer holds a replicated ledger of owner-signed domain records,
propagates transactions and blocks by gossip, answers name-resolution
queries point-to-point, and contributes to a per-epoch shared random
value via commit-reveal.

Start a node:
  bdns-node run --port 30333

Join with an explicit bootnode:
  bdns-node run --bootnode /ip4/1.2.3.4/tcp/30333/p2p/...
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "BDNS_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the node
    Run(RunCmd),

    /// Registry key management
    Key(KeyCmd),
}

/// Run the node
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Base path for node data (network identity)
    #[arg(short = 'd', long, env = "BDNS_BASE_PATH")]
    pub base_path: Option<PathBuf>,

    /// Node name for logs
    #[arg(long, env = "BDNS_NAME")]
    pub name: Option<String>,

    /// P2P listen port
    #[arg(long, default_value = "30333", env = "BDNS_P2P_PORT")]
    pub port: u16,

    /// Bootstrap nodes (can be specified multiple times)
    #[arg(long = "bootnode", value_name = "MULTIADDR")]
    pub bootnodes: Vec<String>,

    /// Registry participant public keys, hex encoded (repeatable)
    #[arg(long = "registry-key", value_name = "HEX")]
    pub registry_keys: Vec<String>,

    /// Network start timestamp; epoch 0 begins here (defaults to now)
    #[arg(long)]
    pub initial_timestamp: Option<i64>,

    /// Epoch length in seconds
    #[arg(long, default_value = "3600")]
    pub epoch_interval: i64,
}

/// Key management commands
#[derive(Parser, Debug)]
pub struct KeyCmd {
    #[command(subcommand)]
    pub subcommand: KeySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum KeySubcommand {
    /// Generate a new registry key pair
    Generate {
        /// Output file (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (json, hex)
        #[arg(long, default_value = "json")]
        format: String,
    },
}
