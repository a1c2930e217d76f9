// BDNS Node - Entry point
// Principle: Names resolve from a replicated ledger, not a registrar

mod cli;
mod consensus;
mod ledger;
mod network;
mod node;
mod types;

#[cfg(test)]
mod tests;

use clap::Parser;
use cli::config::NodeConfig;
use cli::runner::run_node;
use cli::{Cli, Commands, KeySubcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.verbose { "debug" } else { &cli.log_level };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .init();

    match cli.command {
        Commands::Run(cmd) => {
            let config = NodeConfig::from_run_cmd(&cmd).map_err(|e| {
                error!("Configuration error: {}", e);
                anyhow::anyhow!("Configuration error: {}", e)
            })?;

            if let Err(e) = run_node(config).await {
                error!("Node error: {}", e);
                return Err(anyhow::anyhow!("Node error: {}", e));
            }
        }

        Commands::Key(cmd) => match cmd.subcommand {
            KeySubcommand::Generate { output, format } => {
                generate_key(output.as_ref(), &format)?;
            }
        },
    }

    Ok(())
}

/// Generate a registry key pair and print or save it.
fn generate_key(output: Option<&std::path::PathBuf>, format: &str) -> anyhow::Result<()> {
    let pair = types::KeyPair::generate();
    let secret_hex = hex::encode(pair.secret_bytes());
    let public_hex = pair.participant_id();

    match format {
        "json" => {
            let json = serde_json::json!({
                "scheme": "ed25519",
                "secretKey": format!("0x{}", secret_hex),
                "publicKey": format!("0x{}", public_hex),
                "participantId": public_hex,
            });
            let output_str = serde_json::to_string_pretty(&json)?;

            if let Some(path) = output {
                std::fs::write(path, &output_str)?;
                info!("Key saved to: {}", path.display());
            } else {
                println!("{}", output_str);
            }
        }
        "hex" => {
            println!("Secret Key: 0x{}", secret_hex);
            println!("Public Key: 0x{}", public_hex);
            println!("Participant ID: {}", public_hex);
        }
        _ => {
            return Err(anyhow::anyhow!("Unknown format: {}", format));
        }
    }

    Ok(())
}
