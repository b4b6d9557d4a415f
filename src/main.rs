use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dhcp4d::option_map::options_from_map;
use dhcp4d::{Config, DhcpServer, LeasePool, Result};

#[derive(Parser)]
#[command(name = "dhcp4d")]
#[command(author, version, about = "A small relay-aware DHCPv4 server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve DHCP requests (default)
    Run,
    /// Print the effective configuration as JSON
    ShowConfig,
    /// Print the encoded option table sent to clients
    ShowOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = Config::load_or_create(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Starting DHCP server with config: {:?}", cli.config);
            info!(
                "IP pool: {} - {} ({} addresses)",
                config.pool_start,
                config.pool_end(),
                config.lease_range
            );
            let pool = LeasePool::from_config(&config)?;
            let mut server = DhcpServer::new(config, pool);

            tokio::select! {
                result = server.run() => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server...");
                    Ok(())
                }
            }
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::ShowOptions => {
            let options = options_from_map(&config.options)?;
            let mut entries: Vec<_> = options.iter().collect();
            entries.sort_by_key(|(code, _)| u8::from(*code));

            if entries.is_empty() {
                println!("No options configured.");
            } else {
                println!("{:<36} {:<5} Value", "Option", "Len");
                println!("{}", "-".repeat(76));

                for (code, value) in entries {
                    let hex = value
                        .iter()
                        .map(|byte| format!("{:02x}", byte))
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!("{:<36} {:<5} {}", code.to_string(), value.len(), hex);
                }
            }

            Ok(())
        }
    }
}
