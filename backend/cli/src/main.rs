mod config_cmd;
mod parse_cmd;
mod runtime;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use medibook_gateway::start_server;

#[derive(Parser)]
#[command(name = "medibook")]
#[command(about = "Medibook: turns free-text and photographed appointment requests into bookings")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $MEDIBOOK_CONFIG or ~/.medibook/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Parse one request and print the JSON envelope
    Parse {
        /// Free-text request
        #[arg(long, required_unless_present = "image")]
        text: Option<String>,
        /// Image of a written request; wins over --text
        #[arg(long)]
        image: Option<PathBuf>,
        /// IANA timezone for the result
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Print the effective configuration and its validation report
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = runtime::load(cli.config.as_deref()).await?;
            if let Some(port) = port {
                config.server.port = port;
            }
            runtime::init_logging(&config)?;

            let addr = config.server.address();
            info!(
                addr = %addr,
                timezone = %config.scheduling.default_timezone,
                uploads = %config.server.uploads_dir.display(),
                "Starting Medibook"
            );
            start_server(&addr, runtime::gateway_state(&config)).await?;
        }
        Commands::Parse {
            text,
            image,
            timezone,
        } => {
            let config = runtime::load(cli.config.as_deref()).await?;
            runtime::init_logging(&config)?;
            parse_cmd::run(&config, text, image, timezone).await?;
        }
        Commands::Config => {
            config_cmd::run(cli.config.as_deref()).await?;
        }
    }

    Ok(())
}
