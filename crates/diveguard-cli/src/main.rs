//! DiveGuard CLI Entry Point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use diveguard_cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Threat(cmd) => {
            diveguard_cli::threat::execute(cmd)?;
        }
        Commands::Version => {
            println!("diveguard {}", env!("CARGO_PKG_VERSION"));
            println!("Signal module version: {}", diveguard_signal::VERSION);
            println!("Threat module version: {}", diveguard_threat::VERSION);
        }
    }

    Ok(())
}
