use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{setup_logger, WorkerRunner};
use dotenv::dotenv;
use tracing::info;

mod config;
mod supervisor;

use config::StreamRelayConfig;
use supervisor::StreamSupervisor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    let _guard = setup_logger();

    let config = StreamRelayConfig::from_path(&args.config).context("Failed to load config")?;
    let spec = config.command();

    info!(
        target: "dispatch_result",
        "Relaying {} -> {} (cooldown {}s)",
        config.input_url,
        config.output_url,
        config.cooldown_secs
    );

    let supervisor = StreamSupervisor::new(spec, config.cooldown());
    WorkerRunner::run_workers(vec![Box::new(supervisor)]).await?;

    Ok(())
}
