use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{setup_logger, with_retry, MetricsCollector, RetryConfig, WorkerRunner};
use dotenv::dotenv;
use std::sync::Arc;
use tg_tester::{MessageBlast, TelegramClient, TgTesterConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    /// Override the total message budget
    #[arg(long)]
    total: Option<u64>,

    /// Override the per-second ceiling
    #[arg(long)]
    rate: Option<u32>,

    /// Override the destination chat
    #[arg(long)]
    chat_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    let _guard = setup_logger();

    // 1. Load config, apply CLI overrides
    let mut config = TgTesterConfig::from_path(&args.config).context("Failed to load config")?;
    if let Some(total) = args.total {
        config.total_messages = total;
    }
    if let Some(rate) = args.rate {
        config.max_per_sec = rate;
    }
    if let Some(chat_id) = args.chat_id {
        config.chat_id = chat_id;
    }

    let pacing = config.pacing();
    pacing.validate()?;

    // 2. Build the client and verify the token before blasting
    let token = tg_tester::config::bot_token_from_env()?;
    let client = Arc::new(TelegramClient::with_api_base(&token, &config.api_base)?);

    let username = with_retry(RetryConfig::new(2, 500), "getMe", || async {
        client.get_me().await
    })
    .await
    .context("Token check failed")?;

    info!(
        target: "dispatch_result",
        "Bot @{} ready. Sending {} message(s) to chat {} at <= {}/s",
        username,
        config.total_messages,
        config.chat_id,
        config.max_per_sec
    );

    // 3. Run the paced sender under the shared runner
    let worker = MessageBlast::new(
        client,
        config.chat_id.clone(),
        config.message_text.clone(),
        pacing,
    );
    WorkerRunner::run_workers(vec![Box::new(worker)]).await?;

    // 4. Final metrics snapshot
    let snapshot = MetricsCollector::global().snapshot();
    info!(
        target: "dispatch_result",
        "Metrics: {}",
        serde_json::to_string(&snapshot)?
    );

    Ok(())
}
