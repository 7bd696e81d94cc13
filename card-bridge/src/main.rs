use card_bridge::{BridgeConfig, CardBridge, LineReader};
use clap::Parser;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();
    let config = BridgeConfig::parse();

    gym_server::init_logger_with_file(
        Some(&config.log_level),
        config.log_dir.as_deref(),
        "card-bridge",
    );

    tracing::info!(
        device = %config.device,
        relay = %config.relay_addr,
        database = %config.database_path,
        "Card bridge starting..."
    );

    let mut reader = LineReader::open(&config.device).await?;
    let mut bridge = CardBridge::start(&config).await?;
    tracing::info!("NFC reader connected: {}", reader.name());

    let shutdown = bridge.shutdown_token();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
        shutdown.cancel();
    });

    bridge.run(&mut reader).await;
    bridge.shutdown().await;
    Ok(())
}
