use std::error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use light_whisper_relay::config::loader::{load_config, DEFAULT_CONFIG_PATH};
use light_whisper_relay::relay::server::RelayServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "light_whisper_relay=info".into()),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path)?;
    let addr = config.socket_addr()?;

    let mut server = RelayServer::bind(addr, &config).await?;
    info!("listening on {} (tcp + udp)", server.local_addr()?);

    server.run_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    }).await?;

    Ok(())
}
