pub mod error;
pub mod models;
pub mod modules;
pub mod proxy; // Proxy service module
pub mod utils;

use modules::logger;
use tracing::info;

/// Run the gateway until Ctrl-C
///
/// Routes are installed only after the hosts document has been fetched
/// (or has failed and degraded to an empty map).
pub async fn run() -> anyhow::Result<()> {
    // Initialize logger
    logger::init_logger();

    let config = modules::load_app_config();
    info!(
        "Starting gateway (port: {}, hosts: {})",
        config.proxy.port, config.hosts_config_url
    );

    let client = utils::http::create_client_with_proxy(
        config.config_fetch_timeout,
        Some(&config.proxy.upstream_proxy),
    )?;
    let hosts = modules::fetch_config(&client, &config.hosts_config_url).await;
    info!("Fetched host config: {:?}", hosts);

    let state = proxy::AppState::new(&config, hosts)?;
    let (server, handle) = proxy::AxumServer::start(&config.proxy, state).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    server.stop();
    handle.await?;

    Ok(())
}
