use reqwest::Client;
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::HostsConfig;

/// Fetch and parse the hosts document.
///
/// Never fails: any network, HTTP status or parse error is logged and the
/// gateway starts with an empty workload map.
pub async fn fetch_config(client: &Client, url: &str) -> HostsConfig {
    match try_fetch_config(client, url).await {
        Ok(config) => {
            info!(
                "Configuration loaded successfully ({} workloads)",
                config.len()
            );
            config
        }
        Err(e) => {
            error!("Failed to fetch or parse configuration: {}", e);
            HostsConfig::new()
        }
    }
}

async fn try_fetch_config(client: &Client, url: &str) -> AppResult<HostsConfig> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;
    parse_hosts_config(&body)
}

/// Parse a YAML hosts document; an empty or null document is an empty map
pub fn parse_hosts_config(raw: &str) -> AppResult<HostsConfig> {
    if raw.trim().is_empty() {
        return Ok(HostsConfig::new());
    }
    let parsed: Option<HostsConfig> = serde_yaml::from_str(raw)?;
    Ok(parsed.unwrap_or_default())
}
