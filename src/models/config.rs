use crate::proxy::config::{AzureAdConfig, ProxyConfig};

/// Default source of the workload map
pub const DEFAULT_HOSTS_CONFIG_URL: &str = "https://raw.githubusercontent.com/co-cddo/zerotrust-cloud-identity/refs/heads/main/shared_config/hosts.yaml";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub proxy: ProxyConfig,
    pub azure: AzureAdConfig,
    pub hosts_config_url: String,
    pub config_fetch_timeout: u64, // Seconds
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            azure: AzureAdConfig::default(),
            hosts_config_url: DEFAULT_HOSTS_CONFIG_URL.to_string(),
            config_fetch_timeout: 15,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
