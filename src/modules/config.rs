use tracing::warn;

use crate::models::AppConfig;
use crate::proxy::config::UpstreamProxyConfig;

/// Load application config from the process environment
pub fn load_app_config() -> AppConfig {
    load_app_config_from(|key| std::env::var(key).ok())
}

/// Build config from an arbitrary variable lookup
pub fn load_app_config_from<F>(lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut config = AppConfig::new();

    if let Some(port) = get("PORT") {
        match port.trim().parse::<u16>() {
            Ok(p) => config.proxy.port = p,
            Err(_) => warn!(
                "Invalid PORT '{}', using default {}",
                port, config.proxy.port
            ),
        }
    }
    if let Some(v) = get("ALLOW_LAN_ACCESS") {
        config.proxy.allow_lan_access = parse_bool(&v, config.proxy.allow_lan_access);
    }
    if let Some(secs) = get("REQUEST_TIMEOUT_SECS") {
        config.proxy.request_timeout =
            parse_secs("REQUEST_TIMEOUT_SECS", &secs, config.proxy.request_timeout);
    }
    if let Some(scheme) = get("UPSTREAM_SCHEME") {
        config.proxy.upstream_scheme = scheme.trim().to_lowercase();
    }
    if let Some(url) = get("UPSTREAM_PROXY_URL") {
        config.proxy.upstream_proxy = UpstreamProxyConfig { enabled: true, url };
    }

    if let Some(url) = get("HOSTS_CONFIG_URL") {
        config.hosts_config_url = url;
    }
    if let Some(secs) = get("CONFIG_FETCH_TIMEOUT_SECS") {
        config.config_fetch_timeout =
            parse_secs("CONFIG_FETCH_TIMEOUT_SECS", &secs, config.config_fetch_timeout);
    }

    let azure = &mut config.azure;
    azure.client_id = get("AZURE_CLIENT_ID").unwrap_or_default();
    azure.tenant_id = get("AZURE_TENANT_ID").unwrap_or_default();
    azure.audience = get("AZURE_AUDIENCE").unwrap_or_else(|| azure.client_id.clone());
    if let Some(host) = get("AZURE_AUTHORITY_HOST") {
        azure.authority_host = host;
    }
    if let Some(v) = get("AZURE_VALIDATE_ISSUER") {
        azure.validate_issuer = parse_bool(&v, azure.validate_issuer);
    }

    config
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_secs(key: &str, value: &str, default: u64) -> u64 {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            warn!("Invalid {} '{}', using default {}s", key, value, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_app_config_from(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config.proxy.port, 8080);
        assert_eq!(config.proxy.request_timeout, 120);
        assert_eq!(config.proxy.upstream_scheme, "https");
        assert!(!config.proxy.upstream_proxy.enabled);
        assert_eq!(config.config_fetch_timeout, 15);
        assert_eq!(
            config.hosts_config_url,
            crate::models::config::DEFAULT_HOSTS_CONFIG_URL
        );
        assert!(config.azure.validate_issuer);
    }

    #[test]
    fn test_audience_defaults_to_client_id() {
        let config = load(&[("AZURE_CLIENT_ID", "client-1"), ("AZURE_TENANT_ID", "t")]);
        assert_eq!(config.azure.audience, "client-1");

        let config = load(&[
            ("AZURE_CLIENT_ID", "client-1"),
            ("AZURE_AUDIENCE", "api://gateway"),
        ]);
        assert_eq!(config.azure.audience, "api://gateway");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("PORT", "not-a-port"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("ALLOW_LAN_ACCESS", "maybe"),
        ]);
        assert_eq!(config.proxy.port, 8080);
        assert_eq!(config.proxy.request_timeout, 120);
        assert!(config.proxy.allow_lan_access);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "9000"),
            ("UPSTREAM_SCHEME", "HTTP"),
            ("UPSTREAM_PROXY_URL", "socks5://127.0.0.1:1080"),
            ("HOSTS_CONFIG_URL", "http://localhost/hosts.yaml"),
            ("AZURE_VALIDATE_ISSUER", "false"),
        ]);
        assert_eq!(config.proxy.port, 9000);
        assert_eq!(config.proxy.upstream_scheme, "http");
        assert!(config.proxy.upstream_proxy.enabled);
        assert_eq!(config.hosts_config_url, "http://localhost/hosts.yaml");
        assert!(!config.azure.validate_issuer);
    }
}
