use crate::error::AppResult;
use crate::proxy::config::UpstreamProxyConfig;
use reqwest::{Client, ClientBuilder, Proxy};

/// Create an HTTP client with specified proxy configuration
pub fn create_client_with_proxy(
    timeout_secs: u64,
    proxy_config: Option<&UpstreamProxyConfig>,
) -> AppResult<Client> {
    Ok(client_builder(timeout_secs, proxy_config).build()?)
}

/// Client builder with timeout and optional upstream proxy applied
pub fn client_builder(
    timeout_secs: u64,
    proxy_config: Option<&UpstreamProxyConfig>,
) -> ClientBuilder {
    let mut builder = Client::builder().timeout(std::time::Duration::from_secs(timeout_secs));

    if let Some(config) = proxy_config {
        if config.enabled && !config.url.is_empty() {
            match Proxy::all(&config.url) {
                Ok(proxy) => {
                    builder = builder.proxy(proxy);
                    tracing::info!("HTTP client upstream proxy enabled: {}", config.url);
                }
                Err(e) => {
                    tracing::error!("Invalid proxy address: {}, error: {}", config.url, e);
                }
            }
        }
    }

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_proxy_is_ignored() {
        let config = UpstreamProxyConfig {
            enabled: true,
            url: "::not a url::".to_string(),
        };
        assert!(create_client_with_proxy(5, Some(&config)).is_ok());
    }

    #[test]
    fn test_disabled_proxy() {
        let config = UpstreamProxyConfig {
            enabled: false,
            url: "http://127.0.0.1:3128".to_string(),
        };
        assert!(create_client_with_proxy(5, Some(&config)).is_ok());
        assert!(create_client_with_proxy(5, None).is_ok());
    }
}
