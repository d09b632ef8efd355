use serde::{Deserialize, Serialize};

/// 反代服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// 是否允许局域网访问
    /// - false: 仅本机访问 127.0.0.1
    /// - true: 允许局域网访问 0.0.0.0（默认，容器部署）
    #[serde(default = "default_allow_lan_access")]
    pub allow_lan_access: bool,

    /// 监听端口
    pub port: u16,

    /// 上游请求超时时间(秒)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// 目标 URL 协议 (https / http)
    #[serde(default = "default_upstream_scheme")]
    pub upstream_scheme: String,

    /// 上游代理配置
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// 上游代理配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// 是否启用
    pub enabled: bool,
    /// 代理地址 (http://, https://, socks5://)
    pub url: String,
}

/// Azure AD bearer token validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureAdConfig {
    pub client_id: String,
    pub tenant_id: String,
    /// Expected `aud` claim, defaults to the client id
    pub audience: String,
    /// Host serving the OpenID discovery document
    pub authority_host: String,
    pub validate_issuer: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: default_allow_lan_access(),
            port: 8080,
            request_timeout: default_request_timeout(),
            upstream_scheme: default_upstream_scheme(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

impl Default for AzureAdConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tenant_id: String::new(),
            audience: String::new(),
            authority_host: "https://login.microsoftonline.com".to_string(),
            validate_issuer: true,
        }
    }
}

fn default_allow_lan_access() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    120
}

fn default_upstream_scheme() -> String {
    "https".to_string()
}

impl ProxyConfig {
    /// 获取实际的监听地址
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}

impl AzureAdConfig {
    /// v1 token issuer for the tenant
    pub fn issuer(&self) -> String {
        format!("https://sts.windows.net/{}/", self.tenant_id)
    }

    pub fn metadata_url(&self) -> String {
        format!(
            "{}/{}/v2.0/.well-known/openid-configuration",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = ProxyConfig::default();
        assert_eq!(config.get_bind_address(), "0.0.0.0");
        config.allow_lan_access = false;
        assert_eq!(config.get_bind_address(), "127.0.0.1");
    }

    #[test]
    fn test_azure_urls() {
        let config = AzureAdConfig {
            tenant_id: "tenant-1".to_string(),
            authority_host: "https://login.example.com/".to_string(),
            ..AzureAdConfig::default()
        };
        assert_eq!(config.issuer(), "https://sts.windows.net/tenant-1/");
        assert_eq!(
            config.metadata_url(),
            "https://login.example.com/tenant-1/v2.0/.well-known/openid-configuration"
        );
    }
}
