use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Workload entry exactly as it appears in the hosts document.
///
/// Every field is lenient so that one malformed entry does not reject the
/// whole document; validation happens when the registry is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadEntry {
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Workload name (first path segment) -> entry
pub type HostsConfig = BTreeMap<String, WorkloadEntry>;

/// Request handling strategy selected per workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Forward without authentication
    Open,
    /// Validate an Azure AD bearer token before forwarding
    AzureSecured,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Open => "example",
            ProviderKind::AzureSecured => "azureSecured",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, ProviderKind::AzureSecured)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "example" => Ok(ProviderKind::Open),
            "azureSecured" => Ok(ProviderKind::AzureSecured),
            other => Err(format!("Provider '{}' not found", other)),
        }
    }
}

/// Validated, routable workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub provider: ProviderKind,
    /// Bare hostname (optionally with port), no scheme
    pub host: String,
    pub kind: Option<String>,
}

impl TryFrom<&WorkloadEntry> for Workload {
    type Error = String;

    fn try_from(entry: &WorkloadEntry) -> Result<Self, Self::Error> {
        let provider = entry.provider.parse::<ProviderKind>()?;
        let host = entry
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "Missing host".to_string())?;

        Ok(Self {
            provider,
            host: host.to_string(),
            kind: entry.kind.clone(),
        })
    }
}
