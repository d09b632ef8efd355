use std::collections::BTreeMap;
use tracing::{error, info};

use crate::models::{HostsConfig, Workload};

/// Paths owned by the gateway itself
pub const RESERVED_NAMES: &[&str] = &["config", "secure", "healthz"];

/// Validated workloads, built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct WorkloadRegistry {
    workloads: BTreeMap<String, Workload>,
}

impl WorkloadRegistry {
    /// Validate every hosts entry; invalid ones are logged and left out
    pub fn from_hosts(hosts: &HostsConfig) -> Self {
        let mut workloads = BTreeMap::new();

        for (name, entry) in hosts {
            let validated = validate_name(name).and_then(|_| Workload::try_from(entry));
            match validated {
                Ok(workload) => {
                    info!(
                        "Workload registered: {} -> {} (provider: {})",
                        name, workload.host, workload.provider
                    );
                    workloads.insert(name.clone(), workload);
                }
                Err(e) => {
                    error!("Skipping workload '{}': {}", name, e);
                }
            }
        }

        Self { workloads }
    }

    pub fn get(&self, name: &str) -> Option<&Workload> {
        self.workloads.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Workload)> {
        self.workloads.iter()
    }

    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }
}

/// Workload names become the first path segment of their routes
fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Empty workload name".to_string());
    }
    if name.contains(['/', ':', '*']) {
        return Err(format!("Invalid path segment '{}'", name));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(format!("'{}' is a reserved route", name));
    }
    Ok(())
}
