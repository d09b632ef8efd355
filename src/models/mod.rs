pub mod config;
pub mod identity;
pub mod workload;

pub use config::AppConfig;
pub use identity::Identity;
pub use workload::{HostsConfig, ProviderKind, Workload, WorkloadEntry};
