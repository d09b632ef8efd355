// proxy module - workload reverse proxy service

pub mod azure_ad;
pub mod config;
pub mod registry;
pub mod server;

pub mod common; // Path and query tools
pub mod handlers; // HTTP endpoint handlers
pub mod middleware; // Axum middleware
pub mod upstream; // Upstream client

pub use config::ProxyConfig;
pub use registry::WorkloadRegistry;
pub use server::{AppState, AxumServer};
