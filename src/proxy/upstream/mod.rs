// Upstream module - outbound HTTP to workload hosts

pub mod client;

pub use client::{UpstreamClient, UpstreamResponse};
