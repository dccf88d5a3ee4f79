use serde::{Deserialize, Serialize};
use std::env;

pub const UNKNOWN: &str = "unknown";

/// Where this process is running, as reported by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodIdentity {
    pub pod_name: String,
    pub pod_ip: String,
    pub node_name: String,
}

impl PodIdentity {
    /// Read `HOSTNAME`, `POD_IP` and `NODE_NAME` from the live environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            pod_name: read("HOSTNAME"),
            pod_ip: read("POD_IP"),
            node_name: read("NODE_NAME"),
        }
    }
}
