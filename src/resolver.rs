//! Picks the address of the Ollama backend for this process.
//!
//! Containers get the host alias, everything else gets loopback. The check is
//! done once at startup; a process that needs a different answer has to be
//! restarted.

use std::fmt;
use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};

use tracing::info;

pub const DEFAULT_MARKER_PATH: &str = "/.dockerenv";
pub const DEFAULT_CONTAINER_HOST_ALIAS: &str = "host.docker.internal";
pub const DEFAULT_LOOPBACK_HOST: &str = "localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Base URL of the chat backend, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint(String);

impl BackendEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait FsProbe {
    fn exists(&self, path: &Path) -> bool;
}

pub trait DnsProbe {
    fn resolves(&self, host: &str) -> bool;
}

impl<F: Fn(&Path) -> bool> FsProbe for F {
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

impl<F: Fn(&str) -> bool> DnsProbe for F {
    fn resolves(&self, host: &str) -> bool {
        self(host)
    }
}

/// Checks the real filesystem.
pub struct SystemFs;

impl FsProbe for SystemFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Uses the system resolver (hosts file, then DNS).
pub struct SystemDns;

impl DnsProbe for SystemDns {
    fn resolves(&self, host: &str) -> bool {
        (host, 0)
            .to_socket_addrs()
            .map(|mut addrs| addrs.next().is_some())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub marker_path: PathBuf,
    pub container_host_alias: String,
    pub loopback_host: String,
    pub port: u16,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            marker_path: PathBuf::from(DEFAULT_MARKER_PATH),
            container_host_alias: DEFAULT_CONTAINER_HOST_ALIAS.to_string(),
            loopback_host: DEFAULT_LOOPBACK_HOST.to_string(),
            port: DEFAULT_OLLAMA_PORT,
        }
    }
}

impl ResolverSettings {
    fn container_endpoint(&self) -> BackendEndpoint {
        BackendEndpoint(format!("http://{}:{}", self.container_host_alias, self.port))
    }

    fn loopback_endpoint(&self) -> BackendEndpoint {
        BackendEndpoint(format!("http://{}:{}", self.loopback_host, self.port))
    }
}

/// Choose the backend address.
///
/// The marker file wins over DNS, and DNS is only consulted when the marker
/// is absent. A failed lookup is the loopback branch, not an error.
pub fn resolve_backend_address(
    settings: &ResolverSettings,
    fs: &impl FsProbe,
    dns: &impl DnsProbe,
) -> BackendEndpoint {
    if fs.exists(&settings.marker_path) {
        let endpoint = settings.container_endpoint();
        info!(
            marker = %settings.marker_path.display(),
            %endpoint,
            "container marker found"
        );
        return endpoint;
    }

    if dns.resolves(&settings.container_host_alias) {
        let endpoint = settings.container_endpoint();
        info!(
            alias = %settings.container_host_alias,
            %endpoint,
            "container host alias resolves"
        );
        return endpoint;
    }

    let endpoint = settings.loopback_endpoint();
    info!(%endpoint, "no container detected, using loopback");
    endpoint
}
