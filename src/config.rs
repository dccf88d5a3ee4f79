use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::warn;

use crate::error::GatewayError;
use crate::proxy::DEFAULT_MODEL;
use crate::resolver::{
    BackendEndpoint, ResolverSettings, DEFAULT_CONTAINER_HOST_ALIAS, DEFAULT_LOOPBACK_HOST, DEFAULT_MARKER_PATH,
    DEFAULT_OLLAMA_PORT,
};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// How `/generate` reports a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureStatus {
    /// 200 with an `error` body.
    #[default]
    Ok,
    /// 502 with the same body.
    BadGateway,
}

impl FailureStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ok" | "200" => Some(FailureStatus::Ok),
            "bad_gateway" | "bad-gateway" | "502" => Some(FailureStatus::BadGateway),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub ollama_host: Option<String>,
    pub ollama_model: String,
    pub deterministic: bool,
    pub request_timeout: Duration,
    pub resolver: ResolverSettings,
    pub include_pod_info: bool,
    pub failure_status: FailureStatus,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unparseable values
    /// keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            listen_addr: var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            ollama_host: var("OLLAMA_HOST"),
            ollama_model: var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            deterministic: parse_or(
                "OLLAMA_DETERMINISTIC",
                var("OLLAMA_DETERMINISTIC"),
                parse_bool,
                false,
            ),
            request_timeout: Duration::from_secs(parse_or(
                "OLLAMA_TIMEOUT_SECS",
                var("OLLAMA_TIMEOUT_SECS"),
                |s| s.parse::<u64>().ok().filter(|&n| n > 0),
                DEFAULT_TIMEOUT_SECS,
            )),
            resolver: ResolverSettings {
                marker_path: PathBuf::from(
                    var("CONTAINER_MARKER_PATH").unwrap_or_else(|| DEFAULT_MARKER_PATH.to_string()),
                ),
                container_host_alias: var("CONTAINER_HOST_ALIAS")
                    .unwrap_or_else(|| DEFAULT_CONTAINER_HOST_ALIAS.to_string()),
                loopback_host: DEFAULT_LOOPBACK_HOST.to_string(),
                port: parse_or(
                    "OLLAMA_PORT",
                    var("OLLAMA_PORT"),
                    |s| s.parse::<u16>().ok(),
                    DEFAULT_OLLAMA_PORT,
                ),
            },
            include_pod_info: parse_or(
                "INCLUDE_POD_INFO",
                var("INCLUDE_POD_INFO"),
                parse_bool,
                true,
            ),
            failure_status: parse_or(
                "FAILURE_STATUS",
                var("FAILURE_STATUS"),
                FailureStatus::parse,
                FailureStatus::Ok,
            ),
        }
    }

    /// The `OLLAMA_HOST` override as a backend URL, if one was given.
    pub fn ollama_endpoint(&self) -> Result<Option<BackendEndpoint>, GatewayError> {
        self.ollama_host.as_deref().map(parse_ollama_host).transpose()
    }
}

/// Accept `OLLAMA_HOST` in the forms Ollama itself does: a full URL or a bare
/// `host[:port]`. A missing scheme means `http`, a missing port means 11434.
pub fn parse_ollama_host(raw: &str) -> Result<BackendEndpoint, GatewayError> {
    let invalid = |reason: String| GatewayError::InvalidHost {
        value: raw.to_string(),
        reason,
    };

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let mut url = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if url.port().is_none() && url.scheme() == "http" {
        url.set_port(Some(DEFAULT_OLLAMA_PORT))
            .map_err(|_| invalid("cannot set port".to_string()))?;
    }

    Ok(BackendEndpoint::new(url.as_str().trim_end_matches('/')))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T: std::fmt::Debug>(
    name: &str,
    raw: Option<String>,
    parse: impl Fn(&str) -> Option<T>,
    default: T,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            warn!(variable = name, value = %raw, ?default, "ignoring invalid value");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = config_with(&[]);
        assert_eq!(cfg.listen_addr, "0.0.0.0:8000");
        assert_eq!(cfg.ollama_host, None);
        assert_eq!(cfg.ollama_model, "llama3.1:8b");
        assert!(!cfg.deterministic);
        assert_eq!(cfg.request_timeout, Duration::from_secs(120));
        assert_eq!(cfg.resolver.marker_path, PathBuf::from("/.dockerenv"));
        assert_eq!(cfg.resolver.container_host_alias, "host.docker.internal");
        assert_eq!(cfg.resolver.port, 11434);
        assert!(cfg.include_pod_info);
        assert_eq!(cfg.failure_status, FailureStatus::Ok);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_with(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("OLLAMA_HOST", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", "qwen2.5:7b"),
            ("OLLAMA_DETERMINISTIC", "yes"),
            ("OLLAMA_TIMEOUT_SECS", "5"),
            ("OLLAMA_PORT", "11500"),
            ("CONTAINER_MARKER_PATH", "/run/.containerenv"),
            ("CONTAINER_HOST_ALIAS", "host.containers.internal"),
            ("INCLUDE_POD_INFO", "false"),
            ("FAILURE_STATUS", "bad_gateway"),
        ]);
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
        assert_eq!(cfg.ollama_host.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(cfg.ollama_model, "qwen2.5:7b");
        assert!(cfg.deterministic);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.resolver.port, 11500);
        assert_eq!(cfg.resolver.marker_path, PathBuf::from("/run/.containerenv"));
        assert_eq!(cfg.resolver.container_host_alias, "host.containers.internal");
        assert!(!cfg.include_pod_info);
        assert_eq!(cfg.failure_status, FailureStatus::BadGateway);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let cfg = config_with(&[
            ("OLLAMA_DETERMINISTIC", "maybe"),
            ("OLLAMA_TIMEOUT_SECS", "0"),
            ("OLLAMA_PORT", "not-a-port"),
            ("FAILURE_STATUS", "teapot"),
        ]);
        assert!(!cfg.deterministic);
        assert_eq!(cfg.request_timeout, Duration::from_secs(120));
        assert_eq!(cfg.resolver.port, 11434);
        assert_eq!(cfg.failure_status, FailureStatus::Ok);
    }

    #[test]
    fn blank_ollama_host_counts_as_unset() {
        let cfg = config_with(&[("OLLAMA_HOST", "   ")]);
        assert_eq!(cfg.ollama_host, None);
    }

    #[test]
    fn ollama_host_without_scheme_gets_http() {
        let cfg = config_with(&[("OLLAMA_HOST", "127.0.0.1:11500")]);
        let endpoint = cfg.ollama_endpoint().unwrap().unwrap();
        assert_eq!(endpoint.as_str(), "http://127.0.0.1:11500");

        let endpoint = parse_ollama_host("gpu-box").unwrap();
        assert_eq!(endpoint.as_str(), "http://gpu-box:11434");
    }

    #[test]
    fn ollama_host_full_url_is_kept() {
        let endpoint = parse_ollama_host("https://ollama.internal/").unwrap();
        assert_eq!(endpoint.as_str(), "https://ollama.internal");

        let endpoint = parse_ollama_host("http://gpu-box:11434").unwrap();
        assert_eq!(endpoint.as_str(), "http://gpu-box:11434");
    }

    #[test]
    fn unparseable_ollama_host_is_an_error() {
        let cfg = config_with(&[("OLLAMA_HOST", "gpu box:11434")]);
        assert!(matches!(
            cfg.ollama_endpoint(),
            Err(GatewayError::InvalidHost { .. })
        ));

        assert!(matches!(
            parse_ollama_host("ftp://gpu-box:11434"),
            Err(GatewayError::InvalidHost { .. })
        ));
        assert!(matches!(
            parse_ollama_host("127.0.0.1:not-a-port"),
            Err(GatewayError::InvalidHost { .. })
        ));
    }

    #[test]
    fn no_ollama_host_means_no_override() {
        assert!(config_with(&[]).ollama_endpoint().unwrap().is_none());
    }

    #[test]
    fn failure_status_accepts_numeric_codes() {
        assert_eq!(FailureStatus::parse("502"), Some(FailureStatus::BadGateway));
        assert_eq!(FailureStatus::parse("200"), Some(FailureStatus::Ok));
    }
}
