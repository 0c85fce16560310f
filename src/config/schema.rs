//! Configuration schema definitions.
//!
//! This module defines the settings structure for the proxy and the route
//! descriptor format. Settings derive Serde traits for deserialization from a
//! TOML file; route descriptors are read from JSON.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Director connection and credentials.
    pub director: DirectorConfig,

    /// Adaptive sync intervals.
    pub sync: SyncConfig,

    /// Settings for the outbound connection to backends.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Director connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Director hostname or IP.
    pub host: String,

    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Port of the OAuth token endpoint.
    pub auth_port: u16,

    /// Port of the director API.
    pub api_port: u16,

    /// Full base URL of the token endpoint host. Overrides `host`/`auth_port`.
    pub auth_url: Option<String>,

    /// Full base URL of the director API. Overrides `host`/`api_port`.
    pub api_url: Option<String>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            client_id: "ops_manager".to_string(),
            client_secret: String::new(),
            auth_port: 8443,
            api_port: 25555,
            auth_url: None,
            api_url: None,
        }
    }
}

/// Sync loop intervals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval used while any route has no candidates, in seconds.
    pub degraded_interval_secs: u64,

    /// Interval used once every route is populated, in seconds.
    pub normal_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            degraded_interval_secs: 60,
            normal_interval_secs: 300,
        }
    }
}

/// Outbound connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Port the backends accept HTTPS on.
    pub port: u16,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { port: 443 }
    }
}

/// Timeout configuration for outbound connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// TLS handshake timeout in seconds.
    pub tls_handshake_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            tls_handshake_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One route descriptor as written in the route configuration.
///
/// ```json
/// [{"route": "myhostname.domain", "deployment-prefix": "cf", "job": "router"}]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// External hostname matched against the Host header.
    #[serde(default)]
    pub route: String,

    /// Exact deployment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    /// Deployment name prefix.
    #[serde(
        default,
        rename = "deployment-prefix",
        skip_serializing_if = "Option::is_none"
    )]
    pub deployment_prefix: Option<String>,

    /// Job name whose instance addresses back the route.
    #[serde(default)]
    pub job: String,
}
