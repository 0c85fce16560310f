//! TLS configuration for the listener and for outbound connections.

use std::path::Path;
use std::time::Duration;
use axum_server::tls_rustls::RustlsConfig;

use crate::config::TimeoutConfig;

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Client builder for the internal control plane and backends.
///
/// Certificate validation is disabled: the director and the job instances
/// present certificates issued by an internal CA that the proxy does not
/// carry. The reqwest connect phase covers both the TCP connect and the TLS
/// handshake, so the two budgets are added together.
pub fn insecure_client_builder(timeouts: &TimeoutConfig) -> reqwest::ClientBuilder {
    let connect_budget = Duration::from_secs(timeouts.connect_secs + timeouts.tls_handshake_secs);

    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .connect_timeout(connect_budget)
        .redirect(reqwest::redirect::Policy::none())
}
