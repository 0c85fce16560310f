//! Startup orchestration.
//!
//! # Responsibilities
//! - Parse the command line and merge it over the settings file
//! - Load and validate configuration
//! - Initialize subsystems in dependency order
//! - Start the route syncer and, optionally, the metrics endpoint
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener starts last; requests arriving before the first sync
//!   are rejected until routes have candidates

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::{validate_config, ValidationError};
use crate::config::{load_config, load_routes, ConfigError, ProxyConfig, RouteSource};
use crate::director::{DirectorClient, DirectorError};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls::load_tls_config;
use crate::observability::{logging, metrics};
use crate::routing::RouteTable;
use crate::sync::{SyncIntervals, Syncer};

/// Command line options.
#[derive(Debug, Clone, Parser)]
#[command(name = "director-proxy", version, about = "Reverse proxy routing hosts to director-managed instances")]
pub struct StartupOptions {
    /// Inline route configuration (JSON array).
    #[arg(short = 'c', long = "config", conflicts_with = "file")]
    pub config: Option<String>,

    /// Route configuration file (JSON array).
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// OAuth client id [default: ops_manager]
    #[arg(long = "client")]
    pub client: Option<String>,

    /// OAuth client secret.
    #[arg(long = "secret", env = "DIRECTOR_CLIENT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Director hostname or IP.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Enable debug logging.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Optional settings file (TOML).
    #[arg(long = "settings")]
    pub settings: Option<PathBuf>,

    /// Listener port on all interfaces.
    #[arg(long = "port", env = "PORT")]
    pub port: Option<u16>,
}

impl StartupOptions {
    /// Where the route descriptors come from.
    pub fn route_source(&self) -> Result<RouteSource, ConfigError> {
        match (&self.config, &self.file) {
            (Some(inline), _) => Ok(RouteSource::Inline(inline.clone())),
            (None, Some(path)) => Ok(RouteSource::File(path.clone())),
            (None, None) => Err(ConfigError::MissingRoutes),
        }
    }

    /// Apply command line values over the settings.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(client) = &self.client {
            config.director.client_id = client.clone();
        }
        if let Some(secret) = &self.secret {
            config.director.client_secret = secret.clone();
        }
        if let Some(host) = &self.host {
            config.director.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{}", port);
        }
    }

    /// Settings file (or defaults) with command line overrides applied.
    pub fn resolve_config(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.settings {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Director(#[from] DirectorError),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("Failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to load TLS certificate: {0}")]
    Tls(#[source] std::io::Error),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

fn socket_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(vec![ValidationError::BindAddress(value.to_string())]))
}

/// Start every subsystem and serve until shutdown.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = options.resolve_config()?;
    logging::init_logging(&config.observability, options.debug)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "director-proxy starting");

    let routes = load_routes(&options.route_source()?)?;
    let table = Arc::new(RouteTable::load(&routes)?);
    let address = socket_addr(&config.listener.bind_address)?;

    tracing::info!(
        bind_address = %address,
        routes = table.len(),
        director_host = %config.director.host,
        client_id = %config.director.client_id,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    let director = DirectorClient::new(&config.director, &config.timeouts)?;
    let syncer = Syncer::new(director, Arc::clone(&table), SyncIntervals::from_config(&config.sync));
    let sync_task = tokio::spawn(syncer.run());

    if config.observability.metrics_enabled {
        metrics::init_metrics(socket_addr(&config.observability.metrics_address)?)?;
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { signals::shutdown_on_signal(&signal_shutdown).await });

    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config, table);
    let served = match tls {
        Some(tls) => {
            let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path))
                .await
                .map_err(StartupError::Tls)?;
            server.run_tls(address, rustls, server_shutdown).await
        }
        None => {
            let listener = TcpListener::bind(address)
                .await
                .map_err(|source| StartupError::Bind { address, source })?;
            server.run(listener, server_shutdown).await
        }
    };

    sync_task.abort();
    served.map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
