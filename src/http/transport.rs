//! Forwarding transport.
//!
//! # Responsibilities
//! - Send the inbound request to the chosen destination over TLS
//! - Stream request and response bodies
//! - Drop hop-by-hop headers, append `X-Forwarded-For`
//!
//! # Design Decisions
//! - One pooled client per (server name, address). DNS names are pinned
//!   with `resolve` so the logical host is the TLS server name while the
//!   connection goes to the candidate IP; IP literal hosts dial the
//!   candidate directly
//! - Clients for addresses that left the route table are dropped once the
//!   table moves to a new generation
//! - Certificates are not validated, redirects are not followed
//! - No retries

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::net::tls::insecure_client_builder;
use crate::routing::{Destination, RouteTable};

static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Errors while forwarding a request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("logical host '{0}' is not a valid Host header")]
    InvalidHost(String),
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    for name in &listed {
        headers.remove(name.as_str());
    }
}

/// Append the peer to `X-Forwarded-For`.
pub fn append_forwarded_for(headers: &mut HeaderMap, peer: IpAddr) {
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, peer),
        None => peer.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR.clone(), value);
    }
}

/// HTTPS transport to route candidates.
#[derive(Debug)]
pub struct UpstreamTransport {
    timeouts: TimeoutConfig,
    table: Arc<RouteTable>,
    clients: DashMap<(String, SocketAddr), reqwest::Client>,
    pruned_generation: AtomicU64,
}

impl UpstreamTransport {
    pub fn new(timeouts: TimeoutConfig, table: Arc<RouteTable>) -> Self {
        let generation = table.generation();
        Self {
            timeouts,
            table,
            clients: DashMap::new(),
            pruned_generation: AtomicU64::new(generation),
        }
    }

    /// Number of cached clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Drop clients whose address is no longer a candidate.
    fn prune_stale_clients(&self) {
        let generation = self.table.generation();
        if self.pruned_generation.swap(generation, Ordering::AcqRel) == generation {
            return;
        }

        let live = self.table.candidate_addresses();
        let before = self.clients.len();
        self.clients.retain(|(_, addr), _| live.contains(&addr.ip()));
        tracing::debug!(
            generation,
            evicted = before.saturating_sub(self.clients.len()),
            "Pruned upstream clients"
        );
    }

    fn client_for(&self, destination: &Destination) -> Result<reqwest::Client, TransportError> {
        self.prune_stale_clients();

        let server_name = destination.server_name();
        let key = (server_name, destination.addr);
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.value().clone());
        }

        let mut builder = insecure_client_builder(&self.timeouts);
        if destination.pins_server_name() {
            builder = builder.resolve(&key.0, destination.addr);
        }
        let client = builder.build().map_err(TransportError::Client)?;
        Ok(self.clients.entry(key).or_insert(client).value().clone())
    }

    /// Forward a request and return the backend's response.
    pub async fn forward(
        &self,
        destination: &Destination,
        request: Request<Body>,
        peer: SocketAddr,
    ) -> Result<Response<Body>, TransportError> {
        let client = self.client_for(destination)?;
        let (parts, body) = request.into_parts();
        let url = destination.upstream_url(parts.uri.path_and_query());

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        let host = HeaderValue::from_str(&destination.logical_host)
            .map_err(|_| TransportError::InvalidHost(destination.logical_host.clone()))?;
        headers.insert(header::HOST, host);
        append_forwarded_for(&mut headers, peer.ip());

        let mut outbound = client.request(parts.method, url).headers(headers);
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound.send().await.map_err(TransportError::Upstream)?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
