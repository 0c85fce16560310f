//! Request-time routing decision.
//!
//! # Responsibilities
//! - Read the logical host from an inbound request
//! - Look it up in the route table
//! - Describe where and how the request must be forwarded
//!
//! # Design Decisions
//! - Outbound scheme is always HTTPS
//! - The logical host is kept as Host header and TLS server name, the network
//!   destination is the chosen candidate
//! - Lookup failure is returned to the caller, never a default destination

use axum::http::{header, uri::Authority, uri::PathAndQuery, Request};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use crate::routing::table::{LookupError, RouteTable};

/// Outbound scheme for every forwarded request.
pub const UPSTREAM_SCHEME: &str = "https";

/// Where a request is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Host header of the inbound request, forwarded unchanged.
    pub logical_host: String,
    /// Candidate address and backend port.
    pub addr: SocketAddr,
}

impl Destination {
    /// Host part of the logical host, lowercased, for the URL and SNI.
    pub fn server_name(&self) -> String {
        match Authority::from_str(&self.logical_host) {
            Ok(authority) => authority.host().to_ascii_lowercase(),
            Err(_) => self.logical_host.to_ascii_lowercase(),
        }
    }

    /// Whether the logical host is a DNS name that must be pinned to `addr`.
    ///
    /// An IP literal carries no server name, so the URL names `addr` directly.
    pub fn pins_server_name(&self) -> bool {
        let name = self.server_name();
        let bare = name.trim_start_matches('[').trim_end_matches(']');
        bare.parse::<IpAddr>().is_err()
    }

    /// URL of the outbound request.
    ///
    /// For DNS names the authority is the logical host so TLS presents it
    /// as server name, and the transport pins that name to `addr`. For IP
    /// literals the authority is `addr` itself.
    pub fn upstream_url(&self, path_and_query: Option<&PathAndQuery>) -> String {
        let path = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
        if self.pins_server_name() {
            format!(
                "{}://{}:{}{}",
                UPSTREAM_SCHEME,
                self.server_name(),
                self.addr.port(),
                path
            )
        } else {
            format!("{}://{}{}", UPSTREAM_SCHEME, self.addr, path)
        }
    }
}

/// Extract the logical host of a request.
///
/// HTTP/1.1 carries it in the Host header, HTTP/2 in the URI authority.
pub fn request_host<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(Authority::as_str))
}

/// Routes requests using the shared route table.
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
    backend_port: u16,
}

impl Router {
    pub fn new(table: Arc<RouteTable>, backend_port: u16) -> Self {
        Self { table, backend_port }
    }

    /// Resolve the destination for a logical host.
    pub fn route(&self, host: &str) -> Result<Destination, LookupError> {
        let ip: IpAddr = self.table.lookup(host)?;
        Ok(Destination {
            logical_host: host.to_string(),
            addr: SocketAddr::new(ip, self.backend_port),
        })
    }

    /// Resolve the destination for a request.
    pub fn route_request<B>(&self, request: &Request<B>) -> Result<Destination, LookupError> {
        let host = request_host(request).ok_or_else(|| LookupError::NoRoute {
            host: String::new(),
        })?;
        self.route(host)
    }
}
