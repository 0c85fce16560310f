//! Dynamic reverse proxy driven by director topology.
//!
//! Requests are routed by `Host` to instances that a deployment director
//! reports. A background task keeps the route table in step with the director.

// Core subsystems
pub mod config;
pub mod director;
pub mod http;
pub mod net;
pub mod routing;
pub mod sync;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use director::DirectorClient;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, StartupOptions};
pub use routing::{Router, RouteTable};
pub use sync::Syncer;
