//! Director integration subsystem.
//!
//! # Data Flow
//! ```text
//! Client credentials (config / command line)
//!     → client.rs authenticate (POST /oauth/token)
//!     → client.rs fetch_topology
//!         GET /deployments
//!         GET /deployments/{name}/instances  (one per deployment)
//!     → types.rs Topology snapshot
//! ```
//!
//! # Security Constraints
//! - The client secret and access tokens are never logged
//! - Certificate validation is disabled for the control plane only

pub mod client;
pub mod types;

pub use client::{DirectorClient, DirectorEndpoints};
pub use types::{AccessToken, Deployment, DirectorError, DirectorResult, Instance, Topology};
