//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → command line overrides (lifecycle::startup)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! route config (JSON file or inline string)
//!     → loader.rs (parse)
//!     → validation.rs (descriptor checks)
//!     → RouteDescriptor[] → RouteTable
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes are never added or removed
//! - All settings fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any config error is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_routes, ConfigError, RouteSource};
pub use schema::{
    DirectorConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    RouteDescriptor, SyncConfig, TimeoutConfig, TlsConfig, UpstreamConfig,
};
