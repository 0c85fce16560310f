//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → [routing decides the candidate]
//!     → transport.rs (HTTPS to the candidate, Host rewritten)
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod transport;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use transport::{TransportError, UpstreamTransport};
