//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound:  listener address → tls.rs (optional certificate/key) → HTTP layer
//! Outbound: tls.rs (client builder, no verification) → director / backends
//! ```
//!
//! # Design Decisions
//! - TLS on the listener is optional and handled transparently
//! - Outbound peers present self-signed certificates, so verification is off

pub mod tls;
