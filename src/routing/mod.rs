//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route descriptors (at startup)
//!     → table.rs (RouteEntry per descriptor, empty candidates)
//!     → matcher.rs (exact OR prefix deployment matcher)
//!
//! Topology snapshot (every sync cycle)
//!     → table.rs update (rebuild and publish candidates)
//!
//! Incoming Request (Host header)
//!     → router.rs (host → table lookup)
//!     → Return: Destination or LookupError
//! ```
//!
//! # Design Decisions
//! - Entries are fixed at startup, candidates change at runtime
//! - Host match is verbatim, first match wins
//! - Explicit lookup error rather than silent default

pub mod matcher;
pub mod router;
pub mod table;

pub use router::{Destination, Router};
pub use table::{LookupError, RouteStatus, RouteTable};
