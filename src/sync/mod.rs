//! Route synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! Every cycle:
//!     route table emptiness → interval.rs (Degraded | Normal)
//!     → syncer.rs: authenticate + fetch topology (director)
//!     → RouteTable::update on success, log on failure
//!     → sleep for the interval chosen at the start of the cycle
//! ```
//!
//! # Design Decisions
//! - Mode recomputed every cycle from current contents, no history
//! - No jitter, no backoff, no termination
//! - Failures never touch the table (last-known-good)

pub mod interval;
pub mod syncer;

pub use interval::{select_mode, SyncIntervals, SyncMode};
pub use syncer::{Syncer, TopologySource};
