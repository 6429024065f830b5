//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → round_robin.rs (pick host index + issue request id)
//!     → work item carries the index to a worker
//!     → worker resolves the index against the fixed host list
//! ```
//!
//! # Design Decisions
//! - Host list is static, fixed at startup
//! - Pure round robin: no weights, no health-based exclusion
//! - Selection happens on the inbound side, independent of which worker
//!   ends up serving the request

pub mod round_robin;

pub use round_robin::{Assignment, HostSelector};
