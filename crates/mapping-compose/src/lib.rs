//! Mapping Compose - Higher-level building blocks for mapping graphs
//!
//! Helpers that assemble common shapes out of `mapping-engine` primitives:
//!
//! - [`chain`]: wire a sequence of nodes and sub-graphs end to end
//! - [`fan_out`]: apply one node to consecutive groups of another node's ports
//! - [`passthru_from`] / [`passthru_to`]: Expressions mirroring a node's ports

pub mod chain;
pub mod fan_out;
pub mod passthru;

pub use chain::chain;
pub use fan_out::fan_out;
pub use passthru::{passthru_from, passthru_to};
