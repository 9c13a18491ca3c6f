// cargo watch -x 'fmt' -x 'test'

//! IPv4/IPv6 subnet engine with a planner for sizing, VLSM and route
//! summarization.
//!
//! - [`models`] - Address parsing, masks and derived subnet records
//! - [`processing`] - Sizing, VLSM, summarization and network helpers
//! - [`output`] - Terminal and CSV rendering
//! - [`config`] - Defaults, JSON config file and environment overrides
//! - [`cli`] - Command line parsing and dispatch for the binary

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{Result, SubnetError};
pub use models::{Ipv4Cidr, SubnetV4, SubnetV6};
