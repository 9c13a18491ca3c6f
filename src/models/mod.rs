//! Address engines and the records they derive.
//!
//! - [`ipv4`] - strict IPv4 parsing, masks, classification and [`Ipv4Cidr`]
//! - [`ipv6`] - hextet text handling and 128-bit block arithmetic
//! - [`subnet`] - the [`SubnetV4`] and [`SubnetV6`] records
//!
//! Nothing in here logs or panics; every failure is a [`crate::SubnetError`].

pub mod ipv4;
pub mod ipv6;
mod subnet;

// Re-export public types
pub use ipv4::{AddressType, IpClass, Ipv4Cidr};
pub use ipv6::Ipv6Type;
pub use subnet::{AddressRange, SubnetV4, SubnetV6};
