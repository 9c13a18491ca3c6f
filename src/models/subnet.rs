//! Derived subnet records.

use super::ipv4::{AddressType, IpClass, Ipv4Cidr};
use super::ipv6::{self, Ipv6Type};
use num_bigint::BigUint;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Every fact derivable from an IPv4 address and prefix.
///
/// Always produced by [`super::ipv4::derive_subnet`], so the fields are consistent
/// with each other.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetV4 {
    /// The address the record was derived from.
    pub address: Ipv4Addr,
    pub network: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub first_host: Ipv4Addr,
    pub last_host: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub prefix: u8,
    /// 2^(32-prefix), up to 2^32 for /0.
    pub total_hosts: u64,
    /// Total minus network and broadcast, except for /31 and /32.
    pub usable_hosts: u64,
    pub class: IpClass,
    pub address_type: AddressType,
}

impl SubnetV4 {
    /// The block as `network/prefix`.
    pub fn cidr(&self) -> Ipv4Cidr {
        Ipv4Cidr {
            addr: self.network,
            mask: self.prefix,
        }
    }

    /// The mask as 32 characters of `0`/`1`.
    pub fn binary_mask(&self) -> String {
        format!("{:032b}", u32::from(self.mask))
    }

    pub fn host_range(&self) -> String {
        format!("{} - {}", self.first_host, self.last_host)
    }
}

impl fmt::Display for SubnetV4 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Inclusive span of IPv4 addresses, not necessarily CIDR aligned.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl AddressRange {
    /// Number of addresses in the span; 0 if `end < start`.
    pub fn size(&self) -> u64 {
        let (start, end) = (u64::from(u32::from(self.start)), u64::from(u32::from(self.end)));
        if end < start {
            0
        } else {
            end - start + 1
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

fn compressed<S: Serializer>(addr: &Ipv6Addr, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ipv6::compress_bits(u128::from(*addr)))
}

fn decimal<S: Serializer>(count: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(count)
}

/// Facts for an IPv6 block. There is no broadcast, every address is usable.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubnetV6 {
    #[serde(serialize_with = "compressed")]
    pub address: Ipv6Addr,
    #[serde(serialize_with = "compressed")]
    pub network: Ipv6Addr,
    /// Highest address of the block.
    #[serde(serialize_with = "compressed")]
    pub last: Ipv6Addr,
    pub prefix: u8,
    #[serde(serialize_with = "decimal")]
    pub total_addresses: BigUint,
    #[serde(serialize_with = "decimal")]
    pub usable_addresses: BigUint,
    pub address_type: Ipv6Type,
}

impl SubnetV6 {
    pub fn first_host(&self) -> Ipv6Addr {
        self.network
    }

    pub fn host_range(&self) -> String {
        format!(
            "{} - {}",
            ipv6::compress_bits(u128::from(self.network)),
            ipv6::compress_bits(u128::from(self.last))
        )
    }
}

impl fmt::Display for SubnetV6 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            ipv6::compress_bits(u128::from(self.network)),
            self.prefix
        )
    }
}
