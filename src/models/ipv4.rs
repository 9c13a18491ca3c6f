//! IPv4 address and CIDR notation utilities.
//!
//! Provides strict text parsing, mask/prefix conversion, classification and the
//! [`Ipv4Cidr`] network type, along with helper functions for block arithmetic.

use super::subnet::SubnetV4;
use crate::error::{Result, SubnetError};
use itertools::Itertools;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Parse dotted-decimal text into its 32-bit value.
///
/// Only canonical text is accepted: exactly four fields, each a base-10 number
/// in `0..=255` without sign, whitespace or leading zeros.
///
/// # Examples
/// ```
/// use subnet_toolkit::models::ipv4::parse_address;
/// assert_eq!(parse_address("192.168.1.10").unwrap(), 0xC0A8010A);
/// assert!(parse_address("192.168.001.1").is_err());
/// ```
pub fn parse_address(text: &str) -> Result<u32> {
    let bad = || SubnetError::InvalidFormat(text.to_string());
    let mut bits: u32 = 0;
    let mut fields = 0;
    for part in text.split('.') {
        fields += 1;
        if fields > 4 {
            return Err(bad());
        }
        let octet = parse_octet(part).ok_or_else(bad)?;
        bits = (bits << 8) | u32::from(octet);
    }
    if fields != 4 {
        return Err(bad());
    }
    Ok(bits)
}

fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // "0" is canonical, "00" and "010" are not
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

/// Format a 32-bit value as canonical dotted-decimal text.
pub fn format_address(bits: u32) -> String {
    Ipv4Addr::from(bits).to_string()
}

/// Parse a bare prefix length such as `24` (no slash) bounded by `max`.
pub(crate) fn parse_prefix(text: &str, max: u8) -> Result<u8> {
    if text.is_empty() || text.len() > 3 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SubnetError::prefix(text, max));
    }
    match text.parse::<u8>() {
        Ok(prefix) if prefix <= max => Ok(prefix),
        _ => Err(SubnetError::prefix(text, max)),
    }
}

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use subnet_toolkit::models::ipv4::cidr_to_mask;
/// assert_eq!(cidr_to_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn cidr_to_mask(len: u8) -> Result<u32> {
    if len > MAX_LENGTH {
        Err(SubnetError::prefix(len, MAX_LENGTH))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u64::from(u32::MAX);

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Mask bits for a prefix already known to be in range.
pub(crate) fn mask_bits(len: u8) -> u32 {
    u32::MAX
        .checked_shl(u32::from(MAX_LENGTH - len.min(MAX_LENGTH)))
        .unwrap_or(0)
}

/// Convert a mask back to its prefix length.
///
/// Fails with [`SubnetError::InvalidMask`] unless the ones form a single run
/// starting at the most significant bit.
pub fn mask_to_cidr(mask: u32) -> Result<u8> {
    let ones = mask.leading_ones();
    if ones + mask.trailing_zeros() != u32::from(MAX_LENGTH) {
        return Err(SubnetError::InvalidMask(format_address(mask)));
    }
    Ok(ones as u8)
}

/// Parse mask input given either as `/24` or as `255.255.255.0`.
pub fn parse_mask(text: &str) -> Result<u8> {
    match text.strip_prefix('/') {
        Some(prefix) => parse_prefix(prefix, MAX_LENGTH),
        None => {
            let mask =
                parse_address(text).map_err(|_| SubnetError::InvalidMask(text.to_string()))?;
            mask_to_cidr(mask)
        }
    }
}

/// Cisco style wildcard: the bitwise complement of the mask.
pub fn wildcard_mask(mask: u32) -> u32 {
    !mask
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    let mask = cidr_to_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    let mask = cidr_to_mask(len)?;
    let network_bits = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network_bits | !mask))
}

/// Returns the first address after the block of size `/cidr` holding `addr`.
pub fn ip_after_subnet(addr: Ipv4Addr, cidr: u8) -> Result<Ipv4Addr> {
    let network_bits = u32::from(addr) & cidr_to_mask(cidr)?;
    let subnet_size = 1u64 << (MAX_LENGTH - cidr);
    let next = u64::from(network_bits) + subnet_size;
    u32::try_from(next).map(Ipv4Addr::from).map_err(|_| {
        SubnetError::AddressSpaceExhausted(format!(
            "no /{cidr} block follows {}",
            Ipv4Addr::from(network_bits)
        ))
    })
}

/// Smallest prefix for which `ip` is still a valid network address.
pub fn lo_mask(ip: Ipv4Addr) -> u8 {
    let trailing_zeros = u32::from(ip).trailing_zeros().min(u32::from(MAX_LENGTH));
    MAX_LENGTH - trailing_zeros as u8
}

/// Dotted binary, e.g. `11000000.10101000.00000001.00000001`.
pub fn to_binary(bits: u32) -> String {
    bits.to_be_bytes()
        .iter()
        .map(|octet| format!("{octet:08b}"))
        .join(".")
}

/// Eight uppercase hex digits, e.g. `C0A80101`.
pub fn to_hex(bits: u32) -> String {
    format!("{bits:08X}")
}

/// Parse eight hex digits (optionally prefixed with `0x`) into an address.
pub fn from_hex(text: &str) -> Result<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SubnetError::InvalidFormat(text.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| SubnetError::InvalidFormat(text.to_string()))
}

/// Traditional classful category, decided by the leading octet only.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpClass {
    A,
    B,
    C,
    D,
    E,
    /// `0.x.x.x` and `127.x.x.x` belong to no class.
    Unknown,
}

impl fmt::Display for IpClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            IpClass::A => "A",
            IpClass::B => "B",
            IpClass::C => "C",
            IpClass::D => "D (Multicast)",
            IpClass::E => "E (Experimental)",
            IpClass::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Usage category from the RFC 1918 / 3927 / 5735 range tables.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Private,
    Loopback,
    LinkLocal,
    Multicast,
    Reserved,
    Public,
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AddressType::Private => "Private",
            AddressType::Loopback => "Loopback",
            AddressType::LinkLocal => "Link-local",
            AddressType::Multicast => "Multicast",
            AddressType::Reserved => "Reserved",
            AddressType::Public => "Public",
        };
        f.write_str(name)
    }
}

/// Classful category of an address. Loopback is a type, not a class.
pub fn classify(addr: u32) -> IpClass {
    match addr >> 24 {
        1..=126 => IpClass::A,
        128..=191 => IpClass::B,
        192..=223 => IpClass::C,
        224..=239 => IpClass::D,
        240..=255 => IpClass::E,
        _ => IpClass::Unknown,
    }
}

fn in_block(addr: u32, network: [u8; 4], len: u8) -> bool {
    addr & mask_bits(len) == u32::from_be_bytes(network)
}

/// Usage category of an address.
pub fn address_type(addr: u32) -> AddressType {
    if in_block(addr, [10, 0, 0, 0], 8)
        || in_block(addr, [172, 16, 0, 0], 12)
        || in_block(addr, [192, 168, 0, 0], 16)
    {
        AddressType::Private
    } else if in_block(addr, [127, 0, 0, 0], 8) {
        AddressType::Loopback
    } else if in_block(addr, [169, 254, 0, 0], 16) {
        AddressType::LinkLocal
    } else if in_block(addr, [224, 0, 0, 0], 4) {
        AddressType::Multicast
    } else if in_block(addr, [240, 0, 0, 0], 4) {
        AddressType::Reserved
    } else {
        AddressType::Public
    }
}

/// Derive every subnet fact for `address` inside a `/prefix` block.
pub fn derive_subnet(address: u32, prefix: u8) -> Result<SubnetV4> {
    if prefix > MAX_LENGTH {
        return Err(SubnetError::prefix(prefix, MAX_LENGTH));
    }
    Ok(build_subnet(address, prefix))
}

/// Text front end for [`derive_subnet`]: address plus `/n` or dotted mask.
pub fn derive_subnet_str(address: &str, mask: &str) -> Result<SubnetV4> {
    let address = parse_address(address)?;
    let prefix = parse_mask(mask)?;
    derive_subnet(address, prefix)
}

/// `prefix` must already be validated.
pub(crate) fn build_subnet(address: u32, prefix: u8) -> SubnetV4 {
    let mask = mask_bits(prefix);
    let network = address & mask;
    let broadcast = network | !mask;
    let total_hosts = 1u64 << (MAX_LENGTH - prefix);
    // /31 and /32 have no network/broadcast exclusion
    let (first_host, last_host, usable_hosts) = if total_hosts > 2 {
        (network + 1, broadcast - 1, total_hosts - 2)
    } else {
        (network, broadcast, total_hosts)
    };
    SubnetV4 {
        address: Ipv4Addr::from(address),
        network: Ipv4Addr::from(network),
        broadcast: Ipv4Addr::from(broadcast),
        first_host: Ipv4Addr::from(first_host),
        last_host: Ipv4Addr::from(last_host),
        mask: Ipv4Addr::from(mask),
        wildcard: Ipv4Addr::from(wildcard_mask(mask)),
        prefix,
        total_hosts,
        usable_hosts,
        class: classify(address),
        address_type: address_type(address),
    }
}

/// IPv4 network in CIDR notation.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Ipv4Cidr {
    /// The IPv4 address (not necessarily the network address).
    pub addr: Ipv4Addr,
    /// The prefix length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4Cidr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4Cidr {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Ipv4Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4Cidr::new(&s).map_err(de::Error::custom)
    }
}

impl Ipv4Cidr {
    /// Create a new [`Ipv4Cidr`] from a CIDR string (e.g., "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<Ipv4Cidr> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| SubnetError::InvalidFormat(addr_cidr.to_string()))?;
        let addr = parse_address(addr)?;
        let mask = parse_prefix(mask, MAX_LENGTH)?;
        Ok(Ipv4Cidr {
            addr: Ipv4Addr::from(addr),
            mask,
        })
    }

    /// Build from raw parts, rejecting prefixes above 32.
    pub fn from_parts(addr: u32, mask: u8) -> Result<Ipv4Cidr> {
        if mask > MAX_LENGTH {
            return Err(SubnetError::prefix(mask, MAX_LENGTH));
        }
        Ok(Ipv4Cidr {
            addr: Ipv4Addr::from(addr),
            mask,
        })
    }

    /// Same block with host bits cleared.
    pub fn network(&self) -> Ipv4Cidr {
        Ipv4Cidr {
            addr: self.lo(),
            mask: self.mask,
        }
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.lo_bits())
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.hi_bits())
    }

    pub fn lo_bits(&self) -> u32 {
        u32::from(self.addr) & mask_bits(self.mask)
    }

    pub fn hi_bits(&self) -> u32 {
        self.lo_bits() | !mask_bits(self.mask)
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask.min(MAX_LENGTH))
    }

    /// Check if an IP address is contained within this subnet.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        ip >= self.lo() && ip <= self.hi()
    }

    /// True when `other` lies entirely inside this block.
    pub fn covers(&self, other: &Ipv4Cidr) -> bool {
        other.lo_bits() >= self.lo_bits() && other.hi_bits() <= self.hi_bits()
    }

    /// The next block of the same size.
    pub fn next(&self) -> Result<Ipv4Cidr> {
        let addr = ip_after_subnet(self.addr, self.mask)?;
        Ok(Ipv4Cidr {
            addr,
            mask: self.mask,
        })
    }

    /// All derived facts for this block.
    pub fn subnet(&self) -> SubnetV4 {
        build_subnet(u32::from(self.addr), self.mask.min(MAX_LENGTH))
    }
}

impl FromStr for Ipv4Cidr {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self> {
        Ipv4Cidr::new(s)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}
