//! IPv6 address text handling and 128-bit block arithmetic.

use super::ipv4::parse_prefix;
use super::subnet::SubnetV6;
use crate::error::{Result, SubnetError};
use itertools::Itertools;
use num_bigint::BigUint;
use serde::Serialize;
use std::fmt;
use std::net::Ipv6Addr;

/// Maximum IPv6 prefix length.
pub const MAX_LENGTH: u8 = 128;

fn parse_hextet(group: &str) -> Option<u16> {
    if group.is_empty() || group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(group, 16).ok()
}

fn split_groups(part: &str) -> Option<Vec<u16>> {
    if part.is_empty() {
        return Some(Vec::new());
    }
    part.split(':').map(parse_hextet).collect()
}

/// Parse full or `::` shortened text into eight hextets.
fn parse_groups(text: &str) -> Result<[u16; 8]> {
    let bad = || SubnetError::InvalidFormat(text.to_string());
    let (head, tail) = match text.find("::") {
        Some(pos) => {
            let rest = &text[pos + 2..];
            if rest.contains("::") {
                return Err(bad());
            }
            (&text[..pos], Some(rest))
        }
        None => (text, None),
    };

    let left = split_groups(head).ok_or_else(bad)?;
    let mut groups = [0u16; 8];
    match tail {
        None => {
            if left.len() != 8 {
                return Err(bad());
            }
            groups.copy_from_slice(&left);
        }
        Some(tail) => {
            let right = split_groups(tail).ok_or_else(bad)?;
            // "::" has to stand for at least one zero group
            if left.len() + right.len() > 7 {
                return Err(bad());
            }
            groups[..left.len()].copy_from_slice(&left);
            groups[8 - right.len()..].copy_from_slice(&right);
        }
    }
    Ok(groups)
}

fn groups_of(bits: u128) -> [u16; 8] {
    let mut groups = [0u16; 8];
    for (i, group) in groups.iter_mut().enumerate() {
        *group = (bits >> (112 - 16 * i)) as u16;
    }
    groups
}

/// Parse IPv6 text into its 128-bit value.
pub fn to_bits(text: &str) -> Result<u128> {
    let groups = parse_groups(text)?;
    Ok(groups
        .iter()
        .fold(0u128, |acc, group| (acc << 16) | u128::from(*group)))
}

/// Expanded form: eight groups of four lowercase hex digits.
pub fn from_bits(bits: u128) -> String {
    groups_of(bits)
        .iter()
        .map(|group| format!("{group:04x}"))
        .join(":")
}

/// Expand `::` and pad every group to four digits.
///
/// # Examples
/// ```
/// use subnet_toolkit::models::ipv6::expand;
/// assert_eq!(expand("2001:db8::1").unwrap(), "2001:0db8:0000:0000:0000:0000:0000:0001");
/// ```
pub fn expand(text: &str) -> Result<String> {
    Ok(from_bits(to_bits(text)?))
}

/// Shortest text form of an address.
pub fn compress(text: &str) -> Result<String> {
    Ok(compress_bits(to_bits(text)?))
}

/// The longest run of two or more zero groups becomes `::`, leftmost on a tie.
pub fn compress_bits(bits: u128) -> String {
    let groups = groups_of(bits);

    let mut best: Option<(usize, usize)> = None;
    let mut i = 0;
    while i < groups.len() {
        if groups[i] != 0 {
            i += 1;
            continue;
        }
        let start = i;
        while i < groups.len() && groups[i] == 0 {
            i += 1;
        }
        let len = i - start;
        if len >= 2 && best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((start, len));
        }
    }

    let hex = |part: &[u16]| part.iter().map(|group| format!("{group:x}")).join(":");
    match best {
        None => hex(&groups),
        Some((start, len)) => format!(
            "{}::{}",
            hex(&groups[..start]),
            hex(&groups[start + len..])
        ),
    }
}

/// 128 characters of `0`/`1`.
pub fn to_binary(bits: u128) -> String {
    format!("{bits:0128b}")
}

pub(crate) fn mask_bits(prefix: u8) -> u128 {
    u128::MAX
        .checked_shl(u32::from(MAX_LENGTH - prefix.min(MAX_LENGTH)))
        .unwrap_or(0)
}

/// Network mask for a prefix length.
pub fn prefix_mask(prefix: u8) -> Result<u128> {
    if prefix > MAX_LENGTH {
        return Err(SubnetError::prefix(prefix, MAX_LENGTH));
    }
    Ok(mask_bits(prefix))
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ipv6Type {
    Loopback,
    LinkLocal,
    UniqueLocal,
    Documentation,
    Multicast,
    GlobalUnicast,
}

impl fmt::Display for Ipv6Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Ipv6Type::Loopback => "Loopback",
            Ipv6Type::LinkLocal => "Link-local",
            Ipv6Type::UniqueLocal => "Unique Local",
            Ipv6Type::Documentation => "Documentation",
            Ipv6Type::Multicast => "Multicast",
            Ipv6Type::GlobalUnicast => "Global Unicast",
        };
        f.write_str(name)
    }
}

/// Address type by well-known prefix.
pub fn classify(bits: u128) -> Ipv6Type {
    let in_block = |network: u128, len: u8| bits & mask_bits(len) == network;
    if bits == 1 {
        Ipv6Type::Loopback
    } else if in_block(0xfe80 << 112, 10) {
        Ipv6Type::LinkLocal
    } else if in_block(0xfc00 << 112, 7) {
        Ipv6Type::UniqueLocal
    } else if in_block(0x2001_0db8 << 96, 32) {
        Ipv6Type::Documentation
    } else if in_block(0xff00 << 112, 8) {
        Ipv6Type::Multicast
    } else {
        Ipv6Type::GlobalUnicast
    }
}

/// Derive the block facts for `address` inside a `/prefix`.
pub fn derive_subnet(address: &str, prefix: u8) -> Result<SubnetV6> {
    let bits = to_bits(address)?;
    derive_subnet_bits(bits, prefix)
}

pub fn derive_subnet_bits(bits: u128, prefix: u8) -> Result<SubnetV6> {
    let mask = prefix_mask(prefix)?;
    let network = bits & mask;
    let total = BigUint::from(1u32) << (u32::from(MAX_LENGTH - prefix));
    Ok(SubnetV6 {
        address: Ipv6Addr::from(bits),
        network: Ipv6Addr::from(network),
        last: Ipv6Addr::from(network | !mask),
        prefix,
        usable_addresses: total.clone(),
        total_addresses: total,
        address_type: classify(bits),
    })
}

/// Text front end for [`derive_subnet`]; only the `/n` prefix form is accepted.
pub fn derive_subnet_str(address: &str, prefix: &str) -> Result<SubnetV6> {
    let digits = prefix
        .strip_prefix('/')
        .ok_or_else(|| SubnetError::prefix(prefix, MAX_LENGTH))?;
    let prefix = parse_prefix(digits, MAX_LENGTH)?;
    derive_subnet(address, prefix)
}
