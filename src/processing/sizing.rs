//! Reverse sizing: from a host or subnet count back to a prefix length.

use crate::error::{Result, SubnetError};
use crate::models::ipv4::{self, MAX_LENGTH};
use crate::models::ipv6;
use num_bigint::BigUint;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;

/// Addresses in a `/prefix` block.
pub(crate) fn total_for(prefix: u8) -> u64 {
    1u64 << (MAX_LENGTH - prefix.min(MAX_LENGTH))
}

/// Assignable hosts in a `/prefix` block (/31 and /32 keep every address).
pub(crate) fn usable_for(prefix: u8) -> u64 {
    let total = total_for(prefix);
    if total > 2 {
        total - 2
    } else {
        total
    }
}

/// Smallest `bits` with `2^bits >= n`.
pub(crate) fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        u64::BITS - (n - 1).leading_zeros()
    }
}

/// `used / capacity` as a percentage.
pub(crate) fn efficiency(used: u64, capacity: u64) -> f64 {
    if capacity == 0 {
        0.0
    } else {
        used as f64 / capacity as f64 * 100.0
    }
}

/// Rating bands used when presenting an efficiency percentage.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfficiencyClass {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl EfficiencyClass {
    pub fn from_percent(percent: f64) -> EfficiencyClass {
        if percent >= 80.0 {
            EfficiencyClass::Excellent
        } else if percent >= 60.0 {
            EfficiencyClass::Good
        } else if percent >= 40.0 {
            EfficiencyClass::Fair
        } else {
            EfficiencyClass::Poor
        }
    }
}

impl fmt::Display for EfficiencyClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EfficiencyClass::Excellent => "excellent",
            EfficiencyClass::Good => "good",
            EfficiencyClass::Fair => "fair",
            EfficiencyClass::Poor => "poor",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingTier {
    /// Tightest block that still fits.
    Exact,
    /// One prefix bit shorter, room to double.
    Recommended,
    /// Two prefix bits shorter.
    Generous,
}

impl fmt::Display for SizingTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SizingTier::Exact => "Exact",
            SizingTier::Recommended => "Recommended",
            SizingTier::Generous => "Generous",
        };
        f.write_str(name)
    }
}

/// One suggested block size for a host requirement.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SizingCandidate {
    pub tier: SizingTier,
    pub prefix: u8,
    pub mask: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub total_hosts: u64,
    pub usable_hosts: u64,
    /// Required hosts as a percentage of usable hosts.
    pub efficiency: f64,
    /// Usable hosts left over.
    pub waste: u64,
}

impl SizingCandidate {
    fn new(tier: SizingTier, prefix: u8, required: u64) -> SizingCandidate {
        let mask = ipv4::mask_bits(prefix);
        let usable_hosts = usable_for(prefix);
        SizingCandidate {
            tier,
            prefix,
            mask: Ipv4Addr::from(mask),
            wildcard: Ipv4Addr::from(ipv4::wildcard_mask(mask)),
            total_hosts: total_for(prefix),
            usable_hosts,
            efficiency: efficiency(required, usable_hosts),
            waste: usable_hosts.saturating_sub(required),
        }
    }

    pub fn efficiency_class(&self) -> EfficiencyClass {
        EfficiencyClass::from_percent(self.efficiency)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HostSizing {
    pub required_hosts: u64,
    pub exact: SizingCandidate,
    pub recommended: SizingCandidate,
    pub generous: SizingCandidate,
}

impl HostSizing {
    pub fn candidates(&self) -> [&SizingCandidate; 3] {
        [&self.exact, &self.recommended, &self.generous]
    }

    pub fn max_efficiency(&self) -> f64 {
        self.candidates()
            .iter()
            .map(|c| c.efficiency)
            .fold(0.0, f64::max)
    }
}

/// Size a single subnet for `required` hosts.
///
/// The exact candidate is the longest prefix (clamped to /1../32) whose usable
/// host count is at least `required`; the other two widen it by one and two
/// bits, never past /1.
///
/// # Examples
/// ```
/// use subnet_toolkit::processing::size_for_hosts;
/// let sizing = size_for_hosts(50).unwrap();
/// assert_eq!(sizing.exact.prefix, 26);
/// assert_eq!(sizing.recommended.prefix, 25);
/// ```
pub fn size_for_hosts(required: u64) -> Result<HostSizing> {
    if required < 1 {
        return Err(SubnetError::InvalidRequirement(
            "host count must be at least 1".to_string(),
        ));
    }
    if required > usable_for(1) {
        return Err(SubnetError::AddressSpaceExhausted(format!(
            "{required} hosts do not fit in a /1"
        )));
    }

    let exact = (1..=MAX_LENGTH)
        .rev()
        .find(|prefix| usable_for(*prefix) >= required)
        .unwrap_or(1);
    log::debug!("size_for_hosts({required}) exact fit /{exact}");

    Ok(HostSizing {
        required_hosts: required,
        exact: SizingCandidate::new(SizingTier::Exact, exact, required),
        recommended: SizingCandidate::new(
            SizingTier::Recommended,
            exact.saturating_sub(1).max(1),
            required,
        ),
        generous: SizingCandidate::new(
            SizingTier::Generous,
            exact.saturating_sub(2).max(1),
            required,
        ),
    })
}

/// Result of borrowing enough bits for a number of equal subnets.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubnetCountPlan {
    pub required_subnets: u64,
    pub borrowed_bits: u8,
    /// Base address masked to `prefix`.
    pub network: Ipv4Addr,
    pub prefix: u8,
    pub mask: Ipv4Addr,
    /// 2^borrowed_bits.
    pub total_subnets: u64,
    pub hosts_per_subnet: u64,
    pub usable_hosts_per_subnet: u64,
    /// Required subnets as a percentage of total subnets.
    pub efficiency: f64,
}

/// Borrow `ceil(log2(count))` bits and report the resulting per-subnet prefix.
pub fn size_for_subnet_count(base: u32, count: u64) -> Result<SubnetCountPlan> {
    if count < 1 {
        return Err(SubnetError::InvalidRequirement(
            "subnet count must be at least 1".to_string(),
        ));
    }
    if count > 1u64 << MAX_LENGTH {
        return Err(SubnetError::AddressSpaceExhausted(format!(
            "{count} subnets exceed the IPv4 address space"
        )));
    }

    let bits = ceil_log2(count) as u8;
    let prefix = (MAX_LENGTH - bits).clamp(1, MAX_LENGTH);
    let mask = ipv4::mask_bits(prefix);
    let total_subnets = 1u64 << bits;
    log::debug!("size_for_subnet_count({count}) borrows {bits} bits -> /{prefix}");

    Ok(SubnetCountPlan {
        required_subnets: count,
        borrowed_bits: bits,
        network: Ipv4Addr::from(base & mask),
        prefix,
        mask: Ipv4Addr::from(mask),
        total_subnets,
        hosts_per_subnet: total_for(prefix),
        usable_hosts_per_subnet: usable_for(prefix),
        efficiency: efficiency(count, total_subnets),
    })
}

/// Text front end for [`size_for_subnet_count`].
pub fn size_for_subnet_count_str(base: &str, count: u64) -> Result<SubnetCountPlan> {
    size_for_subnet_count(ipv4::parse_address(base)?, count)
}

fn decimal<S>(count: &BigUint, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(count)
}

/// One IPv6 block size able to hold the requested subnets.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubnetCountCandidateV6 {
    pub tier: SizingTier,
    pub prefix: u8,
    /// 2^(128-prefix); a /1 holds 2^127.
    #[serde(serialize_with = "decimal")]
    pub total_subnets: BigUint,
    /// Required subnets as a percentage of `total_subnets`.
    pub efficiency: f64,
}

impl SubnetCountCandidateV6 {
    fn new(tier: SizingTier, prefix: u8, required: u64) -> SubnetCountCandidateV6 {
        let bits = u32::from(ipv6::MAX_LENGTH - prefix);
        SubnetCountCandidateV6 {
            tier,
            prefix,
            total_subnets: BigUint::from(1u32) << bits,
            efficiency: required as f64 / 2f64.powi(bits as i32) * 100.0,
        }
    }

    pub fn efficiency_class(&self) -> EfficiencyClass {
        EfficiencyClass::from_percent(self.efficiency)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubnetCountPlanV6 {
    pub required_subnets: u64,
    pub exact: SubnetCountCandidateV6,
    pub recommended: SubnetCountCandidateV6,
    pub generous: SubnetCountCandidateV6,
}

impl SubnetCountPlanV6 {
    pub fn candidates(&self) -> [&SubnetCountCandidateV6; 3] {
        [&self.exact, &self.recommended, &self.generous]
    }
}

/// IPv6 prefixes for `count` subnets.
///
/// The exact tier borrows `ceil(log2(count))` bits from /128, so its block
/// always holds at least `count`; the wider tiers add 4 and 8 bits (one and
/// two nibbles), never past /1.
pub fn size_for_subnet_count_v6(count: u64) -> Result<SubnetCountPlanV6> {
    if count < 1 {
        return Err(SubnetError::InvalidRequirement(
            "subnet count must be at least 1".to_string(),
        ));
    }
    let exact = ipv6::MAX_LENGTH - ceil_log2(count) as u8;
    log::debug!("size_for_subnet_count_v6({count}) exact fit /{exact}");

    Ok(SubnetCountPlanV6 {
        required_subnets: count,
        exact: SubnetCountCandidateV6::new(SizingTier::Exact, exact, count),
        recommended: SubnetCountCandidateV6::new(
            SizingTier::Recommended,
            exact.saturating_sub(4).max(1),
            count,
        ),
        generous: SubnetCountCandidateV6::new(
            SizingTier::Generous,
            exact.saturating_sub(8).max(1),
            count,
        ),
    })
}
