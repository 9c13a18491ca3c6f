//! Variable length subnet mask (VLSM) allocation.
//!
//! Requirements are packed in the order given: each block starts where the
//! previous one ended. Callers wanting the classic largest-first packing either
//! sort the list themselves or use [`allocate_vlsm_sorted`].

use super::gap_finder::find_gaps;
use super::sizing::ceil_log2;
use crate::error::{Result, SubnetError};
use crate::models::ipv4::{self, build_subnet, MAX_LENGTH};
use crate::models::{Ipv4Cidr, SubnetV4};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::net::Ipv4Addr;

/// One packed block.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VlsmAllocation {
    /// 1-based position in the requirement list that was packed.
    pub index: usize,
    pub hosts_needed: u64,
    pub prefix: u8,
    pub subnet: SubnetV4,
}

impl VlsmAllocation {
    pub fn cidr(&self) -> Ipv4Cidr {
        self.subnet.cidr()
    }

    /// Usable hosts beyond what was asked for.
    pub fn waste(&self) -> u64 {
        self.subnet.usable_hosts.saturating_sub(self.hosts_needed)
    }
}

/// Allocations inside a parent block plus what is left of it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VlsmPlan {
    pub parent: Ipv4Cidr,
    pub allocations: Vec<VlsmAllocation>,
    /// Largest aligned blocks of `parent` still unallocated.
    pub free: Vec<Ipv4Cidr>,
    pub allocated_addresses: u64,
    pub free_addresses: u64,
}

/// Prefix of the block holding `hosts` plus network and broadcast.
fn prefix_for_hosts(index: usize, hosts: u64) -> Result<u8> {
    if hosts == 0 {
        return Err(SubnetError::InvalidRequirement(format!(
            "subnet #{index} needs at least 1 host"
        )));
    }
    let bits = ceil_log2(hosts.saturating_add(2));
    if bits >= u32::from(MAX_LENGTH) {
        return Err(SubnetError::AddressSpaceExhausted(format!(
            "subnet #{index} needs {hosts} hosts, more than a /1 holds"
        )));
    }
    Ok(MAX_LENGTH - bits as u8)
}

/// Split `base` text into a start address and an optional enclosing block.
fn parse_base(base: &str) -> Result<(u32, Option<Ipv4Cidr>)> {
    let base = base.trim();
    if base.contains('/') {
        let parent = Ipv4Cidr::new(base)?.network();
        Ok((parent.lo_bits(), Some(parent)))
    } else {
        Ok((ipv4::parse_address(base)?, None))
    }
}

/// Pack from `start`, keeping every block inside `floor..=end`.
fn pack(
    start: u32,
    floor: u32,
    end: u32,
    requirements: &[u64],
) -> Result<Vec<VlsmAllocation>> {
    if requirements.is_empty() {
        return Err(SubnetError::InvalidRequirement(
            "no subnet requirements given".to_string(),
        ));
    }
    // validate everything before packing anything
    let prefixes = requirements
        .iter()
        .enumerate()
        .map(|(i, &hosts)| prefix_for_hosts(i + 1, hosts))
        .collect::<Result<Vec<u8>>>()?;

    let mut cursor = u64::from(start);
    let mut allocations = Vec::with_capacity(requirements.len());
    for (i, (&hosts, &prefix)) in requirements.iter().zip(prefixes.iter()).enumerate() {
        let size = 1u64 << (MAX_LENGTH - prefix);
        // the base address names the first network; later cursors move up
        let aligned = if i == 0 {
            cursor / size * size
        } else {
            (cursor + size - 1) / size * size
        };
        if aligned != cursor {
            log::debug!(
                "VLSM cursor {} is not a /{prefix} boundary, moved to {}",
                ipv4::format_address(cursor as u32),
                ipv4::format_address(aligned.min(u64::from(u32::MAX)) as u32)
            );
        }
        let block_end = aligned + size - 1;
        if aligned < u64::from(floor) || block_end > u64::from(end) {
            return Err(SubnetError::AddressSpaceExhausted(format!(
                "subnet #{} ({hosts} hosts, /{prefix}) does not fit in {} - {}",
                i + 1,
                Ipv4Addr::from(floor),
                Ipv4Addr::from(end)
            )));
        }
        let subnet = build_subnet(aligned as u32, prefix);
        log::trace!("VLSM #{} {hosts} hosts -> {subnet}", i + 1);
        allocations.push(VlsmAllocation {
            index: i + 1,
            hosts_needed: hosts,
            prefix,
            subnet,
        });
        cursor = block_end + 1;
    }
    Ok(allocations)
}

/// Pack `requirements` (host counts) one after the other starting at `base`.
///
/// `base` is either an address (`192.168.1.0`), in which case packing may run
/// up to 255.255.255.255, or a block (`192.168.1.0/24`) that every allocation
/// has to fit in. An unaligned base is masked down to the first block's
/// network, the way a host address names its subnet; a later cursor that is
/// not aligned for its block is moved up to the next boundary. Fails
/// atomically: an empty list or a zero requirement is
/// [`SubnetError::InvalidRequirement`], running out of room is
/// [`SubnetError::AddressSpaceExhausted`].
///
/// # Examples
/// ```
/// use subnet_toolkit::processing::allocate_vlsm;
/// let plan = allocate_vlsm("192.168.1.0", &[100, 50, 10]).unwrap();
/// let prefixes: Vec<u8> = plan.iter().map(|a| a.prefix).collect();
/// assert_eq!(prefixes, vec![25, 26, 28]);
/// ```
pub fn allocate_vlsm(base: &str, requirements: &[u64]) -> Result<Vec<VlsmAllocation>> {
    let (start, parent) = parse_base(base)?;
    let (floor, end) = parent.map_or((0, u32::MAX), |p| (p.lo_bits(), p.hi_bits()));
    log::debug!(
        "allocate_vlsm(base={base}, {} requirements)",
        requirements.len()
    );
    pack(start, floor, end, requirements)
}

/// Same as [`allocate_vlsm`] after sorting a copy of `requirements` largest first.
pub fn allocate_vlsm_sorted(base: &str, requirements: &[u64]) -> Result<Vec<VlsmAllocation>> {
    let mut sorted = requirements.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    allocate_vlsm(base, &sorted)
}

/// Pack inside `parent` and report the free space left over.
pub fn plan_vlsm(
    parent: Ipv4Cidr,
    requirements: &[u64],
    sort_descending: bool,
) -> Result<VlsmPlan> {
    let parent = parent.network();
    let mut requirements = requirements.to_vec();
    if sort_descending {
        requirements.sort_unstable_by(|a, b| b.cmp(a));
    }
    let (lo, hi) = (parent.lo_bits(), parent.hi_bits());
    let allocations = pack(lo, lo, hi, &requirements)?;

    let used: Vec<Ipv4Cidr> = allocations.iter().map(|a| a.cidr()).collect();
    let free = find_gaps(parent, &used);
    let allocated_addresses = used.iter().map(|c| c.size()).sum();
    let free_addresses = free.iter().map(|c| c.size()).sum();

    Ok(VlsmPlan {
        parent,
        allocations,
        free,
        allocated_addresses,
        free_addresses,
    })
}

lazy_static! {
    static ref LIST_SEPARATOR: Regex = Regex::new(r"[,;\s]+").expect("Invalid Regex?");
}

/// Parse a free-text host count list such as `"100, 50 10"`.
pub fn parse_requirements(text: &str) -> Result<Vec<u64>> {
    LIST_SEPARATOR
        .split(text.trim())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<u64>().map_err(|_| {
                SubnetError::InvalidRequirement(format!("{token:?} is not a host count"))
            })
        })
        .collect()
}
