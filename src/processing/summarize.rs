//! Route summarization (supernetting).
//!
//! Given a list of `address/prefix` networks, compute the covering supernet
//! candidates and an exact CIDR cover of the merged address ranges.

use super::gap_finder::aligned_blocks;
use super::sizing::efficiency;
use crate::error::{Result, SubnetError};
use crate::models::ipv4::{self, MAX_LENGTH};
use crate::models::{AddressRange, Ipv4Cidr};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Tunables for the non-minimal candidates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SummaryHeuristics {
    /// Conservative candidate is the minimal prefix minus this many bits...
    pub conservative_widen_bits: u8,
    /// ...but never a longer prefix than this.
    pub conservative_cap: u8,
    /// Offer the classful (/8, /16, /24) boundary of the lowest network.
    pub class_based: bool,
}

impl Default for SummaryHeuristics {
    fn default() -> Self {
        SummaryHeuristics {
            conservative_widen_bits: 2,
            conservative_cap: 24,
            class_based: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SummaryOptions {
    pub max_summaries: usize,
    /// When false, an input contained in another input is an error instead of
    /// being dropped.
    pub allow_overlapping: bool,
    /// Fill [`RouteSummary::steps`] with a short explanation.
    pub include_steps: bool,
    pub heuristics: SummaryHeuristics,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            max_summaries: 3,
            allow_overlapping: true,
            include_steps: true,
            heuristics: SummaryHeuristics::default(),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Minimal,
    Conservative,
    ClassBased,
}

impl SummaryKind {
    pub fn description(&self) -> &'static str {
        match self {
            SummaryKind::Minimal => "Most efficient - smallest possible supernet",
            SummaryKind::Conservative => "Conservative - larger block leaving room to grow",
            SummaryKind::ClassBased => "Class-based - traditional network boundary",
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SummaryKind::Minimal => "minimal",
            SummaryKind::Conservative => "conservative",
            SummaryKind::ClassBased => "class-based",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SummaryCandidate {
    pub kind: SummaryKind,
    pub network: Ipv4Cidr,
    pub mask: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub total_hosts: u64,
    pub covered_hosts: u64,
    /// covered / total as a percentage.
    pub efficiency: f64,
}

impl SummaryCandidate {
    fn new(kind: SummaryKind, prefix: u8, lowest: u32, covered_hosts: u64) -> SummaryCandidate {
        let mask = ipv4::mask_bits(prefix);
        let total_hosts = 1u64 << (MAX_LENGTH - prefix);
        SummaryCandidate {
            kind,
            network: Ipv4Cidr {
                addr: Ipv4Addr::from(lowest & mask),
                mask: prefix,
            },
            mask: Ipv4Addr::from(mask),
            wildcard: Ipv4Addr::from(ipv4::wildcard_mask(mask)),
            total_hosts,
            covered_hosts,
            efficiency: efficiency(covered_hosts, total_hosts),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub input_count: usize,
    /// Inputs that survived containment removal, host bits cleared, sorted.
    pub networks: Vec<Ipv4Cidr>,
    /// Inputs dropped because a kept network already covers them.
    pub removed: Vec<Ipv4Cidr>,
    /// Disjoint ranges after merging overlapping and adjacent networks.
    pub merged_ranges: Vec<AddressRange>,
    /// Fewest CIDR blocks covering exactly the merged ranges.
    pub exact_cover: Vec<Ipv4Cidr>,
    /// Union size of the inputs.
    pub covered_hosts: u64,
    /// Sum of the kept network sizes.
    pub input_hosts: u64,
    pub address_range: AddressRange,
    /// Best first, at most `max_summaries`.
    pub summaries: Vec<SummaryCandidate>,
    pub steps: Vec<String>,
}

impl RouteSummary {
    pub fn best(&self) -> Option<&SummaryCandidate> {
        self.summaries.first()
    }
}

fn parse_network(index: usize, entry: &str) -> Result<Ipv4Cidr> {
    Ipv4Cidr::new(entry).map_err(|source| SubnetError::InvalidNetwork {
        index,
        entry: entry.to_string(),
        source: Box::new(source),
    })
}

/// Traditional class boundary of an address, used for the class-based candidate.
fn class_prefix(addr: u32) -> u8 {
    match addr >> 24 {
        192..=255 => 24,
        128..=191 => 16,
        _ => 8,
    }
}

/// Summarize `networks` into covering supernet candidates.
///
/// Entries are parsed strictly; the first bad one fails the whole call with
/// [`SubnetError::InvalidNetwork`] carrying its 1-based position. Networks
/// contained in an earlier (lower or shorter) one are dropped, the rest are
/// merged into disjoint ranges.
///
/// # Examples
/// ```
/// use subnet_toolkit::processing::{summarize_routes, SummaryOptions};
/// let summary = summarize_routes(&["192.168.0.0/24", "192.168.1.0/24"], &SummaryOptions::default()).unwrap();
/// let best = summary.best().unwrap();
/// assert_eq!(best.network.to_string(), "192.168.0.0/23");
/// assert_eq!(best.efficiency, 100.0);
/// ```
pub fn summarize_routes<S: AsRef<str>>(
    networks: &[S],
    options: &SummaryOptions,
) -> Result<RouteSummary> {
    if networks.is_empty() {
        return Err(SubnetError::InvalidRequirement(
            "no networks to summarize".to_string(),
        ));
    }

    let mut parsed = networks
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            parse_network(i + 1, entry.as_ref()).map(|cidr| (i + 1, cidr.network()))
        })
        .collect::<Result<Vec<(usize, Ipv4Cidr)>>>()?;
    parsed.sort_by_key(|(_, cidr)| (cidr.lo_bits(), cidr.mask));

    let mut kept: Vec<Ipv4Cidr> = Vec::new();
    let mut removed = Vec::new();
    for (index, net) in parsed {
        match kept.iter().find(|k| k.covers(&net)) {
            Some(holder) if !options.allow_overlapping => {
                return Err(SubnetError::InvalidNetwork {
                    index,
                    entry: networks[index - 1].as_ref().to_string(),
                    source: Box::new(SubnetError::InvalidRequirement(format!(
                        "overlaps {holder}"
                    ))),
                });
            }
            Some(holder) => {
                log::trace!("summarize: {net} is inside {holder}, dropped");
                removed.push(net);
            }
            None => kept.push(net),
        }
    }

    // [start, end) pairs, u64 so the top of the space does not overflow
    let mut merged: Vec<(u64, u64)> = Vec::new();
    for net in &kept {
        let (lo, end) = (u64::from(net.lo_bits()), u64::from(net.hi_bits()) + 1);
        match merged.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((lo, end)),
        }
    }

    let input_hosts: u64 = kept.iter().map(|c| c.size()).sum();
    let covered_hosts: u64 = merged.iter().map(|(lo, end)| end - lo).sum();
    let (lowest, highest) = match (merged.first(), merged.last()) {
        (Some(first), Some(last)) => (first.0 as u32, (last.1 - 1) as u32),
        _ => {
            return Err(SubnetError::InvalidRequirement(
                "no networks to summarize".to_string(),
            ))
        }
    };

    let heuristics = &options.heuristics;
    let minimal = (lowest ^ highest).leading_zeros() as u8;
    let mut summaries = vec![SummaryCandidate::new(
        SummaryKind::Minimal,
        minimal,
        lowest,
        covered_hosts,
    )];

    let conservative = minimal
        .saturating_sub(heuristics.conservative_widen_bits)
        .min(heuristics.conservative_cap);
    if conservative < minimal {
        summaries.push(SummaryCandidate::new(
            SummaryKind::Conservative,
            conservative,
            lowest,
            covered_hosts,
        ));
    }

    let class = class_prefix(lowest);
    if heuristics.class_based
        && class < minimal
        && !summaries.iter().any(|s| s.network.mask == class)
    {
        summaries.push(SummaryCandidate::new(
            SummaryKind::ClassBased,
            class,
            lowest,
            covered_hosts,
        ));
    }

    summaries.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
    summaries.truncate(options.max_summaries);

    let exact_cover = merged
        .iter()
        .flat_map(|&(lo, end)| aligned_blocks(lo, end, 0))
        .collect();
    let merged_ranges: Vec<AddressRange> = merged
        .iter()
        .map(|&(lo, end)| AddressRange {
            start: Ipv4Addr::from(lo as u32),
            end: Ipv4Addr::from((end - 1) as u32),
        })
        .collect();
    let address_range = AddressRange {
        start: Ipv4Addr::from(lowest),
        end: Ipv4Addr::from(highest),
    };

    let steps = if options.include_steps {
        let mut steps = vec![
            format!("Parsed {} input networks", networks.len()),
            format!(
                "Removed {} duplicate/contained networks",
                removed.len()
            ),
            format!(
                "Merged into {} address ranges covering {covered_hosts} hosts",
                merged_ranges.len()
            ),
            format!("Generated {} summary options", summaries.len()),
        ];
        if let Some(best) = summaries.first() {
            steps.push(format!(
                "Best summary: {} ({:.0}% efficient)",
                best.network, best.efficiency
            ));
        }
        steps
    } else {
        Vec::new()
    };

    log::debug!(
        "summarize_routes({} networks) kept {} -> minimal /{minimal}",
        networks.len(),
        kept.len()
    );

    Ok(RouteSummary {
        input_count: networks.len(),
        networks: kept,
        removed,
        merged_ranges,
        exact_cover,
        covered_hosts,
        input_hosts,
        address_range,
        summaries,
        steps,
    })
}

lazy_static! {
    static ref NETWORK_SEPARATOR: Regex = Regex::new(r"[,;\s]+").expect("Invalid Regex?");
}

/// Split a free-text network list on commas, semicolons and whitespace.
pub fn parse_network_list(text: &str) -> Vec<String> {
    NETWORK_SEPARATOR
        .split(text)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(list: &[&str]) -> RouteSummary {
        summarize_routes(list, &SummaryOptions::default()).unwrap()
    }

    #[test]
    fn test_two_adjacent_slash_24() {
        let summary = summarize(&["192.168.0.0/24", "192.168.1.0/24"]);
        assert_eq!(summary.covered_hosts, 512);
        assert_eq!(summary.merged_ranges.len(), 1);
        assert_eq!(
            summary.address_range.to_string(),
            "192.168.0.0 - 192.168.1.255"
        );

        let best = summary.best().unwrap();
        assert_eq!(best.kind, SummaryKind::Minimal);
        assert_eq!(best.network.to_string(), "192.168.0.0/23");
        assert_eq!(best.mask, Ipv4Addr::new(255, 255, 254, 0));
        assert_eq!(best.efficiency, 100.0);

        // conservative widens by two bits, class C boundary is narrower so skipped
        assert_eq!(summary.summaries.len(), 2);
        assert_eq!(summary.summaries[1].kind, SummaryKind::Conservative);
        assert_eq!(summary.summaries[1].network.to_string(), "192.168.0.0/21");
        assert_eq!(summary.summaries[1].efficiency, 25.0);
        assert_eq!(summary.exact_cover, vec![best.network]);
    }

    #[test]
    fn test_minimal_covers_unaligned_span() {
        // 10.0.1.0 .. 10.0.2.255 is 512 addresses but crosses a /23 boundary
        let summary = summarize(&["10.0.1.0/24", "10.0.2.0/24"]);
        let minimal = summary
            .summaries
            .iter()
            .find(|s| s.kind == SummaryKind::Minimal)
            .unwrap();
        assert_eq!(minimal.network.to_string(), "10.0.0.0/22");
        assert_eq!(minimal.efficiency, 50.0);
        let cover: Vec<String> = summary.exact_cover.iter().map(|c| c.to_string()).collect();
        assert_eq!(cover, vec!["10.0.1.0/24", "10.0.2.0/24"]);

        let class = summary
            .summaries
            .iter()
            .find(|s| s.kind == SummaryKind::ClassBased)
            .unwrap();
        assert_eq!(class.network.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn test_contained_networks_are_dropped_and_counted_once() {
        let summary = summarize(&["10.1.2.0/24", "10.1.0.0/16", "10.1.0.0/16", "10.2.0.0/16"]);
        assert_eq!(summary.input_count, 4);
        assert_eq!(summary.networks.len(), 2);
        assert_eq!(summary.removed.len(), 2);
        assert_eq!(summary.covered_hosts, 2 * 65536);
        assert_eq!(summary.input_hosts, summary.covered_hosts);
        assert_eq!(summary.best().unwrap().network.to_string(), "10.0.0.0/14");
    }

    #[test]
    fn test_disjoint_ranges() {
        let summary = summarize(&["172.16.0.0/24", "172.16.3.0/24"]);
        assert_eq!(summary.merged_ranges.len(), 2);
        assert_eq!(summary.covered_hosts, 512);
        let best = summary.best().unwrap();
        assert_eq!(best.network.to_string(), "172.16.0.0/22");
        assert_eq!(best.efficiency, 50.0);
    }

    #[test]
    fn test_host_bits_are_cleared() {
        let summary = summarize(&["192.168.5.77/24"]);
        assert_eq!(summary.networks[0].to_string(), "192.168.5.0/24");
        assert_eq!(summary.best().unwrap().network.to_string(), "192.168.5.0/24");
    }

    #[test]
    fn test_candidates_sorted_and_truncated() {
        let options = SummaryOptions {
            max_summaries: 1,
            ..Default::default()
        };
        let summary = summarize_routes(&["10.0.0.0/24", "10.0.1.0/24"], &options).unwrap();
        assert_eq!(summary.summaries.len(), 1);
        assert_eq!(summary.summaries[0].kind, SummaryKind::Minimal);

        let all = summarize(&["10.0.0.0/24", "10.0.1.0/24"]);
        let effs: Vec<f64> = all.summaries.iter().map(|s| s.efficiency).collect();
        let mut sorted = effs.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(effs, sorted);
    }

    #[test]
    fn test_heuristics_are_configurable() {
        let options = SummaryOptions {
            heuristics: SummaryHeuristics {
                conservative_widen_bits: 4,
                conservative_cap: 32,
                class_based: false,
            },
            ..Default::default()
        };
        let summary = summarize_routes(&["10.0.0.0/24", "10.0.1.0/24"], &options).unwrap();
        let kinds: Vec<SummaryKind> = summary.summaries.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SummaryKind::Minimal, SummaryKind::Conservative]);
        assert_eq!(summary.summaries[1].network.mask, 19);
    }

    #[test]
    fn test_overlap_rejected_when_not_allowed() {
        let options = SummaryOptions {
            allow_overlapping: false,
            ..Default::default()
        };
        let err =
            summarize_routes(&["10.0.0.0/16", "10.0.5.0/24"], &options).unwrap_err();
        match err {
            SubnetError::InvalidNetwork { index, entry, .. } => {
                assert_eq!(index, 2);
                assert_eq!(entry, "10.0.5.0/24");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_entry_names_position() {
        let err = summarize_routes(
            &["10.0.0.0/24", "10.0.0.300/24", "10.0.1.0/33"],
            &SummaryOptions::default(),
        )
        .unwrap_err();
        match err {
            SubnetError::InvalidNetwork { index, entry, source } => {
                assert_eq!(index, 2);
                assert_eq!(entry, "10.0.0.300/24");
                assert_eq!(source.kind(), "InvalidFormat");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let missing_prefix =
            summarize_routes(&["10.0.0.0"], &SummaryOptions::default()).unwrap_err();
        assert_eq!(missing_prefix.kind(), "InvalidNetwork");

        let empty: [&str; 0] = [];
        assert_eq!(
            summarize_routes(&empty, &SummaryOptions::default())
                .unwrap_err()
                .kind(),
            "InvalidRequirement"
        );
    }

    #[test]
    fn test_whole_address_space() {
        let summary = summarize(&["0.0.0.0/1", "128.0.0.0/1"]);
        assert_eq!(summary.covered_hosts, 1u64 << 32);
        let best = summary.best().unwrap();
        assert_eq!(best.network.to_string(), "0.0.0.0/0");
        assert_eq!(best.efficiency, 100.0);
        assert_eq!(summary.exact_cover.len(), 1);
    }

    #[test]
    fn test_steps() {
        let summary = summarize(&["192.168.0.0/24", "192.168.1.0/24"]);
        assert_eq!(summary.steps.len(), 5);
        assert_eq!(summary.steps[4], "Best summary: 192.168.0.0/23 (100% efficient)");

        let quiet = SummaryOptions {
            include_steps: false,
            ..Default::default()
        };
        let summary = summarize_routes(&["192.168.0.0/24"], &quiet).unwrap();
        assert!(summary.steps.is_empty());
    }

    #[test]
    fn test_parse_network_list() {
        assert_eq!(
            parse_network_list("10.0.0.0/24, 10.0.1.0/24\n10.0.2.0/24;10.0.3.0/24 "),
            vec!["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]
        );
        assert!(parse_network_list("  ").is_empty());
    }
}
