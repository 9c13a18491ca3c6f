//! Gap finding inside a parent block.
//!
//! Identifies unused address ranges between allocated subnets and expresses them
//! as the largest aligned CIDR blocks that fit.

use crate::models::ipv4::{lo_mask, MAX_LENGTH};
use crate::models::Ipv4Cidr;
use std::net::Ipv4Addr;

/// Free blocks of `parent` not covered by any of `used`.
///
/// Blocks in `used` may be in any order, may overlap each other and may stick
/// out of `parent`; only the part inside `parent` counts as used. Gaps are
/// never larger than `parent` itself.
pub fn find_gaps(parent: Ipv4Cidr, used: &[Ipv4Cidr]) -> Vec<Ipv4Cidr> {
    let parent = parent.network();
    let (lo, hi) = (parent.lo_bits(), parent.hi_bits());
    let end = u64::from(hi) + 1;

    let mut blocks: Vec<(u64, u64)> = used
        .iter()
        .filter(|c| c.lo_bits() <= hi && c.hi_bits() >= lo)
        .map(|c| {
            (
                u64::from(c.lo_bits().max(lo)),
                u64::from(c.hi_bits().min(hi)) + 1,
            )
        })
        .collect();
    blocks.sort_unstable();

    let mut gaps = Vec::new();
    let mut next = u64::from(lo);
    for (block_lo, block_end) in blocks.into_iter().chain(std::iter::once((end, end))) {
        if next < block_lo {
            gaps.extend(aligned_blocks(next, block_lo, parent.mask));
        }
        next = next.max(block_end);
    }
    log::debug!("find_gaps({parent}) found {} free blocks", gaps.len());
    gaps
}

/// Cover `[from, to)` with the fewest aligned blocks, none shorter than `/min_mask`.
pub(crate) fn aligned_blocks(mut from: u64, to: u64, min_mask: u8) -> Vec<Ipv4Cidr> {
    let mut out = Vec::new();
    while from < to {
        let start = from as u32;
        let mask = find_biggest_subnet(start, min_mask, to);
        log::trace!("aligned block {}/{mask}", Ipv4Addr::from(start));
        out.push(Ipv4Cidr {
            addr: Ipv4Addr::from(start),
            mask,
        });
        from += 1u64 << (MAX_LENGTH - mask);
    }
    out
}

/// Find the biggest subnet starting at `start_ip` that ends before `limit`.
///
/// The returned mask is constrained by:
/// 1. The `start_mask` parameter (won't return a shorter mask)
/// 2. The IP alignment - `start_ip` must be a valid network address for the mask
/// 3. The block must not reach `limit` (exclusive end, may be 2^32)
fn find_biggest_subnet(start_ip: u32, start_mask: u8, limit: u64) -> u8 {
    // Calculate minimum valid mask based on IP alignment (trailing zeros)
    let min_mask_for_alignment = lo_mask(Ipv4Addr::from(start_ip));

    let mut next_mask = start_mask.max(min_mask_for_alignment).min(MAX_LENGTH);
    while next_mask < MAX_LENGTH
        && u64::from(start_ip) + (1u64 << (MAX_LENGTH - next_mask)) > limit
    {
        next_mask += 1;
    }
    next_mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(text: &str) -> u32 {
        Ipv4Cidr::new(&format!("{text}/32")).unwrap().lo_bits()
    }

    fn limit(cidr: &str) -> u64 {
        u64::from(Ipv4Cidr::new(cidr).unwrap().lo_bits())
    }

    fn cidrs(list: &[&str]) -> Vec<Ipv4Cidr> {
        list.iter().map(|c| Ipv4Cidr::new(c).unwrap()).collect()
    }

    #[test]
    fn test_find_biggest_subnet() {
        // 10.0.0.0 is aligned to any mask (trailing zeros = 24 bits in last 3 octets)
        let start_ip = ip("10.0.0.0");
        assert_eq!(24, find_biggest_subnet(start_ip, 8, limit("10.0.1.0/24")));
        assert_eq!(28, find_biggest_subnet(start_ip, 28, limit("10.0.1.0/24")));

        // 10.11.12.16 has 4 trailing zeros, so min mask = 28
        let start_ip = ip("10.11.12.16");
        assert_eq!(28, find_biggest_subnet(start_ip, 8, limit("10.11.16.0/24")));

        // 10.11.12.0 can be a valid /22 network address
        let start_ip = ip("10.11.12.0");
        assert_eq!(22, find_biggest_subnet(start_ip, 8, limit("10.11.16.0/24")));

        let start_ip = ip("10.0.0.0");
        assert_eq!(13, find_biggest_subnet(start_ip, 8, limit("10.11.16.0/24")));
        assert_eq!(9, find_biggest_subnet(start_ip, 8, limit("10.192.0.0/24")));
        assert_eq!(12, find_biggest_subnet(start_ip, 12, limit("10.192.0.0/24")));
    }

    #[test]
    fn test_find_biggest_subnet_alignment() {
        // 10.6.2.80 binary ends in 0101_0000, so trailing zeros = 4, lo_mask = 28
        let mask = find_biggest_subnet(ip("10.6.2.80"), 16, limit("10.6.8.0/24"));
        assert_eq!(28, mask, "10.6.2.80 can only be /28 or smaller due to alignment");
    }

    #[test]
    fn test_find_biggest_subnet_top_of_space() {
        assert_eq!(1, find_biggest_subnet(ip("128.0.0.0"), 0, 1u64 << 32));
        assert_eq!(32, find_biggest_subnet(ip("255.255.255.255"), 0, 1u64 << 32));
    }

    #[test]
    fn test_find_gaps_after_vlsm_block() {
        let parent = Ipv4Cidr::new("192.168.1.0/24").unwrap();
        let used = cidrs(&["192.168.1.0/25", "192.168.1.128/26", "192.168.1.192/28"]);
        let gaps = find_gaps(parent, &used);
        let gaps: Vec<String> = gaps.iter().map(|g| g.to_string()).collect();
        assert_eq!(gaps, vec!["192.168.1.208/28", "192.168.1.224/27"]);
    }

    #[test]
    fn test_find_gaps_unsorted_and_overlapping() {
        let parent = Ipv4Cidr::new("10.0.0.0/16").unwrap();
        let used = cidrs(&["10.0.128.0/17", "10.0.1.0/24", "10.0.1.128/25"]);
        let gaps: Vec<String> = find_gaps(parent, &used)
            .iter()
            .map(|g| g.to_string())
            .collect();
        assert_eq!(
            gaps,
            vec![
                "10.0.0.0/24",
                "10.0.2.0/23",
                "10.0.4.0/22",
                "10.0.8.0/21",
                "10.0.16.0/20",
                "10.0.32.0/19",
                "10.0.64.0/18"
            ]
        );
    }

    #[test]
    fn test_find_gaps_edges() {
        let parent = Ipv4Cidr::new("10.0.0.0/24").unwrap();
        assert_eq!(find_gaps(parent, &[]), vec![parent]);
        assert!(find_gaps(parent, &cidrs(&["10.0.0.0/8"])).is_empty());
        // outside blocks are ignored
        assert_eq!(find_gaps(parent, &cidrs(&["10.0.1.0/24"])), vec![parent]);

        let everything = Ipv4Cidr::new("0.0.0.0/0").unwrap();
        let gaps = find_gaps(everything, &cidrs(&["0.0.0.0/1"]));
        assert_eq!(gaps, cidrs(&["128.0.0.0/1"]));
    }
}
