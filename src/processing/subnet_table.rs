//! Equal-size subnet listings.

use crate::error::{Result, SubnetError};
use crate::models::ipv4::{self, build_subnet, MAX_LENGTH};
use crate::models::{Ipv4Cidr, SubnetV4};
use std::net::Ipv4Addr;

/// Most rows [`subnet_table`] will build in one call.
pub const MAX_TABLE_ROWS: usize = 1 << 16;

/// `count` consecutive subnets of the given mask, starting at the network of `base`.
pub fn subnet_table(base: &str, mask: &str, count: usize) -> Result<Vec<SubnetV4>> {
    let address = ipv4::parse_address(base)?;
    let prefix = ipv4::parse_mask(mask)?;
    if count == 0 || count > MAX_TABLE_ROWS {
        return Err(SubnetError::InvalidRequirement(format!(
            "subnet count must be between 1 and {MAX_TABLE_ROWS}, got {count}"
        )));
    }

    let size = 1u64 << (MAX_LENGTH - prefix);
    let start = u64::from(address & ipv4::mask_bits(prefix));
    let last_end = (count as u64)
        .checked_mul(size)
        .and_then(|span| span.checked_add(start))
        .unwrap_or(u64::MAX);
    if last_end > 1u64 << MAX_LENGTH {
        return Err(SubnetError::AddressSpaceExhausted(format!(
            "{count} x /{prefix} from {} runs past 255.255.255.255",
            Ipv4Addr::from(start as u32)
        )));
    }
    log::debug!("subnet_table {count} x /{prefix} from {}", Ipv4Addr::from(start as u32));

    Ok((0..count as u64)
        .map(|i| build_subnet((start + i * size) as u32, prefix))
        .collect())
}

/// Children of `parent` at `new_prefix`, at most `limit` of them.
pub fn split_network(parent: Ipv4Cidr, new_prefix: u8, limit: usize) -> Result<Vec<Ipv4Cidr>> {
    if new_prefix < parent.mask || new_prefix > MAX_LENGTH {
        return Err(SubnetError::InvalidPrefix {
            prefix: new_prefix.to_string(),
            max: MAX_LENGTH,
        });
    }
    let size = 1u64 << (MAX_LENGTH - new_prefix);
    let children = 1u64 << (new_prefix - parent.mask);
    let shown = children.min(limit as u64);
    if shown < children {
        log::debug!("split_network({parent}, /{new_prefix}) showing {shown} of {children}");
    }

    let lo = u64::from(parent.lo_bits());
    Ok((0..shown)
        .map(|i| Ipv4Cidr {
            addr: Ipv4Addr::from((lo + i * size) as u32),
            mask: new_prefix,
        })
        .collect())
}

/// Number of `/new_prefix` children in `parent` (0 if the prefix is shorter).
pub fn child_count(parent: Ipv4Cidr, new_prefix: u8) -> u64 {
    if new_prefix < parent.mask || new_prefix > MAX_LENGTH {
        0
    } else {
        1u64 << (new_prefix - parent.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subnet_table() {
        let table = subnet_table("192.168.1.77", "/26", 4).unwrap();
        let names: Vec<String> = table.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "192.168.1.0/26",
                "192.168.1.64/26",
                "192.168.1.128/26",
                "192.168.1.192/26"
            ]
        );
        assert_eq!(table[3].broadcast, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(table[1].usable_hosts, 62);
    }

    #[test]
    fn test_subnet_table_dotted_mask_and_limits() {
        let table = subnet_table("10.0.0.0", "255.255.255.252", 2).unwrap();
        assert_eq!(table[1].to_string(), "10.0.0.4/30");

        let last = subnet_table("255.255.255.0", "/25", 2).unwrap();
        assert_eq!(last[1].broadcast, Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(
            subnet_table("255.255.255.0", "/25", 3).unwrap_err().kind(),
            "AddressSpaceExhausted"
        );
        assert_eq!(
            subnet_table("10.0.0.0", "/24", 0).unwrap_err().kind(),
            "InvalidRequirement"
        );
        assert_eq!(
            subnet_table("10.0.0.0", "255.0.255.0", 1).unwrap_err().kind(),
            "InvalidMask"
        );
    }

    #[test]
    fn test_subnet_table_row_cap() {
        let err = subnet_table("0.0.0.0", "/32", usize::MAX).unwrap_err();
        assert_eq!(err.kind(), "InvalidRequirement");
        assert_eq!(
            subnet_table("0.0.0.0", "/32", MAX_TABLE_ROWS).unwrap().len(),
            MAX_TABLE_ROWS
        );
        assert!(subnet_table("0.0.0.0", "/32", MAX_TABLE_ROWS + 1).is_err());
    }

    #[test]
    fn test_split_network() {
        let parent = Ipv4Cidr::new("10.0.0.0/22").unwrap();
        let children = split_network(parent, 24, 256).unwrap();
        let names: Vec<String> = children.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec!["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]
        );
        assert_eq!(split_network(parent, 22, 10).unwrap(), vec![parent]);
        assert_eq!(split_network(parent, 30, 3).unwrap().len(), 3);
        assert_eq!(child_count(parent, 30), 256);
        assert_eq!(child_count(parent, 20), 0);
        assert_eq!(
            split_network(parent, 21, 10).unwrap_err().kind(),
            "InvalidPrefix"
        );
        assert_eq!(
            split_network(parent, 33, 10).unwrap_err().kind(),
            "InvalidPrefix"
        );
    }

    #[test]
    fn test_split_uses_network_of_parent() {
        let parent = Ipv4Cidr::new("10.0.0.99/24").unwrap();
        let children = split_network(parent, 25, 8).unwrap();
        assert_eq!(children[0].to_string(), "10.0.0.0/25");
        assert_eq!(children[1].to_string(), "10.0.0.128/25");
    }
}
