//! Subnet planning logic.
//!
//! This module contains the planners built on top of [`crate::models`]:
//! - [`sizing`] - Prefix suggestions for a host count or a subnet count
//! - [`vlsm`] - Packing host requirements into consecutive blocks
//! - [`summarize`] - Route summarization and exact CIDR covers
//! - [`gap_finder`] - Free blocks left inside a parent network
//! - [`subnet_table`] - Equal-size subnet listings
//! - [`tools`] - ACL, routing, DHCP, NAT, TCP, transfer time and troubleshooting helpers

mod gap_finder;
mod sizing;
mod subnet_table;
mod summarize;
mod tools;
mod vlsm;

// Re-export public functions
pub use gap_finder::find_gaps;
pub use sizing::{
    size_for_hosts, size_for_subnet_count, size_for_subnet_count_str, size_for_subnet_count_v6,
    EfficiencyClass, HostSizing, SizingCandidate, SizingTier, SubnetCountCandidateV6,
    SubnetCountPlan, SubnetCountPlanV6,
};
pub use subnet_table::{child_count, split_network, subnet_table, MAX_TABLE_ROWS};
pub use summarize::{
    parse_network_list, summarize_routes, RouteSummary, SummaryCandidate, SummaryHeuristics,
    SummaryKind, SummaryOptions,
};
pub use tools::{
    acl_wildcard, address_forms, dhcp_scope, embed_ipv4, nat_config, ospf_network_type,
    static_route, transfer_time, troubleshoot, AclWildcard, AddressForms, DataUnit, DhcpOptions,
    DhcpScope, Diagnosis, Ipv4Embedding, NatConfig, NatKind, OspfHint, OspfNetworkType,
    RateUnit, StaticRoute, TcpFlags, TcpState, TransferTime,
};
pub use vlsm::{
    allocate_vlsm, allocate_vlsm_sorted, parse_requirements, plan_vlsm, VlsmAllocation, VlsmPlan,
};
