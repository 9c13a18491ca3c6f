//! Integration tests for subnet-toolkit
//!
//! These tests go through the public API the way the binary does: engine
//! first, then the planner on top of it.

use subnet_toolkit::models::{ipv4, ipv6, AddressType, IpClass, Ipv4Cidr};
use subnet_toolkit::processing::{
    allocate_vlsm, dhcp_scope, find_gaps, size_for_hosts, split_network, summarize_routes,
    DhcpOptions, SummaryKind, SummaryOptions,
};
use subnet_toolkit::{Config, SubnetError};

#[test]
fn test_address_round_trip() {
    for text in [
        "0.0.0.0",
        "10.0.0.1",
        "172.16.254.3",
        "192.168.1.10",
        "255.255.255.255",
    ] {
        let bits = ipv4::parse_address(text).expect("valid address");
        assert_eq!(ipv4::format_address(bits), text);
    }
}

#[test]
fn test_prefix_mask_round_trip() {
    for prefix in 0..=32u8 {
        let mask = ipv4::cidr_to_mask(prefix).unwrap();
        assert_eq!(ipv4::mask_to_cidr(mask).unwrap(), prefix, "/{prefix}");
    }
}

#[test]
fn test_ipv6_expand_compress_round_trip() {
    for expanded in [
        "2001:0db8:0000:0000:0000:0000:0000:0001",
        "0000:0000:0000:0000:0000:0000:0000:0000",
        "fe80:0000:0000:0000:0202:b3ff:fe1e:8329",
        "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff",
        "2001:0db8:0000:0001:0000:0000:0000:0000",
    ] {
        let compressed = ipv6::compress(expanded).unwrap();
        assert_eq!(ipv6::expand(&compressed).unwrap(), expanded);
    }
    assert_eq!(
        ipv6::compress("2001:0db8:0000:0000:0000:0000:0000:0001").unwrap(),
        "2001:db8::1"
    );
}

#[test]
fn test_derive_slash_24() {
    let s = ipv4::derive_subnet_str("192.168.1.10", "/24").unwrap();
    assert_eq!(s.network.to_string(), "192.168.1.0");
    assert_eq!(s.broadcast.to_string(), "192.168.1.255");
    assert_eq!(s.first_host.to_string(), "192.168.1.1");
    assert_eq!(s.last_host.to_string(), "192.168.1.254");
    assert_eq!(s.total_hosts, 256);
    assert_eq!(s.usable_hosts, 254);
}

#[test]
fn test_derive_point_to_point() {
    let s = ipv4::derive_subnet_str("10.0.0.1", "/31").unwrap();
    assert_eq!(s.total_hosts, 2);
    assert_eq!(s.usable_hosts, 2);
}

#[test]
fn test_size_for_fifty_hosts() {
    let sizing = size_for_hosts(50).unwrap();
    assert_eq!(sizing.exact.prefix, 26);
    assert_eq!(sizing.exact.total_hosts, 64);
    assert_eq!(sizing.exact.usable_hosts, 62);
    assert!((sizing.exact.efficiency - 80.6).abs() < 0.1);
}

#[test]
fn test_vlsm_consecutive_blocks() {
    let plan = allocate_vlsm("192.168.1.0", &[100, 50, 10]).unwrap();
    let prefixes: Vec<u8> = plan.iter().map(|a| a.prefix).collect();
    assert_eq!(prefixes, vec![25, 26, 28]);
    assert_eq!(
        u32::from(plan[1].subnet.network),
        u32::from(plan[0].subnet.network) + 128
    );
    for pair in plan.windows(2) {
        assert!(pair[0].subnet.broadcast < pair[1].subnet.network);
    }
}

#[test]
fn test_summarize_two_slash_24() {
    let summary = summarize_routes(
        &["192.168.0.0/24", "192.168.1.0/24"],
        &SummaryOptions::default(),
    )
    .unwrap();
    let best = summary.best().unwrap();
    assert_eq!(best.kind, SummaryKind::Minimal);
    assert_eq!(best.network.to_string(), "192.168.0.0/23");
    assert_eq!(best.efficiency, 100.0);
    assert_eq!(summary.exact_cover, vec![best.network]);
}

#[test]
fn test_non_contiguous_mask() {
    let mask = ipv4::parse_address("255.255.254.1").unwrap();
    assert!(matches!(
        ipv4::mask_to_cidr(mask),
        Err(SubnetError::InvalidMask(_))
    ));
}

#[test]
fn test_classification_axes_are_separate() {
    let loopback = ipv4::parse_address("127.0.0.1").unwrap();
    assert_eq!(ipv4::address_type(loopback), AddressType::Loopback);
    assert_ne!(ipv4::classify(loopback), IpClass::A);
}

#[test]
fn test_ipv6_slash_zero_is_exact() {
    let s = ipv6::derive_subnet("::", 0).unwrap();
    assert_eq!(
        ipv6::compress_bits(u128::from(s.last)),
        "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff"
    );
    assert_eq!(
        s.total_addresses.to_string(),
        "340282366920938463463374607431768211456"
    );
}

#[test]
fn test_vlsm_plan_then_split_free_space() {
    let parent = Ipv4Cidr::new("10.1.0.0/22").unwrap();
    let plan = allocate_vlsm("10.1.0.0/22", &[500, 200]).unwrap();
    let used: Vec<Ipv4Cidr> = plan.iter().map(|a| a.cidr()).collect();
    let free = find_gaps(parent, &used);
    assert_eq!(free, vec![Ipv4Cidr::new("10.1.3.0/24").unwrap()]);

    let children = split_network(free[0], 26, 16).unwrap();
    assert_eq!(children.len(), 4);
    assert_eq!(children[3].to_string(), "10.1.3.192/26");
}

#[test]
fn test_dhcp_scope_slash_24() {
    let scope = dhcp_scope("192.168.1.0", "255.255.255.0", &DhcpOptions::default()).unwrap();
    let pool = scope.pool.unwrap();
    assert_eq!(pool.to_string(), "192.168.1.11 - 192.168.1.244");
    assert_eq!(scope.available, 234);
}

#[test]
fn test_config_feeds_summary_options() {
    let config = Config::from_json_str(r#"{"summary": {"max_summaries": 1}}"#).unwrap();
    let summary = summarize_routes(&["10.0.0.0/24", "10.0.2.0/24"], &config.summary).unwrap();
    assert_eq!(summary.summaries.len(), 1);
    assert_eq!(summary.summaries[0].network.to_string(), "10.0.0.0/22");
}
