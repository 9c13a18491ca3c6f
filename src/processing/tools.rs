//! Network engineering helpers built on the IPv4 engine.
//!
//! Each helper derives the subnet first, so every command text is built from
//! the network address, never from the host address the user typed.

use crate::error::{Result, SubnetError};
use crate::models::ipv4::{self, MAX_LENGTH};
use crate::models::ipv6;
use crate::models::{AddressRange, SubnetV4};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AclWildcard {
    pub network: Ipv4Addr,
    pub prefix: u8,
    pub wildcard: Ipv4Addr,
    pub acl_command: String,
    pub host_command: String,
}

/// Cisco ACL lines matching a network.
pub fn acl_wildcard(network: &str, mask: &str) -> Result<AclWildcard> {
    let subnet = ipv4::derive_subnet_str(network, mask)?;
    Ok(AclWildcard {
        network: subnet.network,
        prefix: subnet.prefix,
        wildcard: subnet.wildcard,
        acl_command: format!(
            "access-list 101 permit ip {} {} any",
            subnet.network, subnet.wildcard
        ),
        host_command: format!("access-list 101 permit ip host {} any", subnet.network),
    })
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    pub network: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub prefix: u8,
    pub next_hop: Ipv4Addr,
    pub command: String,
}

pub fn static_route(network: &str, mask: &str, next_hop: &str) -> Result<StaticRoute> {
    let subnet = ipv4::derive_subnet_str(network, mask)?;
    let next_hop = Ipv4Addr::from(ipv4::parse_address(next_hop)?);
    Ok(StaticRoute {
        network: subnet.network,
        mask: subnet.mask,
        prefix: subnet.prefix,
        next_hop,
        command: format!("ip route {} {} {next_hop}", subnet.network, subnet.mask),
    })
}

/// Reservations and names used when building a DHCP pool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DhcpOptions {
    /// Addresses kept out of the pool after the first host.
    pub reserved_low: u32,
    /// Addresses kept out of the pool before the last host.
    pub reserved_high: u32,
    pub dns_server: String,
    pub pool_name: String,
}

impl Default for DhcpOptions {
    fn default() -> Self {
        DhcpOptions {
            reserved_low: 10,
            reserved_high: 10,
            dns_server: "8.8.8.8".to_string(),
            pool_name: "MYPOOL".to_string(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DhcpScope {
    pub subnet: SubnetV4,
    /// None when the reservations leave nothing to lease.
    pub pool: Option<AddressRange>,
    pub available: u64,
    pub default_router: Ipv4Addr,
    pub commands: Vec<String>,
}

pub fn dhcp_scope(network: &str, mask: &str, options: &DhcpOptions) -> Result<DhcpScope> {
    let subnet = ipv4::derive_subnet_str(network, mask)?;
    let start = i64::from(u32::from(subnet.first_host)) + i64::from(options.reserved_low);
    let end = i64::from(u32::from(subnet.last_host)) - i64::from(options.reserved_high);

    let pool = if start <= end {
        Some(AddressRange {
            start: Ipv4Addr::from(start as u32),
            end: Ipv4Addr::from(end as u32),
        })
    } else {
        log::debug!("dhcp_scope({subnet}) reservations leave an empty pool");
        None
    };
    let available = pool.map_or(0, |p| p.size());

    let default_router = subnet.first_host;
    let commands = vec![
        format!("ip dhcp pool {}", options.pool_name),
        format!("network {} {}", subnet.network, subnet.mask),
        format!("default-router {default_router}"),
        format!("dns-server {}", options.dns_server),
    ];

    Ok(DhcpScope {
        subnet,
        pool,
        available,
        default_router,
        commands,
    })
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NatKind {
    Static,
    Dynamic,
    Pat,
}

impl FromStr for NatKind {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(NatKind::Static),
            "dynamic" => Ok(NatKind::Dynamic),
            "pat" | "overload" => Ok(NatKind::Pat),
            _ => Err(SubnetError::InvalidRequirement(format!(
                "unknown NAT type {s:?} (static, dynamic, pat)"
            ))),
        }
    }
}

impl fmt::Display for NatKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NatKind::Static => "Static NAT",
            NatKind::Dynamic => "Dynamic NAT",
            NatKind::Pat => "PAT",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NatConfig {
    pub kind: NatKind,
    pub inside: Ipv4Addr,
    pub outside: Ipv4Addr,
    pub description: &'static str,
    pub commands: Vec<String>,
}

const NAT_POOL: &str = "MYPOOL";

/// IOS NAT configuration translating `inside` to `outside`.
pub fn nat_config(inside: &str, outside: &str, kind: NatKind) -> Result<NatConfig> {
    let inside = Ipv4Addr::from(ipv4::parse_address(inside)?);
    let outside = Ipv4Addr::from(ipv4::parse_address(outside)?);
    let pool = format!("ip nat pool {NAT_POOL} {outside} {outside} prefix-length 32");
    let acl = format!("access-list 1 permit {inside}");

    let (description, commands) = match kind {
        NatKind::Static => (
            "One-to-one mapping between inside and outside addresses",
            vec![format!("ip nat inside source static {inside} {outside}")],
        ),
        NatKind::Dynamic => (
            "Many-to-many mapping using a pool of addresses",
            vec![
                acl,
                pool,
                format!("ip nat inside source list 1 pool {NAT_POOL}"),
            ],
        ),
        NatKind::Pat => (
            "Many-to-one mapping using ports",
            vec![
                acl,
                pool,
                format!("ip nat inside source list 1 pool {NAT_POOL} overload"),
            ],
        ),
    };

    Ok(NatConfig {
        kind,
        inside,
        outside,
        description,
        commands,
    })
}

/// The six classic TCP control bits.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags(u8);

impl TcpFlags {
    pub const URG: u8 = 0x20;
    pub const ACK: u8 = 0x10;
    pub const PSH: u8 = 0x08;
    pub const RST: u8 = 0x04;
    pub const SYN: u8 = 0x02;
    pub const FIN: u8 = 0x01;

    const NAMES: [(&'static str, u8); 6] = [
        ("URG", Self::URG),
        ("ACK", Self::ACK),
        ("PSH", Self::PSH),
        ("RST", Self::RST),
        ("SYN", Self::SYN),
        ("FIN", Self::FIN),
    ];

    /// Bits above FIN..URG (ECE, CWR) are dropped.
    pub fn from_bits(bits: u8) -> TcpFlags {
        TcpFlags(bits & 0x3F)
    }

    pub fn from_names<I, S>(names: I) -> Result<TcpFlags>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bits = 0;
        for name in names {
            let name = name.as_ref();
            let (_, bit) = Self::NAMES
                .iter()
                .find(|(flag, _)| flag.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    SubnetError::InvalidRequirement(format!("unknown TCP flag {name:?}"))
                })?;
            bits |= bit;
        }
        Ok(TcpFlags(bits))
    }

    /// Accepts `0x12`, `18`, or flag names such as `SYN,ACK` / `syn+ack`.
    pub fn parse(text: &str) -> Result<TcpFlags> {
        let text = text.trim();
        let bad = || SubnetError::InvalidRequirement(format!("invalid TCP flags {text:?}"));
        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return u8::from_str_radix(hex, 16)
                .map(TcpFlags::from_bits)
                .map_err(|_| bad());
        }
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            return text.parse::<u8>().map(TcpFlags::from_bits).map_err(|_| bad());
        }
        TcpFlags::from_names(
            text.split(|c: char| c == ',' || c == '+' || c == '|' || c.is_whitespace())
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    /// Set flag names, most significant first.
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn hex(&self) -> String {
        format!("0x{:02X}", self.0)
    }

    pub fn binary(&self) -> String {
        format!("{:08b}", self.0)
    }

    /// Which part of a connection a segment with these flags usually belongs to.
    pub fn state(&self) -> TcpState {
        let (syn, ack, fin, rst, psh) = (
            self.contains(Self::SYN),
            self.contains(Self::ACK),
            self.contains(Self::FIN),
            self.contains(Self::RST),
            self.contains(Self::PSH),
        );
        if syn && !ack {
            TcpState::Syn
        } else if syn && ack {
            TcpState::SynAck
        } else if fin && ack {
            TcpState::FinAck
        } else if rst {
            TcpState::Rst
        } else if psh && ack {
            TcpState::PshAck
        } else if ack && !fin {
            TcpState::Ack
        } else {
            TcpState::Unknown
        }
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(","))
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Syn,
    SynAck,
    Ack,
    FinAck,
    Rst,
    PshAck,
    Unknown,
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TcpState::Syn => "SYN (Connection Establishment)",
            TcpState::SynAck => "SYN-ACK (Connection Establishment)",
            TcpState::Ack => "ACK (Established Connection)",
            TcpState::FinAck => "FIN-ACK (Connection Termination)",
            TcpState::Rst => "RST (Connection Reset)",
            TcpState::PshAck => "PSH-ACK (Data Transfer)",
            TcpState::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OspfNetworkType {
    PointToPoint,
    Broadcast,
    Nbma,
}

impl OspfNetworkType {
    /// Keyword for `ip ospf network <keyword>`.
    pub fn keyword(&self) -> &'static str {
        match self {
            OspfNetworkType::PointToPoint => "point-to-point",
            OspfNetworkType::Broadcast => "broadcast",
            OspfNetworkType::Nbma => "non-broadcast",
        }
    }
}

impl fmt::Display for OspfNetworkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            OspfNetworkType::PointToPoint => "Point-to-Point",
            OspfNetworkType::Broadcast => "Broadcast",
            OspfNetworkType::Nbma => "Non-Broadcast Multi-Access (NBMA)",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OspfHint {
    pub network_type: OspfNetworkType,
    pub explanation: &'static str,
    pub command: String,
}

/// Rule-of-thumb OSPF network type for a subnet size.
pub fn ospf_network_type(subnet: &SubnetV4) -> OspfHint {
    let (network_type, explanation) = match subnet.prefix {
        24..=30 if subnet.usable_hosts == 2 => (
            OspfNetworkType::PointToPoint,
            "Two usable hosts - typically serial link",
        ),
        24..=30 => (
            OspfNetworkType::Broadcast,
            "Multi-access network with multiple hosts",
        ),
        0..=23 => (
            OspfNetworkType::Nbma,
            "Large network requiring DR/BDR election",
        ),
        MAX_LENGTH => (
            OspfNetworkType::PointToPoint,
            "Host route - single host network",
        ),
        _ => (
            OspfNetworkType::PointToPoint,
            "Default OSPF network type for serial links",
        ),
    };
    OspfHint {
        network_type,
        explanation,
        command: format!("ip ospf network {}", network_type.keyword()),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub subnet: SubnetV4,
    pub gateway: Ipv4Addr,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Diagnosis {
    /// No recommendation was needed.
    pub fn is_healthy(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Check a host address, mask and default gateway for the usual mistakes.
pub fn troubleshoot(ip: &str, mask: &str, gateway: &str) -> Result<Diagnosis> {
    let subnet = ipv4::derive_subnet_str(ip, mask)?;
    let gateway = Ipv4Addr::from(ipv4::parse_address(gateway)?);
    let mut findings = Vec::new();
    let mut recommendations = Vec::new();

    let reserved = subnet.total_hosts > 2
        && (subnet.address == subnet.network || subnet.address == subnet.broadcast);
    if reserved {
        findings.push("IP address is network or broadcast address".to_string());
        recommendations.push(format!(
            "Use a host address between {} and {}",
            subnet.first_host, subnet.last_host
        ));
    } else {
        findings.push("IP address is valid for this subnet".to_string());
    }

    if gateway == subnet.address {
        findings.push("Gateway cannot be the same as host IP".to_string());
        recommendations.push("Gateway should be a different IP in the same subnet".to_string());
    } else if gateway < subnet.first_host || gateway > subnet.last_host {
        findings.push("Gateway is not in the same subnet".to_string());
        recommendations.push(format!(
            "Gateway must be in the range {} to {}",
            subnet.first_host, subnet.last_host
        ));
    } else {
        findings.push("Gateway is in the same subnet".to_string());
    }

    if subnet.prefix < 8 || subnet.prefix > 30 {
        findings.push("Unusual subnet mask - verify network requirements".to_string());
    }

    log::debug!(
        "troubleshoot({}/{}) {} recommendations",
        subnet.address,
        subnet.prefix,
        recommendations.len()
    );
    Ok(Diagnosis {
        subnet,
        gateway,
        findings,
        recommendations,
    })
}

/// Data size units, binary multiples of a byte.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl DataUnit {
    pub fn bits(&self) -> f64 {
        let bytes: u64 = match self {
            DataUnit::B => 1,
            DataUnit::KB => 1 << 10,
            DataUnit::MB => 1 << 20,
            DataUnit::GB => 1 << 30,
            DataUnit::TB => 1 << 40,
        };
        bytes as f64 * 8.0
    }
}

impl FromStr for DataUnit {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "B" => Ok(DataUnit::B),
            "KB" => Ok(DataUnit::KB),
            "MB" => Ok(DataUnit::MB),
            "GB" => Ok(DataUnit::GB),
            "TB" => Ok(DataUnit::TB),
            _ => Err(SubnetError::InvalidRequirement(format!(
                "unknown data unit {s:?} (B, KB, MB, GB, TB)"
            ))),
        }
    }
}

/// Line rate units, decimal multiples of a bit per second.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    Bps,
    Kbps,
    Mbps,
    Gbps,
    Tbps,
}

impl RateUnit {
    pub fn bits_per_second(&self) -> f64 {
        match self {
            RateUnit::Bps => 1.0,
            RateUnit::Kbps => 1e3,
            RateUnit::Mbps => 1e6,
            RateUnit::Gbps => 1e9,
            RateUnit::Tbps => 1e12,
        }
    }
}

impl FromStr for RateUnit {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bps" => Ok(RateUnit::Bps),
            "kbps" => Ok(RateUnit::Kbps),
            "mbps" => Ok(RateUnit::Mbps),
            "gbps" => Ok(RateUnit::Gbps),
            "tbps" => Ok(RateUnit::Tbps),
            _ => Err(SubnetError::InvalidRequirement(format!(
                "unknown bandwidth unit {s:?} (bps, Kbps, Mbps, Gbps, Tbps)"
            ))),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TransferTime {
    pub data_bits: f64,
    pub bandwidth_bps: f64,
    pub seconds: f64,
    pub minutes: f64,
    pub hours: f64,
}

/// Time to move `size` of data over a `bandwidth` link at full line rate.
pub fn transfer_time(
    size: f64,
    unit: DataUnit,
    bandwidth: f64,
    rate: RateUnit,
) -> Result<TransferTime> {
    if !(size.is_finite() && size > 0.0 && bandwidth.is_finite() && bandwidth > 0.0) {
        return Err(SubnetError::InvalidRequirement(format!(
            "data size {size} and bandwidth {bandwidth} must be positive numbers"
        )));
    }
    let data_bits = size * unit.bits();
    let bandwidth_bps = bandwidth * rate.bits_per_second();
    let seconds = data_bits / bandwidth_bps;
    Ok(TransferTime {
        data_bits,
        bandwidth_bps,
        seconds,
        minutes: seconds / 60.0,
        hours: seconds / 3600.0,
    })
}

/// IPv6 forms carrying an IPv4 address.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Embedding {
    pub ipv4: Ipv4Addr,
    /// `::ffff:c0a8:101`
    pub mapped: String,
    /// `::ffff:192.168.1.1`
    pub mapped_dotted: String,
    /// Deprecated IPv4-compatible form, `::c0a8:101`.
    pub compatible: String,
}

pub fn embed_ipv4(address: &str) -> Result<Ipv4Embedding> {
    let bits = ipv4::parse_address(address)?;
    let ipv4 = Ipv4Addr::from(bits);
    Ok(Ipv4Embedding {
        ipv4,
        mapped: ipv6::compress_bits((0xffff_u128 << 32) | u128::from(bits)),
        mapped_dotted: format!("::ffff:{ipv4}"),
        compatible: ipv6::compress_bits(u128::from(bits)),
    })
}

/// One address in every notation the converters offer.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AddressForms {
    pub address: Ipv4Addr,
    pub decimal: u32,
    pub binary: String,
    pub hex: String,
}

/// Accepts dotted-decimal or eight hex digits (`C0A80101`, `0xC0A80101`).
pub fn address_forms(text: &str) -> Result<AddressForms> {
    let text = text.trim();
    let bits = match ipv4::parse_address(text) {
        Ok(bits) => bits,
        Err(dotted_err) => ipv4::from_hex(text).map_err(|_| dotted_err)?,
    };
    Ok(AddressForms {
        address: Ipv4Addr::from(bits),
        decimal: bits,
        binary: ipv4::to_binary(bits),
        hex: ipv4::to_hex(bits),
    })
}
