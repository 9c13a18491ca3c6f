//! Command line front end.
//!
//! [`Cli`] is parsed in `main`; [`run`] turns a parsed command into the text
//! to print so every command can be tested without a terminal.

use crate::config::Config;
use crate::models::{ipv4, ipv6, Ipv4Cidr};
use crate::output;
use crate::processing::{self, DataUnit, NatKind, RateUnit, SummaryOptions, TcpFlags};
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

/// IPv4/IPv6 subnet calculator and planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Pull from `Cargo.toml`
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Print tables as CSV (vlsm, table, summarize)
    #[arg(long, global = true, conflicts_with = "json")]
    pub csv: bool,

    /// JSON config file
    #[arg(long, global = true, value_name = "FILE", env = "SUBNET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Everything about an IPv4 address and mask
    Info(NetworkArgs),
    /// Everything about an IPv6 address and prefix
    Info6(Info6Args),
    /// Suggest subnet sizes for a host count
    Hosts(HostsArgs),
    /// Borrow bits for a number of equal subnets
    Subnets(SubnetsArgs),
    /// Suggest IPv6 prefixes for a number of subnets
    Subnets6(Subnets6Args),
    /// Pack host requirements into consecutive subnets
    Vlsm(VlsmArgs),
    /// Summarize a list of networks into a supernet
    Summarize(SummarizeArgs),
    /// List consecutive subnets of one size
    Table(TableArgs),
    /// Split a network into longer prefixes
    Split(SplitArgs),
    /// Cisco ACL wildcard lines for a network
    Acl(NetworkArgs),
    /// Cisco static route for a network
    Route(RouteArgs),
    /// Cisco DHCP pool for a network
    Dhcp(NetworkArgs),
    /// Cisco NAT configuration
    Nat(NatArgs),
    /// Encode or decode TCP control flags
    TcpFlags(TcpFlagsArgs),
    /// Suggested OSPF network type for a subnet
    Ospf(NetworkArgs),
    /// Check a host address, mask and gateway
    Troubleshoot(TroubleshootArgs),
    /// Show an address in binary, hex and IPv6 forms
    Convert(ConvertArgs),
    /// Time to transfer data over a link
    Speed(SpeedArgs),
}

#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// Address, optionally with `/prefix`
    pub address: String,
    /// Mask as `255.255.255.0`, `/24` or `24` when not given with the address
    pub mask: Option<String>,
}

#[derive(Args, Debug)]
pub struct Info6Args {
    /// Address, optionally with `/prefix`
    pub address: String,
    /// Prefix length when not given with the address
    pub prefix: Option<String>,
}

#[derive(Args, Debug)]
pub struct HostsArgs {
    pub hosts: u64,
}

#[derive(Args, Debug)]
pub struct SubnetsArgs {
    /// Base address
    pub base: String,
    /// Number of subnets needed
    pub count: u64,
}

#[derive(Args, Debug)]
pub struct Subnets6Args {
    /// Number of subnets needed
    pub count: u64,
}

#[derive(Args, Debug)]
pub struct VlsmArgs {
    /// Start address, or a `network/prefix` every subnet must fit in
    pub base: String,
    /// Host counts, e.g. `100 50 10` or `100,50,10`
    #[arg(required = true)]
    pub requirements: Vec<String>,
    /// Pack the largest requirement first
    #[arg(short, long)]
    pub sorted: bool,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Networks as `address/prefix`, separated by spaces or commas
    #[arg(required = true)]
    pub networks: Vec<String>,
    /// Most summary candidates to show
    #[arg(short, long)]
    pub max: Option<usize>,
    /// Fail when one network is contained in another
    #[arg(long)]
    pub no_overlap: bool,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    pub base: String,
    pub mask: String,
    #[arg(short, long, default_value_t = 8)]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Parent as `network/prefix`
    pub network: String,
    /// New prefix length, e.g. `26` or `/26`
    pub prefix: String,
    /// Most children to list (defaults to the configured limit)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Destination, optionally with `/prefix`
    pub network: String,
    pub next_hop: String,
    /// Mask when not given with the destination
    #[arg(short, long)]
    pub mask: Option<String>,
}

#[derive(Args, Debug)]
pub struct NatArgs {
    pub inside: String,
    pub outside: String,
    /// static, dynamic or pat
    #[arg(short, long, default_value = "static")]
    pub kind: String,
}

#[derive(Args, Debug)]
pub struct TcpFlagsArgs {
    /// `0x12`, `18` or names like `SYN,ACK`
    pub flags: String,
}

#[derive(Args, Debug)]
pub struct TroubleshootArgs {
    /// Host address, optionally with `/prefix`
    pub ip: String,
    pub gateway: String,
    /// Mask when not given with the address
    #[arg(short, long)]
    pub mask: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// IPv4 dotted, eight hex digits, or IPv6 text
    pub address: String,
}

#[derive(Args, Debug)]
pub struct SpeedArgs {
    /// Amount of data
    pub size: f64,
    /// B, KB, MB, GB or TB
    pub unit: String,
    /// Link bandwidth
    pub bandwidth: f64,
    /// bps, Kbps, Mbps, Gbps or Tbps
    pub rate: String,
}

/// Split `10.0.0.1/24` style input, or pair it with a separate mask.
fn address_and_mask(
    address: &str,
    mask: Option<&str>,
) -> Result<(String, String), Box<dyn Error>> {
    let (address, inline) = match address.split_once('/') {
        Some((addr, prefix)) => (addr, Some(format!("/{prefix}"))),
        None => (address, None),
    };
    let mask = match (inline, mask) {
        (Some(_), Some(_)) => {
            return Err(format!("mask given twice for {address}").into());
        }
        (Some(inline), None) => inline,
        (None, Some(mask)) if mask.bytes().all(|b| b.is_ascii_digit()) => format!("/{mask}"),
        (None, Some(mask)) => mask.to_string(),
        (None, None) => return Err(format!("no mask or prefix for {address}").into()),
    };
    Ok((address.to_string(), mask))
}

fn emit<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String, Box<dyn Error>> {
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(text(value))
    }
}

/// Execute `cli.command` with `config` and return the text to print.
pub fn run(cli: &Cli, config: &Config) -> Result<String, Box<dyn Error>> {
    let json = cli.json;
    log::debug!("run({:?})", cli.command);

    match &cli.command {
        Commands::Info(args) => {
            let (address, mask) = address_and_mask(&args.address, args.mask.as_deref())?;
            let subnet = ipv4::derive_subnet_str(&address, &mask)?;
            emit(json, &subnet, output::render_subnet_v4)
        }
        Commands::Info6(args) => {
            let (address, prefix) = address_and_mask(&args.address, args.prefix.as_deref())?;
            let subnet = ipv6::derive_subnet_str(&address, &prefix)?;
            emit(json, &subnet, output::render_subnet_v6)
        }
        Commands::Hosts(args) => {
            let sizing = processing::size_for_hosts(args.hosts)?;
            emit(json, &sizing, output::render_host_sizing)
        }
        Commands::Subnets(args) => {
            let plan = processing::size_for_subnet_count_str(&args.base, args.count)?;
            emit(json, &plan, output::render_count_plan)
        }
        Commands::Subnets6(args) => {
            let plan = processing::size_for_subnet_count_v6(args.count)?;
            emit(json, &plan, output::render_count_plan_v6)
        }
        Commands::Vlsm(args) => {
            let requirements = processing::parse_requirements(&args.requirements.join(" "))?;
            if args.base.contains('/') {
                let parent = Ipv4Cidr::new(&args.base)?;
                let plan = processing::plan_vlsm(parent, &requirements, args.sorted)?;
                if cli.csv {
                    return Ok(output::vlsm_csv(&plan.allocations));
                }
                emit(json, &plan, |p| output::render_vlsm(&p.allocations, &p.free))
            } else {
                let allocations = if args.sorted {
                    processing::allocate_vlsm_sorted(&args.base, &requirements)?
                } else {
                    processing::allocate_vlsm(&args.base, &requirements)?
                };
                if cli.csv {
                    return Ok(output::vlsm_csv(&allocations));
                }
                emit(json, &allocations, |a| output::render_vlsm(a, &[]))
            }
        }
        Commands::Summarize(args) => {
            let networks = processing::parse_network_list(&args.networks.join(" "));
            let mut options: SummaryOptions = config.summary.clone();
            if let Some(max) = args.max {
                options.max_summaries = max;
            }
            if args.no_overlap {
                options.allow_overlapping = false;
            }
            let summary = processing::summarize_routes(&networks, &options)?;
            if cli.csv {
                return Ok(output::summary_csv(&summary));
            }
            emit(json, &summary, output::render_summary)
        }
        Commands::Table(args) => {
            let mask = if args.mask.bytes().all(|b| b.is_ascii_digit()) {
                format!("/{}", args.mask)
            } else {
                args.mask.clone()
            };
            let count = args.count.min(config.split_limit);
            if count < args.count {
                log::warn!("table limited to {count} of {} rows", args.count);
            }
            let table = processing::subnet_table(&args.base, &mask, count)?;
            if cli.csv {
                return Ok(output::subnet_table_csv(&table));
            }
            emit(json, &table, |t| {
                let mut text = output::render_subnet_list(t);
                if count < args.count {
                    text.push_str(&format!("\n... {count} of {} shown", args.count));
                }
                text
            })
        }
        Commands::Split(args) => {
            let parent = Ipv4Cidr::new(&args.network)?;
            let prefix = ipv4::parse_mask(&format!("/{}", args.prefix.trim_start_matches('/')))?;
            let limit = args.limit.unwrap_or(config.split_limit);
            let children = processing::split_network(parent, prefix, limit)?;
            let total = processing::child_count(parent, prefix);
            emit(json, &children, |c| {
                let mut text = c.iter().join("\n");
                if (c.len() as u64) < total {
                    text.push_str(&format!("\n... {} of {total} shown", c.len()));
                }
                text
            })
        }
        Commands::Acl(args) => {
            let (address, mask) = address_and_mask(&args.address, args.mask.as_deref())?;
            let acl = processing::acl_wildcard(&address, &mask)?;
            emit(json, &acl, |a| {
                output::render_commands(
                    &format!("ACL for {}/{} (wildcard {})", a.network, a.prefix, a.wildcard),
                    &[a.acl_command.clone(), a.host_command.clone()],
                )
            })
        }
        Commands::Route(args) => {
            let (address, mask) = address_and_mask(&args.network, args.mask.as_deref())?;
            let route = processing::static_route(&address, &mask, &args.next_hop)?;
            emit(json, &route, |r| {
                output::render_commands("Static route", &[r.command.clone()])
            })
        }
        Commands::Dhcp(args) => {
            let (address, mask) = address_and_mask(&args.address, args.mask.as_deref())?;
            let scope = processing::dhcp_scope(&address, &mask, &config.dhcp)?;
            emit(json, &scope, |s| {
                let pool = s
                    .pool
                    .map_or_else(|| "none".to_string(), |p| p.to_string());
                format!(
                    "{}\n{}",
                    output::key_values(&[
                        ("Pool", pool),
                        ("Available", s.available.to_string()),
                        ("Default router", s.default_router.to_string()),
                    ]),
                    output::render_commands("Configuration", &s.commands)
                )
            })
        }
        Commands::Nat(args) => {
            let kind: NatKind = args.kind.parse()?;
            let nat = processing::nat_config(&args.inside, &args.outside, kind)?;
            emit(json, &nat, |n| {
                output::render_commands(&format!("{}: {}", n.kind, n.description), &n.commands)
            })
        }
        Commands::TcpFlags(args) => {
            let flags = TcpFlags::parse(&args.flags)?;
            if json {
                let value = serde_json::json!({
                    "bits": flags.bits(),
                    "hex": flags.hex(),
                    "binary": flags.binary(),
                    "flags": flags.names(),
                    "state": flags.state().to_string(),
                });
                return Ok(serde_json::to_string_pretty(&value)?);
            }
            Ok(output::key_values(&[
                ("Flags", flags.to_string()),
                ("Hex", flags.hex()),
                ("Binary", flags.binary()),
                ("Decimal", flags.bits().to_string()),
                ("State", flags.state().to_string()),
            ]))
        }
        Commands::Ospf(args) => {
            let (address, mask) = address_and_mask(&args.address, args.mask.as_deref())?;
            let subnet = ipv4::derive_subnet_str(&address, &mask)?;
            let hint = processing::ospf_network_type(&subnet);
            emit(json, &hint, |h| {
                output::render_commands(
                    &format!("{} - {}", h.network_type, h.explanation),
                    &[h.command.clone()],
                )
            })
        }
        Commands::Troubleshoot(args) => {
            let (address, mask) = address_and_mask(&args.ip, args.mask.as_deref())?;
            let diagnosis = processing::troubleshoot(&address, &mask, &args.gateway)?;
            emit(json, &diagnosis, |d| {
                let status = if d.is_healthy() { "OK" } else { "ISSUES FOUND" };
                let mut lines = vec![format!("{} {status}", d.subnet.cidr())];
                lines.extend(d.findings.iter().map(|f| format!("  - {f}")));
                lines.extend(d.recommendations.iter().map(|r| format!("  > {r}")));
                lines.join("\n")
            })
        }
        Commands::Convert(args) => {
            let text = args.address.trim();
            if text.contains(':') {
                let bits = ipv6::to_bits(text)?;
                if json {
                    let value = serde_json::json!({
                        "compressed": ipv6::compress_bits(bits),
                        "expanded": ipv6::from_bits(bits),
                        "binary": ipv6::to_binary(bits),
                        "type": ipv6::classify(bits).to_string(),
                    });
                    return Ok(serde_json::to_string_pretty(&value)?);
                }
                return Ok(output::key_values(&[
                    ("Compressed", ipv6::compress_bits(bits)),
                    ("Expanded", ipv6::from_bits(bits)),
                    ("Type", ipv6::classify(bits).to_string()),
                ]));
            }
            let forms = processing::address_forms(text)?;
            let embedded = processing::embed_ipv4(&forms.address.to_string())?;
            if json {
                let value = serde_json::json!({ "ipv4": forms, "ipv6": embedded });
                return Ok(serde_json::to_string_pretty(&value)?);
            }
            Ok(output::key_values(&[
                ("Address", forms.address.to_string()),
                ("Decimal", forms.decimal.to_string()),
                ("Binary", forms.binary),
                ("Hex", forms.hex),
                ("IPv4-mapped", embedded.mapped),
                ("IPv4-mapped (dotted)", embedded.mapped_dotted),
                ("IPv4-compatible", embedded.compatible),
            ]))
        }
        Commands::Speed(args) => {
            let unit: DataUnit = args.unit.parse()?;
            let rate: RateUnit = args.rate.parse()?;
            let time = processing::transfer_time(args.size, unit, args.bandwidth, rate)?;
            emit(json, &time, output::render_transfer_time)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Result<String, Box<dyn Error>> {
        let cli = Cli::try_parse_from(std::iter::once("subnet-toolkit").chain(args.iter().copied()))?;
        run(&cli, &Config::default())
    }

    #[test]
    fn test_address_and_mask() {
        assert_eq!(
            address_and_mask("10.0.0.1/24", None).unwrap(),
            ("10.0.0.1".to_string(), "/24".to_string())
        );
        assert_eq!(
            address_and_mask("10.0.0.1", Some("24")).unwrap().1,
            "/24"
        );
        assert_eq!(
            address_and_mask("10.0.0.1", Some("255.255.0.0")).unwrap().1,
            "255.255.0.0"
        );
        assert!(address_and_mask("10.0.0.1", None).is_err());
        assert!(address_and_mask("10.0.0.1/24", Some("/24")).is_err());
    }

    #[test]
    fn test_info_json() {
        let out = run_args(&["--json", "info", "192.168.1.130/25"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["network"], "192.168.1.128");
        assert_eq!(value["usable_hosts"], 126);
    }

    #[test]
    fn test_vlsm_csv() {
        let out = run_args(&["vlsm", "192.168.1.0", "100,50", "10", "--csv"]).unwrap();
        assert_eq!(out.lines().count(), 4);
        assert!(out.contains("192.168.1.192/28"));
    }

    #[test]
    fn test_vlsm_in_parent_lists_free_blocks() {
        let out = run_args(&["vlsm", "192.168.1.0/24", "100", "50", "10"]).unwrap();
        assert!(out.contains("192.168.1.224/27"));
    }

    #[test]
    fn test_summarize_no_overlap() {
        let err = run_args(&["summarize", "10.0.0.0/16", "10.0.1.0/24", "--no-overlap"])
            .unwrap_err();
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn test_split_reports_truncation() {
        let out = run_args(&["split", "10.0.0.0/16", "24", "--limit", "2"]).unwrap();
        assert_eq!(
            out,
            "10.0.0.0/24\n10.0.1.0/24\n... 2 of 256 shown"
        );
    }

    #[test]
    fn test_convert_hex() {
        let out = run_args(&["--json", "convert", "C0A80101"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["ipv4"]["address"], "192.168.1.1");
        assert_eq!(value["ipv6"]["mapped"], "::ffff:c0a8:101");
    }

    #[test]
    fn test_subnets6_json() {
        let out = run_args(&["--json", "subnets6", "200"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["exact"]["prefix"], 120);
        assert_eq!(value["recommended"]["total_subnets"], "4096");
    }

    #[test]
    fn test_table_is_limited_by_config() {
        let cli = Cli::try_parse_from([
            "subnet-toolkit", "table", "10.0.0.0", "30", "--count", "1000000",
        ])
        .unwrap();
        let config = Config {
            split_limit: 3,
            ..Config::default()
        };
        let out = run(&cli, &config).unwrap();
        assert!(out.ends_with("... 3 of 1000000 shown"));
        assert!(out.contains("\"10.0.0.8/30\""));
    }

    #[test]
    fn test_speed() {
        let out = run_args(&["--json", "speed", "1", "GB", "100", "Mbps"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!((value["seconds"].as_f64().unwrap() - 85.899).abs() < 0.001);
        assert!(run_args(&["speed", "1", "PB", "100", "Mbps"]).is_err());
    }

    #[test]
    fn test_bad_nat_kind() {
        assert!(run_args(&["nat", "10.0.0.1", "1.2.3.4", "--kind", "twice"]).is_err());
    }
}
