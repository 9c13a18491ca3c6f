//! Terminal output utilities.
//!
//! Every renderer returns the text instead of printing it, `main` decides
//! where it goes.

use crate::models::{Ipv4Cidr, SubnetV4, SubnetV6};
use crate::processing::{
    EfficiencyClass, HostSizing, RouteSummary, SizingCandidate, SubnetCountPlan,
    SubnetCountPlanV6, TransferTime, VlsmAllocation,
};
use colored::{ColoredString, Colorize};
use itertools::Itertools;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Efficiency percentage colored by its class.
pub fn efficiency_label(percent: f64) -> ColoredString {
    let text = format!("{percent:.1}% ({})", EfficiencyClass::from_percent(percent));
    match EfficiencyClass::from_percent(percent) {
        EfficiencyClass::Excellent => text.green(),
        EfficiencyClass::Good => text.cyan(),
        EfficiencyClass::Fair => text.yellow(),
        EfficiencyClass::Poor => text.red(),
    }
}

/// `key: value` lines with the values lined up.
pub fn key_values<K: AsRef<str>>(pairs: &[(K, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.as_ref().len()).max().unwrap_or(0) + 1;
    pairs
        .iter()
        .map(|(k, v)| format!("{:<width$} {v}", format!("{}:", k.as_ref())))
        .join("\n")
}

fn heading(text: &str) -> String {
    format!("{}", text.bold().underline())
}

pub fn render_subnet_v4(subnet: &SubnetV4) -> String {
    let pairs = [
        ("Address", subnet.address.to_string()),
        ("Network", format!("{}/{}", subnet.network, subnet.prefix)),
        ("Netmask", subnet.mask.to_string()),
        ("Wildcard", subnet.wildcard.to_string()),
        ("Broadcast", subnet.broadcast.to_string()),
        ("Host range", subnet.host_range()),
        ("Total hosts", subnet.total_hosts.to_string()),
        ("Usable hosts", subnet.usable_hosts.to_string()),
        ("Class", subnet.class.to_string()),
        ("Type", subnet.address_type.to_string()),
        ("Binary mask", subnet.binary_mask()),
    ];
    format!("{}\n{}", heading(&subnet.to_string()), key_values(&pairs))
}

pub fn render_subnet_v6(subnet: &SubnetV6) -> String {
    let pairs = [
        ("Network", subnet.to_string()),
        ("Range", subnet.host_range()),
        ("Total addresses", subnet.total_addresses.to_string()),
        ("Usable addresses", subnet.usable_addresses.to_string()),
        ("Type", subnet.address_type.to_string()),
    ];
    format!("{}\n{}", heading(&subnet.to_string()), key_values(&pairs))
}

fn candidate_line(candidate: &SizingCandidate) -> String {
    format!(
        "{tier:<12} /{prefix:<3} {mask:<16} usable {usable:>10}  waste {waste:>10}  {eff}",
        tier = candidate.tier.to_string(),
        prefix = candidate.prefix,
        mask = candidate.mask.to_string(),
        usable = candidate.usable_hosts,
        waste = candidate.waste,
        eff = efficiency_label(candidate.efficiency),
    )
}

pub fn render_host_sizing(sizing: &HostSizing) -> String {
    let title = heading(&format!("Subnet size for {} hosts", sizing.required_hosts));
    let lines = sizing.candidates().iter().map(|c| candidate_line(c)).join("\n");
    format!("{title}\n{lines}")
}

pub fn render_count_plan(plan: &SubnetCountPlan) -> String {
    let pairs = [
        ("Subnets needed", plan.required_subnets.to_string()),
        ("Borrowed bits", plan.borrowed_bits.to_string()),
        ("Prefix", format!("/{} ({})", plan.prefix, plan.mask)),
        ("First subnet", format!("{}/{}", plan.network, plan.prefix)),
        ("Subnets created", plan.total_subnets.to_string()),
        ("Hosts per subnet", plan.hosts_per_subnet.to_string()),
        ("Usable per subnet", plan.usable_hosts_per_subnet.to_string()),
        ("Efficiency", efficiency_label(plan.efficiency).to_string()),
    ];
    key_values(&pairs)
}

pub fn render_count_plan_v6(plan: &SubnetCountPlanV6) -> String {
    let title = heading(&format!("IPv6 prefix for {} subnets", plan.required_subnets));
    let lines = plan
        .candidates()
        .iter()
        .map(|c| {
            format!(
                "{tier:<12} /{prefix:<4} subnets {total:>40}  {eff}",
                tier = c.tier.to_string(),
                prefix = c.prefix,
                total = c.total_subnets.to_string(),
                eff = efficiency_label(c.efficiency),
            )
        })
        .join("\n");
    format!("{title}\n{lines}")
}

pub fn render_transfer_time(time: &TransferTime) -> String {
    key_values(&[
        ("Data", format!("{} bits", time.data_bits)),
        ("Bandwidth", format!("{:.2} Mbps", time.bandwidth_bps / 1e6)),
        ("Seconds", format!("{:.2}", time.seconds)),
        ("Minutes", format!("{:.2}", time.minutes)),
        ("Hours", format!("{:.4}", time.hours)),
    ])
}

/// Allocation table in the quoted, right-aligned column style.
pub fn render_vlsm(allocations: &[VlsmAllocation], free: &[Ipv4Cidr]) -> String {
    let mut lines = vec![format!(
        r#"{idx},{needed},{cidr},{range},{broadcast},{usable},{waste}"#,
        idx = format_field("#", 5),
        needed = format_field("needed", 10),
        cidr = format_field("subnet", 20),
        range = format_field("hosts", 33),
        broadcast = format_field("broadcast", 17),
        usable = format_field("usable", 12),
        waste = format_field("waste", 10),
    )];
    lines.extend(allocations.iter().map(|a| {
        format!(
            r#"{idx},{needed},{cidr},{range},{broadcast},{usable},{waste}"#,
            idx = format_field(a.index, 5),
            needed = format_field(a.hosts_needed, 10),
            cidr = format_field(a.cidr(), 20),
            range = format_field(a.subnet.host_range(), 33),
            broadcast = format_field(a.subnet.broadcast, 17),
            usable = format_field(a.subnet.usable_hosts, 12),
            waste = format_field(a.waste(), 10),
        )
    }));
    if !free.is_empty() {
        lines.push(format!(
            "#{}# {}",
            "FREE".on_green(),
            free.iter().join(", ")
        ));
    }
    lines.join("\n")
}

/// Same column style for a list of equal subnets.
pub fn render_subnet_list(subnets: &[SubnetV4]) -> String {
    let mut lines = vec![format!(
        "{cnt},{cidr},{range},{broadcast}",
        cnt = format_field("cnt", 6),
        cidr = format_field("subnet", 20),
        range = format_field("hosts", 33),
        broadcast = format_field("broadcast", 17),
    )];
    lines.extend(subnets.iter().enumerate().map(|(i, s)| {
        format!(
            "{cnt},{cidr},{range},{broadcast}",
            cnt = format_field(i + 1, 6),
            cidr = format_field(s, 20),
            range = format_field(s.host_range(), 33),
            broadcast = format_field(s.broadcast, 17),
        )
    }));
    lines.join("\n")
}

pub fn render_summary(summary: &RouteSummary) -> String {
    let mut out = vec![heading(&format!(
        "Summary of {} networks ({})",
        summary.input_count, summary.address_range
    ))];
    if !summary.removed.is_empty() {
        out.push(format!(
            "#{}# covered by another input: {}",
            "NOTE".on_red(),
            summary.removed.iter().join(", ")
        ));
    }
    for candidate in &summary.summaries {
        out.push(format!(
            "{kind:<13} {net:<20} {mask:<16} wildcard {wc:<16} {eff}",
            kind = candidate.kind.to_string(),
            net = candidate.network.to_string(),
            mask = candidate.mask.to_string(),
            wc = candidate.wildcard.to_string(),
            eff = efficiency_label(candidate.efficiency),
        ));
        out.push(format!("{:13} {}", "", candidate.kind.description().dimmed()));
    }
    out.push(format!(
        "Exact cover ({}): {}",
        summary.exact_cover.len(),
        summary.exact_cover.iter().join(", ")
    ));
    if !summary.steps.is_empty() {
        out.push(String::new());
        out.extend(
            summary
                .steps
                .iter()
                .enumerate()
                .map(|(i, step)| format!("{}. {step}", i + 1)),
        );
    }
    out.join("\n")
}

/// A titled block of device commands.
pub fn render_commands(title: &str, commands: &[String]) -> String {
    format!("{}\n{}", heading(title), commands.iter().map(|c| format!("  {c}")).join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ipv4;
    use crate::processing::{
        allocate_vlsm, size_for_hosts, size_for_subnet_count_v6, summarize_routes, SummaryOptions,
    };

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "    \"test\"");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("test", 6), "\"test\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "\"long_value\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 6), "  \"42\"");
    }

    #[test]
    fn test_efficiency_label_text() {
        assert!(efficiency_label(98.4).to_string().contains("98.4% (excellent)"));
        assert!(efficiency_label(12.0).to_string().contains("12.0% (poor)"));
    }

    #[test]
    fn test_key_values_alignment() {
        let text = key_values(&[("a", "1".to_string()), ("long", "2".to_string())]);
        assert_eq!(text, "a:    1\nlong: 2");
    }

    #[test]
    fn test_render_subnet_v4() {
        let subnet = ipv4::derive_subnet_str("192.168.1.77", "/26").unwrap();
        let text = render_subnet_v4(&subnet);
        assert!(text.contains("192.168.1.64/26"));
        assert!(text.contains("192.168.1.65 - 192.168.1.126"));
        assert!(text.contains("255.255.255.192"));
    }

    #[test]
    fn test_render_host_sizing_has_three_rows() {
        let text = render_host_sizing(&size_for_hosts(50).unwrap());
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("/26"));
    }

    #[test]
    fn test_render_count_plan_v6() {
        let text = render_count_plan_v6(&size_for_subnet_count_v6(200).unwrap());
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("/120"));
        assert!(text.contains("65536"));
    }

    #[test]
    fn test_render_vlsm_rows() {
        let plan = allocate_vlsm("192.168.1.0", &[100, 50]).unwrap();
        let text = render_vlsm(&plan, &[]);
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("\"192.168.1.128/26\""));
    }

    #[test]
    fn test_render_summary() {
        let summary = summarize_routes(
            &["10.0.0.0/24", "10.0.1.0/24", "10.0.1.0/25"],
            &SummaryOptions::default(),
        )
        .unwrap();
        let text = render_summary(&summary);
        assert!(text.contains("10.0.0.0/23"));
        assert!(text.contains("covered by another input: 10.0.1.0/25"));
    }
}
