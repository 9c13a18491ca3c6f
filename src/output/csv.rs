//! CSV export of plans and tables.

use crate::models::SubnetV4;
use crate::processing::{RouteSummary, VlsmAllocation};
use itertools::Itertools;

/// Quote a field when it holds a comma or double quote.
pub fn escape_csv_field(input: &str) -> String {
    if input.contains(',') || input.contains('"') || input.contains('\n') {
        // excel does not like spaces after comma between fields, so none are added
        let escaped = input.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        input.to_string()
    }
}

pub fn csv_row<T: ToString>(fields: &[T]) -> String {
    fields
        .iter()
        .map(|f| escape_csv_field(&f.to_string()))
        .join(",")
}

pub fn vlsm_csv(allocations: &[VlsmAllocation]) -> String {
    let header = csv_row(&[
        "index",
        "hosts_needed",
        "subnet",
        "mask",
        "first_host",
        "last_host",
        "broadcast",
        "usable_hosts",
        "waste",
    ]);
    std::iter::once(header)
        .chain(allocations.iter().map(|a| {
            csv_row(&[
                a.index.to_string(),
                a.hosts_needed.to_string(),
                a.cidr().to_string(),
                a.subnet.mask.to_string(),
                a.subnet.first_host.to_string(),
                a.subnet.last_host.to_string(),
                a.subnet.broadcast.to_string(),
                a.subnet.usable_hosts.to_string(),
                a.waste().to_string(),
            ])
        }))
        .join("\n")
}

pub fn subnet_table_csv(subnets: &[SubnetV4]) -> String {
    let header = csv_row(&[
        "subnet",
        "network",
        "first_host",
        "last_host",
        "broadcast",
        "usable_hosts",
    ]);
    std::iter::once(header)
        .chain(subnets.iter().map(|s| {
            csv_row(&[
                s.to_string(),
                s.network.to_string(),
                s.first_host.to_string(),
                s.last_host.to_string(),
                s.broadcast.to_string(),
                s.usable_hosts.to_string(),
            ])
        }))
        .join("\n")
}

pub fn summary_csv(summary: &RouteSummary) -> String {
    let header = csv_row(&[
        "kind",
        "summary",
        "mask",
        "wildcard",
        "total_hosts",
        "covered_hosts",
        "efficiency",
        "description",
    ]);
    std::iter::once(header)
        .chain(summary.summaries.iter().map(|c| {
            csv_row(&[
                c.kind.to_string(),
                c.network.to_string(),
                c.mask.to_string(),
                c.wildcard.to_string(),
                c.total_hosts.to_string(),
                c.covered_hosts.to_string(),
                format!("{:.2}", c.efficiency),
                c.kind.description().to_string(),
            ])
        }))
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{allocate_vlsm, subnet_table, summarize_routes, SummaryOptions};

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_row() {
        assert_eq!(csv_row(&["a", "b,c", "d"]), "a,\"b,c\",d");
    }

    #[test]
    fn test_vlsm_csv() {
        let plan = allocate_vlsm("192.168.1.0", &[100, 50]).unwrap();
        let csv = vlsm_csv(&plan);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("index,hosts_needed,subnet"));
        assert_eq!(
            lines[1],
            "1,100,192.168.1.0/25,255.255.255.128,192.168.1.1,192.168.1.126,192.168.1.127,126,26"
        );
    }

    #[test]
    fn test_subnet_table_csv() {
        let table = subnet_table("10.0.0.0", "/30", 2).unwrap();
        let csv = subnet_table_csv(&table);
        assert_eq!(
            csv.lines().nth(2),
            Some("10.0.0.4/30,10.0.0.4,10.0.0.5,10.0.0.6,10.0.0.7,2")
        );
    }

    #[test]
    fn test_summary_csv() {
        let summary =
            summarize_routes(&["192.168.0.0/24", "192.168.1.0/24"], &SummaryOptions::default())
                .unwrap();
        let csv = summary_csv(&summary);
        let first = csv.lines().nth(1).unwrap();
        assert!(first.starts_with("minimal,192.168.0.0/23,255.255.254.0,0.0.1.255,512,512,100.00,"));
    }
}
