//! Per-source Markdown summary (`index.md`).
//!
//! Rendering is a pure function of its inputs: table rows come out of
//! `BTreeMap`s, so the same statistics and counts always produce the same
//! bytes. Only the timestamp varies, and callers that need byte-identical
//! output pass it explicitly.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::scope::Dimension;
use crate::stats::AggregateStatistics;
use crate::utils::format_count_with_separator;

/// File name of the report at a source's output root.
pub const REPORT_FILE: &str = "index.md";

/// Inputs for one report.
pub struct ReportInput<'a> {
    pub name: &'a str,
    pub stats: &'a AggregateStatistics,
    pub dimensions: &'a BTreeMap<Dimension, BTreeMap<String, usize>>,
    pub generated_at: Option<DateTime<Utc>>,
}

/// Render the Markdown document.
pub fn render(input: &ReportInput<'_>) -> String {
    let generated_at = input.generated_at.unwrap_or_else(Utc::now);
    let stats = input.stats;
    let mut md = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(md, "# {} IP Ranges\n", input.name);
    let _ = writeln!(
        md,
        "Last updated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    md.push_str("## Summary Statistics\n\n");

    let _ = writeln!(md, "- **Total IPs/Ranges**: {}", sep(stats.total));
    if stats.ipv4.single > 0 {
        let _ = writeln!(md, "- **IPv4 single IPs**: {}", sep(stats.ipv4.single));
    }
    if stats.ipv4.ranges > 0 {
        let _ = writeln!(
            md,
            "- **IPv4 ranges**: {} ({} addresses)",
            sep(stats.ipv4.ranges),
            sep(stats.ipv4.address_space)
        );
    }
    if stats.ipv6.single > 0 {
        let _ = writeln!(md, "- **IPv6 single IPs**: {}", sep(stats.ipv6.single));
    }
    if stats.ipv6.ranges > 0 {
        let _ = writeln!(
            md,
            "- **IPv6 ranges**: {} ({} /64 subnets)",
            sep(stats.ipv6.ranges),
            sep(stats.ipv6.address_space)
        );
    }
    md.push('\n');

    for (dimension, counts) in input.dimensions {
        if counts.is_empty() {
            continue;
        }
        render_table(&mut md, *dimension, counts);
    }

    md
}

fn sep(n: impl TryInto<u128>) -> String {
    format_count_with_separator(n.try_into().unwrap_or(u128::MAX))
}

fn render_table(md: &mut String, dimension: Dimension, counts: &BTreeMap<String, usize>) {
    let column = dimension.column();
    let _ = writeln!(md, "## {} ({})\n", dimension.title(), counts.len());
    let _ = writeln!(md, "| {} | IP Ranges |", column);
    let _ = writeln!(md, "|{}|----------:|", "-".repeat(column.len() + 2));
    for (key, count) in counts {
        let _ = writeln!(md, "| {} | {} |", key, sep(*count));
    }
    md.push('\n');
}
