//! Common utility functions used across modules.
//!
//! - [`format_count_with_separator`] - Format counts with thousands separator (1,234,567)
//! - [`format_bytes`] - Format byte sizes (KB, MB, GB)
//! - [`truncate`] - Truncate strings with ellipsis

/// Format a number with thousands separators (commas).
///
/// Takes `u128` so address-space totals (which can exceed `u64` for IPv6
/// /64 counts) format the same way as plain counts.
///
/// # Examples
/// ```
/// use ipharvest::utils::format_count_with_separator;
/// assert_eq!(format_count_with_separator(1000), "1,000");
/// assert_eq!(format_count_with_separator(1234567), "1,234,567");
/// ```
pub fn format_count_with_separator(n: u128) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format bytes in human-readable form (KB, MB, GB).
///
/// # Examples
/// ```
/// use ipharvest::utils::format_bytes;
/// assert_eq!(format_bytes(1024), "1.0 KB");
/// assert_eq!(format_bytes(1_500_000), "1.4 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Truncate a string to at most `max_len` characters, adding "..." if
/// truncated.
///
/// # Examples
/// ```
/// use ipharvest::utils::truncate;
/// assert_eq!(truncate("short", 10), "short");
/// assert_eq!(truncate("this is long", 10), "this is...");
/// ```
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
