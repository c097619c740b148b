//! Sorted, partitioned output files.
//!
//! A literal set is written as up to six flat files under a base name:
//!
//! ```text
//! {base}_single_all.txt   {base}_ranges_all.txt
//! {base}_single_ipv4.txt  {base}_ranges_ipv4.txt
//! {base}_single_ipv6.txt  {base}_ranges_ipv6.txt
//! ```
//!
//! Empty lists produce no file. Each file holds one entry per line, IPv4
//! before IPv6, both in numeric order.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::fs_abstraction::FileSystem;
use crate::literal::{classify, AddressLiteral, Family};

/// Base name of the unscoped files at a source's root.
pub const GLOBAL_BASE: &str = "ips";

/// Sort raw entries numerically: IPv4 first, then IPv6, each by network
/// address then prefix length. If any entry does not parse, the whole list
/// falls back to plain lexicographic order.
pub fn sort_entries(entries: &mut [String]) {
    let keys: Option<Vec<_>> = entries
        .iter()
        .map(|raw| classify(raw).map(|lit| lit.sort_key()))
        .collect();

    match keys {
        Some(keys) => {
            let mut keyed: Vec<_> = keys.into_iter().zip(entries.iter().cloned()).collect();
            // Text breaks ties such as `10.0.0.1` vs `10.0.0.1/32`
            keyed.sort();
            for (slot, (_, raw)) in entries.iter_mut().zip(keyed) {
                *slot = raw;
            }
        }
        None => entries.sort(),
    }
}

/// Render a list as file content: one entry per line, trailing newline.
fn render(entries: &[String]) -> String {
    let mut out = String::with_capacity(entries.iter().map(|e| e.len() + 1).sum());
    for entry in entries {
        out.push_str(entry);
        out.push('\n');
    }
    out
}

/// Writes literal sets into the six-file layout.
pub struct PartitionWriter<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> PartitionWriter<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Write `literals` under `dir/{base}_*`. Returns how many files were
    /// written.
    pub fn write<'l, I>(&self, dir: &Path, base: &str, literals: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'l AddressLiteral>,
    {
        let mut lists: [[Vec<String>; 2]; 2] = Default::default();
        for literal in literals {
            let family = match literal.family() {
                Family::V4 => 0,
                Family::V6 => 1,
            };
            let kind = usize::from(!literal.is_single());
            lists[family][kind].push(literal.raw().to_string());
        }
        if lists.iter().flatten().all(Vec::is_empty) {
            return Ok(0);
        }

        self.fs
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;

        let mut written = 0;
        for (kind_index, kind) in ["single", "ranges"].into_iter().enumerate() {
            let mut ipv4 = std::mem::take(&mut lists[0][kind_index]);
            let mut ipv6 = std::mem::take(&mut lists[1][kind_index]);
            sort_entries(&mut ipv4);
            sort_entries(&mut ipv6);

            let combined: Vec<String> = ipv4.iter().chain(ipv6.iter()).cloned().collect();
            for (scope, entries) in [
                ("all", &combined),
                (Family::V4.label(), &ipv4),
                (Family::V6.label(), &ipv6),
            ] {
                if entries.is_empty() {
                    continue;
                }
                let path = dir.join(format!("{}_{}_{}.txt", base, kind, scope));
                self.fs
                    .write(&path, render(entries).as_bytes())
                    .with_context(|| format!("Failed to write {:?}", path))?;
                debug!("Wrote {} entries to {:?}", entries.len(), path);
                written += 1;
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::deduplicate;
    use crate::fs_abstraction::{real_fs, MockFileSystem};
    use std::io;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sort_numeric_not_lexicographic() {
        let mut entries = strings(&["10.0.0.0/8", "9.0.0.0/8", "100.0.0.0/8", "2.2.2.2"]);
        sort_entries(&mut entries);
        assert_eq!(entries, strings(&["2.2.2.2", "9.0.0.0/8", "10.0.0.0/8", "100.0.0.0/8"]));
    }

    #[test]
    fn test_sort_ipv4_before_ipv6() {
        let mut entries = strings(&["::1", "255.255.255.255", "2001:db8::/32", "1.1.1.1"]);
        sort_entries(&mut entries);
        assert_eq!(entries, strings(&["1.1.1.1", "255.255.255.255", "::1", "2001:db8::/32"]));
    }

    #[test]
    fn test_sort_same_network_by_prefix() {
        let mut entries = strings(&["10.0.0.0/24", "10.0.0.0/8", "10.0.0.0/16"]);
        sort_entries(&mut entries);
        assert_eq!(entries, strings(&["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/24"]));
    }

    #[test]
    fn test_sort_fallback_lexicographic() {
        let mut entries = strings(&["10.0.0.0/8", "junk", "9.0.0.0/8"]);
        sort_entries(&mut entries);
        assert_eq!(entries, strings(&["10.0.0.0/8", "9.0.0.0/8", "junk"]));
    }

    #[test]
    fn test_write_six_files() {
        let temp_dir = TempDir::new().unwrap();
        let dedup = deduplicate([
            "192.0.2.0/24",
            "192.0.2.5",
            "2001:db8::/32",
            "2001:db8::1",
        ]);
        let writer = PartitionWriter::new(real_fs());
        let written = writer.write(temp_dir.path(), "ips", &dedup.literals).unwrap();
        assert_eq!(written, 6);

        let read = |name: &str| std::fs::read_to_string(temp_dir.path().join(name)).unwrap();
        assert_eq!(read("ips_single_all.txt"), "192.0.2.5\n2001:db8::1\n");
        assert_eq!(read("ips_ranges_all.txt"), "192.0.2.0/24\n2001:db8::/32\n");
        assert_eq!(read("ips_single_ipv4.txt"), "192.0.2.5\n");
        assert_eq!(read("ips_ranges_ipv4.txt"), "192.0.2.0/24\n");
        assert_eq!(read("ips_single_ipv6.txt"), "2001:db8::1\n");
        assert_eq!(read("ips_ranges_ipv6.txt"), "2001:db8::/32\n");
    }

    #[test]
    fn test_write_skips_empty_lists() {
        let temp_dir = TempDir::new().unwrap();
        let dedup = deduplicate(["10.0.0.0/8", "11.0.0.0/8"]);
        let written = PartitionWriter::new(real_fs())
            .write(temp_dir.path(), "compute", &dedup.literals)
            .unwrap();
        assert_eq!(written, 2);
        assert!(temp_dir.path().join("compute_ranges_all.txt").exists());
        assert!(temp_dir.path().join("compute_ranges_ipv4.txt").exists());
        assert!(!temp_dir.path().join("compute_single_all.txt").exists());
        assert!(!temp_dir.path().join("compute_ranges_ipv6.txt").exists());
    }

    #[test]
    fn test_write_nothing_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("empty");
        let written = PartitionWriter::new(real_fs())
            .write(&target, "ips", std::iter::empty())
            .unwrap();
        assert_eq!(written, 0);
        assert!(!target.exists());
    }

    #[test]
    fn test_write_error_propagates() {
        let mut mock = MockFileSystem::new();
        mock.expect_create_dir_all().returning(|_| Ok(()));
        mock.expect_write()
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::Other, "disk full")));

        let dedup = deduplicate(["10.0.0.1"]);
        let err = PartitionWriter::new(&mock)
            .write(Path::new("/out"), "ips", &dedup.literals)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("disk full"));
    }

    #[test]
    fn test_write_paths_and_content() {
        let mut mock = MockFileSystem::new();
        mock.expect_create_dir_all()
            .withf(|p| p == Path::new("/out/services"))
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_write()
            .withf(|p, contents| {
                p.starts_with("/out/services") && contents.ends_with(b"\n") && !contents.ends_with(b"\n\n")
            })
            .times(2)
            .returning(|_, _| Ok(()));

        let dedup = deduplicate(["10.0.0.2", "10.0.0.1"]);
        let written = PartitionWriter::new(&mock)
            .write(Path::new("/out/services"), "s3", &dedup.literals)
            .unwrap();
        assert_eq!(written, 2);
    }
}
