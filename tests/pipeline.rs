//! End-to-end engine tests: collection in, files on disk out.

use chrono::{TimeZone, Utc};
use ipharvest::collection::Collection;
use ipharvest::fs_abstraction::real_fs;
use ipharvest::pipeline::process;
use ipharvest::scope::{Dimension, ScopeTag};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("{}: {}", rel, e))
}

fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().display().to_string();
                files.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    files
}

#[test]
fn test_mixed_families_without_dimensions() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let collection: Collection = ["192.0.2.0/24", "192.0.2.5", "2001:db8::/32"]
        .into_iter()
        .collect();

    let report = process("Example", &collection, root, real_fs(), None).unwrap();

    assert_eq!(read(root, "ips_ranges_ipv4.txt"), "192.0.2.0/24\n");
    assert_eq!(read(root, "ips_single_ipv4.txt"), "192.0.2.5\n");
    assert_eq!(read(root, "ips_ranges_ipv6.txt"), "2001:db8::/32\n");
    assert_eq!(read(root, "ips_ranges_all.txt"), "192.0.2.0/24\n2001:db8::/32\n");
    assert_eq!(read(root, "ips_single_all.txt"), "192.0.2.5\n");
    assert!(!root.join("ips_single_ipv6.txt").exists());

    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.ipv4.ranges, 1);
    assert_eq!(report.stats.ipv4.single, 1);
    assert_eq!(report.stats.ipv6.ranges, 1);
    assert!(read(root, "index.md").starts_with("# Example IP Ranges\n"));
}

#[test]
fn test_duplicates_written_once() {
    let temp_dir = TempDir::new().unwrap();
    let collection: Collection = ["10.0.0.1", "10.0.0.1", " 10.0.0.1 "].into_iter().collect();

    let report = process("Dup", &collection, temp_dir.path(), real_fs(), None).unwrap();

    assert_eq!(read(temp_dir.path(), "ips_single_ipv4.txt"), "10.0.0.1\n");
    assert_eq!(report.stats.total, 1);
}

#[test]
fn test_invalid_candidates_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let collection: Collection = ["not-an-ip", "10.0.0.1", "300.1.1.1", "10.0.0.0/33"]
        .into_iter()
        .collect();

    let report = process("Mixed", &collection, temp_dir.path(), real_fs(), None).unwrap();

    assert_eq!(report.stats.total, 1);
    assert_eq!(read(temp_dir.path(), "ips_single_all.txt"), "10.0.0.1\n");
    assert!(!temp_dir.path().join("ips_ranges_all.txt").exists());
}

#[test]
fn test_literal_lands_in_every_tagged_dimension() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let mut collection = Collection::new();
    collection.push_tagged(
        "192.0.2.0/24",
        [
            ScopeTag::new(Dimension::Service, "compute"),
            ScopeTag::new(Dimension::Region, "us-east"),
        ],
    );
    collection.push_scoped("198.51.100.7", Dimension::Region, "eu-west");

    let report = process("Tagged", &collection, root, real_fs(), None).unwrap();

    assert_eq!(read(root, "services/compute_ranges_ipv4.txt"), "192.0.2.0/24\n");
    assert_eq!(read(root, "regions/us-east_ranges_ipv4.txt"), "192.0.2.0/24\n");
    assert_eq!(read(root, "regions/eu-west_single_all.txt"), "198.51.100.7\n");
    assert!(!root.join("services/eu-west_single_all.txt").exists());

    assert_eq!(report.buckets[&Dimension::Service]["compute"], 1);
    assert_eq!(report.buckets[&Dimension::Region].len(), 2);

    let index = read(root, "index.md");
    assert!(index.contains("## Regions (2)"));
    assert!(index.contains("## Services (1)"));
}

#[test]
fn test_buckets_are_subsets_of_global_set() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let mut collection = Collection::new();
    collection.push_scoped("10.0.0.0/8", Dimension::Service, "a");
    collection.push_scoped("10.0.0.0/8", Dimension::Service, "b");
    collection.push_scoped("bogus", Dimension::Service, "a");
    collection.push("172.16.0.0/12");

    process("Subset", &collection, root, real_fs(), None).unwrap();

    let global = read(root, "ips_ranges_all.txt");
    for key in ["a", "b"] {
        let bucket = read(root, &format!("services/{}_ranges_all.txt", key));
        for line in bucket.lines() {
            assert!(global.lines().any(|g| g == line), "{} missing from global", line);
        }
    }
}

#[test]
fn test_long_ipv6_prefix_contributes_no_address_space() {
    let temp_dir = TempDir::new().unwrap();
    let collection: Collection = ["2001:db8::/65"].into_iter().collect();

    let report = process("Narrow", &collection, temp_dir.path(), real_fs(), None).unwrap();

    assert_eq!(report.stats.ipv6.ranges, 1);
    assert_eq!(report.stats.ipv6.address_space, 0);
}

#[test]
fn test_numeric_ordering_in_files() {
    let temp_dir = TempDir::new().unwrap();
    let collection: Collection = ["10.0.0.10", "10.0.0.9", "9.255.255.255", "::1", "10.0.0.100"]
        .into_iter()
        .collect();

    process("Order", &collection, temp_dir.path(), real_fs(), None).unwrap();

    assert_eq!(
        read(temp_dir.path(), "ips_single_all.txt"),
        "9.255.255.255\n10.0.0.9\n10.0.0.10\n10.0.0.100\n::1\n"
    );
}

#[test]
fn test_rerun_is_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let mut collection = Collection::new();
    collection.push_scoped("52.95.245.0/24", Dimension::Region, "us-east-1");
    collection.push_scoped("2600:1f18::/33", Dimension::Region, "us-east-1");
    collection.push_scoped("3.5.140.0/22", Dimension::Service, "S3");
    collection.push("3.5.140.2");

    process("AWS", &collection, first.path(), real_fs(), Some(at)).unwrap();
    process("AWS", &collection, second.path(), real_fs(), Some(at)).unwrap();
    // Second pass over an existing tree replaces files in place
    process("AWS", &collection, second.path(), real_fs(), Some(at)).unwrap();

    let a = snapshot(first.path());
    assert!(!a.is_empty());
    assert_eq!(a, snapshot(second.path()));
    assert!(String::from_utf8_lossy(&a["index.md"]).contains("Last updated: 2024-05-01 12:00:00 UTC"));
}
