//! One source's engine pass.
//!
//! ```text
//! Collection ─▶ deduplicate ─▶ partition ─▶ statistics ─▶ write files ─▶ index.md
//! ```
//!
//! Everything here is synchronous and single-threaded. The orchestrator runs
//! it on a blocking thread per job, so no state is shared across jobs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use crate::aggregator::{deduplicate, split_by_family};
use crate::collection::Collection;
use crate::fs_abstraction::FileSystem;
use crate::literal::AddressLiteral;
use crate::report::{self, ReportInput, REPORT_FILE};
use crate::scope::{sanitize_key, Dimension, Partition};
use crate::stats::AggregateStatistics;
use crate::writer::{PartitionWriter, GLOBAL_BASE};

/// Bucket file base used when a key sanitizes to nothing.
const UNNAMED_BUCKET: &str = "unnamed";

/// What one pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub stats: AggregateStatistics,
    /// Files written, `index.md` included.
    pub files_written: usize,
    /// Per dimension, literal count under each (unsanitized) key.
    pub buckets: BTreeMap<Dimension, BTreeMap<String, usize>>,
}

/// Run the full engine over `collection` and write its output under `root`.
///
/// `generated_at` pins the report timestamp; `None` uses the current time.
pub fn process(
    name: &str,
    collection: &Collection,
    root: &Path,
    fs: &dyn FileSystem,
    generated_at: Option<DateTime<Utc>>,
) -> Result<ProcessReport> {
    let dedup = deduplicate(collection.raw_values());
    debug!(
        "{}: {} candidates, {} unique, {} duplicates, {} dropped",
        name,
        collection.len(),
        dedup.literals.len(),
        dedup.duplicates,
        dedup.invalid
    );

    let partition = Partition::from_tagged(collection.tagged());
    let (ipv4, ipv6) = split_by_family(&dedup.literals);
    let stats = AggregateStatistics::compute(&ipv4, &ipv6);

    fs.create_dir_all(root)
        .with_context(|| format!("Failed to create output root {:?}", root))?;

    let writer = PartitionWriter::new(fs);
    let mut files_written = writer.write(root, GLOBAL_BASE, &dedup.literals)?;

    for (dimension, bucket) in partition.dimensions() {
        let dir = root.join(dimension.dir_name());
        debug!("{}: writing {} {} buckets", name, bucket.len(), dimension);
        for (file_base, literals) in merge_by_file_name(bucket) {
            files_written += writer
                .write(&dir, &file_base, literals)
                .with_context(|| format!("Failed to write {} bucket '{}'", dimension, file_base))?;
        }
    }

    let buckets = partition.counts();
    let document = report::render(&ReportInput {
        name,
        stats: &stats,
        dimensions: &buckets,
        generated_at,
    });
    let report_path = root.join(REPORT_FILE);
    fs.write(&report_path, document.as_bytes())
        .with_context(|| format!("Failed to write {:?}", report_path))?;
    files_written += 1;

    debug!("{}: wrote {} files under {:?}", name, files_written, root);
    Ok(ProcessReport {
        stats,
        files_written,
        buckets,
    })
}

/// Group bucket keys by their sanitized file name. Keys that collide after
/// sanitizing share one file set holding the union of their literals.
fn merge_by_file_name(
    bucket: &BTreeMap<String, BTreeSet<AddressLiteral>>,
) -> BTreeMap<String, BTreeSet<&AddressLiteral>> {
    let mut merged: BTreeMap<String, BTreeSet<&AddressLiteral>> = BTreeMap::new();
    for (key, literals) in bucket {
        let mut file_base = sanitize_key(key);
        if file_base.is_empty() {
            file_base = UNNAMED_BUCKET.to_string();
        }
        merged.entry(file_base).or_default().extend(literals.iter());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_abstraction::{real_fs, MockFileSystem};
    use std::io;
    use tempfile::TempDir;

    #[test]
    fn test_untagged_collection_writes_global_files_and_report() {
        let temp_dir = TempDir::new().unwrap();
        let collection: Collection = ["192.0.2.0/24", "192.0.2.5"].into_iter().collect();

        let report = process("Test", &collection, temp_dir.path(), real_fs(), None).unwrap();

        assert_eq!(report.stats.total, 2);
        // single_all, single_ipv4, ranges_all, ranges_ipv4, index.md
        assert_eq!(report.files_written, 5);
        assert!(report.buckets.is_empty());
        assert!(temp_dir.path().join("index.md").exists());
        assert!(!temp_dir.path().join("services").exists());
    }

    #[test]
    fn test_colliding_keys_share_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut collection = Collection::new();
        collection.push_scoped("10.0.0.1", Dimension::Region, "EU West");
        collection.push_scoped("10.0.0.2", Dimension::Region, "eu.west");

        let report = process("Test", &collection, temp_dir.path(), real_fs(), None).unwrap();

        let content =
            std::fs::read_to_string(temp_dir.path().join("regions/eu_west_single_all.txt")).unwrap();
        assert_eq!(content, "10.0.0.1\n10.0.0.2\n");
        // The report still lists both unsanitized keys
        assert_eq!(report.buckets[&Dimension::Region].len(), 2);
    }

    #[test]
    fn test_unnamed_bucket() {
        let temp_dir = TempDir::new().unwrap();
        let mut collection = Collection::new();
        collection.push_scoped("10.0.0.1", Dimension::Service, "???");

        process("Test", &collection, temp_dir.path(), real_fs(), None).unwrap();

        assert!(temp_dir
            .path()
            .join("services/unnamed_single_ipv4.txt")
            .exists());
    }

    #[test]
    fn test_empty_collection_still_reports() {
        let temp_dir = TempDir::new().unwrap();
        let report = process("Nothing", &Collection::new(), temp_dir.path(), real_fs(), None).unwrap();
        assert_eq!(report.files_written, 1);
        let index = std::fs::read_to_string(temp_dir.path().join("index.md")).unwrap();
        assert!(index.starts_with("# Nothing IP Ranges\n"));
    }

    #[test]
    fn test_write_failure_is_an_error() {
        let mut mock = MockFileSystem::new();
        mock.expect_create_dir_all().returning(|_| Ok(()));
        mock.expect_write()
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only")));

        let collection: Collection = ["10.0.0.1"].into_iter().collect();
        let err = process("Test", &collection, Path::new("/out/test"), &mock, None).unwrap_err();
        assert!(format!("{:#}", err).contains("read-only"));
    }

    #[test]
    fn test_merge_by_file_name() {
        let mut partition = Partition::new();
        let a = crate::literal::classify("10.0.0.1").unwrap();
        let b = crate::literal::classify("10.0.0.2").unwrap();
        partition.insert(Dimension::Service, "S3", a.clone());
        partition.insert(Dimension::Service, "s3", b);
        partition.insert(Dimension::Service, "EC2", a);

        let merged = merge_by_file_name(partition.bucket(Dimension::Service).unwrap());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["s3"].len(), 2);
        assert_eq!(merged["ec2"].len(), 1);
    }
}
