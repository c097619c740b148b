//! # ipharvest - Cloud Provider IP Range Collector
//!
//! Fetches the address lists that cloud and CDN providers publish, then
//! classifies, deduplicates and partitions them into plain text files that are
//! easy to feed into firewalls and allowlists.
//!
//! ## Features
//!
//! - **Concurrent** - One job per source on a bounded worker pool
//! - **Isolated** - A failing source never affects the others
//! - **Partitioned** - Output split by family, single vs range, and by scope
//!   (service, region, cluster, country)
//! - **Deterministic** - Identical input produces byte-identical output
//! - **Extensible** - Generic plain, JSON and geofeed adapters for any URL
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ipharvest                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: run, sources, init, version                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── Per-source URLs, workers, HTTP settings              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Orchestrator (tokio + futures)                             │
//! │    ├── Bounded worker pool, per-job failure isolation       │
//! │    ├── ProgressMonitor                                      │
//! │    └── ExecutionSummary                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Sources (SourceJob trait, Registry)                        │
//! │    ├── Fetcher (reqwest + rustls)                           │
//! │    └── Providers: AWS, GCP, OCI, Cloudflare, geofeeds...    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pipeline (ipnet)                                           │
//! │    └── classify → dedup → partition → stats → write → index │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use ipharvest::collection::Collection;
//! use ipharvest::fs_abstraction::real_fs;
//! use ipharvest::pipeline;
//! use ipharvest::scope::Dimension;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut collection = Collection::new();
//!     collection.push("192.0.2.5");
//!     collection.push_scoped("192.0.2.0/24", Dimension::Region, "us-east-1");
//!
//!     let report = pipeline::process("Example", &collection, Path::new("out/example"), real_fs(), None)?;
//!     println!("{} literals, {} files", report.stats.total, report.files_written);
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod cancel;
pub mod cli;
pub mod collection;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod fs_abstraction;
pub mod literal;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod scope;
pub mod sources;
pub mod stats;
pub mod summary;
pub mod utils;
pub mod writer;
