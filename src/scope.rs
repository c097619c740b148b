//! Grouping literals along independent scope dimensions.
//!
//! A source may tag each raw string with any number of `(dimension, key)`
//! pairs. Each dimension yields its own partition of the same address set,
//! so a literal tagged `service=compute` and `region=us-east` lands in one
//! bucket of each. Untagged literals are simply absent from that dimension.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::literal::{classify, AddressLiteral};

/// A grouping axis. Each maps to one output subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Service,
    Region,
    Cluster,
    Country,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Service,
        Dimension::Region,
        Dimension::Cluster,
        Dimension::Country,
    ];

    /// Subdirectory name under a source's output root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Dimension::Service => "services",
            Dimension::Region => "regions",
            Dimension::Cluster => "clusters",
            Dimension::Country => "countries",
        }
    }

    /// Section heading used in reports.
    pub fn title(self) -> &'static str {
        match self {
            Dimension::Service => "Services",
            Dimension::Region => "Regions",
            Dimension::Cluster => "Clusters",
            Dimension::Country => "Countries",
        }
    }

    /// Column heading used in report tables.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Service => "Service",
            Dimension::Region => "Region",
            Dimension::Cluster => "Cluster",
            Dimension::Country => "Country",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Service => "service",
            Dimension::Region => "region",
            Dimension::Cluster => "cluster",
            Dimension::Country => "country",
        })
    }
}

/// One `(dimension, key)` association carried by a raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeTag {
    pub dimension: Dimension,
    pub key: String,
}

impl ScopeTag {
    pub fn new(dimension: Dimension, key: impl Into<String>) -> Self {
        Self {
            dimension,
            key: key.into(),
        }
    }
}

/// Key -> literals for one dimension.
pub type Bucket = BTreeMap<String, BTreeSet<AddressLiteral>>;

/// All buckets of all dimensions a source used.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Partition {
    dimensions: BTreeMap<Dimension, Bucket>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(raw, tags)` pairs. Invalid raw strings and blank keys are
    /// skipped; input order has no effect on the result.
    pub fn from_tagged<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [ScopeTag])>,
    {
        let mut partition = Self::new();
        for (raw, tags) in entries {
            if tags.is_empty() {
                continue;
            }
            let Some(literal) = classify(raw) else {
                continue;
            };
            for tag in tags {
                partition.insert(tag.dimension, &tag.key, literal.clone());
            }
        }
        partition
    }

    /// Add one literal to `dimension`/`key`. Blank keys are ignored.
    pub fn insert(&mut self, dimension: Dimension, key: &str, literal: AddressLiteral) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        self.dimensions
            .entry(dimension)
            .or_default()
            .entry(key.to_string())
            .or_default()
            .insert(literal);
    }

    pub fn bucket(&self, dimension: Dimension) -> Option<&Bucket> {
        self.dimensions.get(&dimension)
    }

    /// Dimensions with at least one key, in a fixed order.
    pub fn dimensions(&self) -> impl Iterator<Item = (Dimension, &Bucket)> {
        self.dimensions.iter().map(|(dim, bucket)| (*dim, bucket))
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Per dimension, the number of literals under each key.
    pub fn counts(&self) -> BTreeMap<Dimension, BTreeMap<String, usize>> {
        self.dimensions
            .iter()
            .map(|(dim, bucket)| {
                let counts = bucket
                    .iter()
                    .map(|(key, literals)| (key.clone(), literals.len()))
                    .collect();
                (*dim, counts)
            })
            .collect()
    }
}

/// Turn a scope key into a filesystem-safe name.
///
/// Lowercases, replaces spaces and dots with `_`, then drops everything
/// that is not alphanumeric, `_` or `-`.
///
/// # Examples
/// ```
/// use ipharvest::scope::sanitize_key;
/// assert_eq!(sanitize_key("us-east-1"), "us-east-1");
/// assert_eq!(sanitize_key("Amsterdam, NL"), "amsterdam_nl");
/// assert_eq!(sanitize_key("AMAZON.S3"), "amazon_s3");
/// ```
pub fn sanitize_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '.' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
