//! Source adapters.
//!
//! A source turns some remote document into a [`Collection`] of raw address
//! strings, optionally tagged with scope keys. Everything after that (the
//! engine pass in [`crate::pipeline`]) is shared.
//!
//! Sources are looked up by kind in a [`Registry`] when the run starts. Most
//! built-in kinds are an [`HttpSource`] paired with a payload [`Format`].

pub mod extract;
pub mod providers;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub use crate::collection::{Collection, Entry};
pub use extract::GeofeedStyle;

use crate::cancel::JobToken;
use crate::config::SourceConfig;
use crate::error::HarvestError;
use crate::fetcher::Fetcher;
use crate::fs_abstraction::real_fs;
use crate::pipeline::{self, ProcessReport};

/// What a running job gets to work with.
#[derive(Clone)]
pub struct JobContext {
    pub fetcher: Arc<Fetcher>,
    /// Directory this job owns; nothing else writes here.
    pub output_root: PathBuf,
    pub token: JobToken,
}

/// One source's end-to-end unit of work.
#[async_trait]
pub trait SourceJob: Send + Sync {
    /// Human-readable name used as the report title.
    fn display_name(&self) -> &str;

    /// Obtain the raw candidates.
    async fn acquire(&self, ctx: &JobContext) -> Result<Collection>;

    /// Acquire, then run the engine on a blocking thread.
    async fn acquire_and_process(&self, ctx: &JobContext) -> Result<ProcessReport> {
        let collection = self.acquire(ctx).await?;
        ctx.token.check()?;

        let name = self.display_name().to_string();
        let root = ctx.output_root.clone();
        tokio::task::spawn_blocking(move || {
            pipeline::process(&name, &collection, &root, real_fs(), None)
        })
        .await
        .context("Pipeline task did not complete")?
    }
}

/// Parses one response body. Receives the URL it came from.
pub type DocumentParser = fn(url: &str, body: &str) -> Result<Collection>;

/// How an [`HttpSource`] reads its responses.
#[derive(Clone, Copy)]
pub enum Format {
    /// One entry per line, or comma-separated fields; `#` comments.
    Plain,
    /// Any JSON document; every string leaf that is an address counts.
    JsonWalk,
    /// RFC 8805 geofeed CSV, regions from city and country.
    Geofeed(GeofeedStyle),
    /// Provider-specific structured document.
    Document(DocumentParser),
}

impl Format {
    pub fn parse(&self, url: &str, body: &str) -> Result<Collection> {
        match self {
            Format::Plain => Ok(extract::parse_plain_list(body)),
            Format::JsonWalk => {
                let value: serde_json::Value = serde_json::from_str(body)
                    .map_err(|e| HarvestError::Parse(format!("Invalid JSON: {}", e)))?;
                Ok(extract::walk_json(&value))
            }
            Format::Geofeed(style) => Ok(extract::parse_geofeed(body, *style)),
            Format::Document(parser) => parser(url, body),
        }
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Plain => f.write_str("Plain"),
            Format::JsonWalk => f.write_str("JsonWalk"),
            Format::Geofeed(style) => f.debug_tuple("Geofeed").field(style).finish(),
            Format::Document(_) => f.write_str("Document"),
        }
    }
}

/// A source that downloads one or more URLs and parses each the same way.
#[derive(Debug)]
pub struct HttpSource {
    name: String,
    urls: Vec<String>,
    format: Format,
    exclude_private: bool,
    tolerate_partial: bool,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, urls: Vec<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            urls,
            format,
            exclude_private: false,
            tolerate_partial: false,
        }
    }

    /// Drop RFC 1918 / RFC 4193 candidates before they reach the engine.
    pub fn exclude_private(mut self, exclude: bool) -> Self {
        self.exclude_private = exclude;
        self
    }

    /// Keep going when some URLs fail; the job fails only if all of them do.
    pub fn tolerate_partial(mut self, tolerate: bool) -> Self {
        self.tolerate_partial = tolerate;
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

impl HttpSource {
    async fn fetch_one(&self, url: &str, ctx: &JobContext) -> Result<Collection> {
        let body = ctx
            .fetcher
            .fetch_text(url, &ctx.token)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        self.format
            .parse(url, &body)
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<HarvestError>(), Some(HarvestError::Cancelled))
}

#[async_trait]
impl SourceJob for HttpSource {
    fn display_name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self, ctx: &JobContext) -> Result<Collection> {
        let mut collection = Collection::new();
        let mut failures = 0;
        let mut last_error = None;
        for url in &self.urls {
            ctx.token.check()?;
            match self.fetch_one(url, ctx).await {
                Ok(part) => {
                    debug!("{}: {} candidates from {}", self.name, part.len(), url);
                    collection.extend(part);
                }
                Err(e) if !self.tolerate_partial || is_cancelled(&e) => return Err(e),
                Err(e) => {
                    warn!("{}: skipping {}: {:#}", self.name, url, e);
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }
        if failures == self.urls.len() {
            if let Some(e) = last_error {
                return Err(e.context(format!("All {} URL(s) failed", failures)));
            }
        }

        if self.exclude_private {
            let removed = collection.retain_public();
            debug!("{}: excluded {} private candidates", self.name, removed);
        }
        Ok(collection)
    }
}

/// Builds a job for source `id` from its configuration.
pub type SourceFactory = Arc<dyn Fn(&str, &SourceConfig) -> Arc<dyn SourceJob> + Send + Sync>;

/// Kind name to factory, resolved once at startup.
#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<String, SourceFactory>,
}

/// Kinds that work for any identifier.
pub const GENERIC_KINDS: [(&str, Format); 3] = [
    ("plain", Format::Plain),
    ("json", Format::JsonWalk),
    ("geofeed", Format::Geofeed(GeofeedStyle::CityRegions)),
];

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in provider plus the generic kinds.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for builtin in providers::BUILTIN_SOURCES {
            registry.register(
                builtin.id,
                http_factory(Some(builtin.display_name), builtin.format, builtin.tolerate_partial),
            );
        }
        for (kind, format) in GENERIC_KINDS {
            registry.register(kind, http_factory(None, format, false));
        }
        registry
    }

    /// Add or replace a kind.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&str, &SourceConfig) -> Arc<dyn SourceJob> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the job for source `id`. Its kind defaults to the identifier.
    pub fn resolve(&self, id: &str, config: &SourceConfig) -> Result<Arc<dyn SourceJob>, HarvestError> {
        let kind = config.kind_for(id);
        let factory = self.factories.get(kind).ok_or_else(|| HarvestError::UnknownKind {
            kind: kind.to_string(),
            source_id: id.to_string(),
        })?;
        Ok(factory(id, config))
    }
}

fn http_factory(
    default_name: Option<&'static str>,
    format: Format,
    tolerate_partial: bool,
) -> impl Fn(&str, &SourceConfig) -> Arc<dyn SourceJob> + Send + Sync + 'static {
    move |id: &str, config: &SourceConfig| -> Arc<dyn SourceJob> {
        let name = config
            .display_name
            .clone()
            .or_else(|| default_name.map(str::to_string))
            .unwrap_or_else(|| id.to_string());
        Arc::new(
            HttpSource::new(name, config.all_urls(), format)
                .exclude_private(config.exclude_private)
                .tolerate_partial(tolerate_partial),
        )
    }
}
