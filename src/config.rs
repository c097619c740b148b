//! Configuration management for ipharvest.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::HarvestError;
use crate::sources::providers::BUILTIN_SOURCES;
use crate::sources::Registry;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-source output roots are created under this directory
    pub output_dir: PathBuf,

    /// Concurrent jobs; 0 means available hardware concurrency
    pub workers: usize,

    /// Seconds between progress lines
    pub progress_interval_secs: u64,

    /// How long to wait for the progress monitor to stop
    pub monitor_stop_timeout_ms: u64,

    /// HTTP client settings shared by all sources
    pub http: HttpConfig,

    /// Sources by identifier
    pub sources: BTreeMap<String, SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("cloud_ips"),
            workers: 0,
            progress_interval_secs: 3,
            monitor_stop_timeout_ms: 1000,
            http: HttpConfig::default(),
            sources: default_sources(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate(&Registry::builtin())?;

        Ok(config)
    }

    /// Validate configuration values against the kinds `registry` knows.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        if self.progress_interval_secs == 0 {
            return Err(HarvestError::Config("progress_interval_secs must be greater than 0".into()).into());
        }
        if self.http.timeout_secs == 0 {
            return Err(HarvestError::Config("http.timeout_secs must be greater than 0".into()).into());
        }

        for (id, source) in &self.sources {
            let kind = source.kind_for(id);
            if !registry.contains(kind) {
                return Err(HarvestError::UnknownKind {
                    kind: kind.to_string(),
                    source_id: id.clone(),
                }
                .into());
            }

            let urls = source.all_urls();
            if source.enabled && urls.is_empty() {
                return Err(HarvestError::Config(format!("Source '{}' has no URL", id)).into());
            }
            // Disabled sources may still be run by name, so check them too
            for url in &urls {
                if !url.starts_with("https://") {
                    return Err(HarvestError::Config(format!(
                        "Source '{}' URL must use HTTPS: {}",
                        id, url
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Resolve which sources to run.
    ///
    /// With no names, every enabled source runs. Names are matched against
    /// identifiers ignoring case, `-` and `_`; a named source runs even when
    /// disabled. Unknown names are an error, repeated names run once.
    pub fn select_sources(&self, requested: &[String]) -> Result<Vec<(&str, &SourceConfig)>, HarvestError> {
        if requested.is_empty() || requested.iter().any(|r| r.eq_ignore_ascii_case("all")) {
            return Ok(self
                .sources
                .iter()
                .filter(|(_, source)| source.enabled)
                .map(|(id, source)| (id.as_str(), source))
                .collect());
        }

        let mut selected: Vec<(&str, &SourceConfig)> = Vec::new();
        for name in requested {
            let wanted = normalize_id(name);
            let (id, source) = self
                .sources
                .iter()
                .find(|(id, _)| normalize_id(id) == wanted)
                .ok_or_else(|| HarvestError::UnknownSource(name.clone()))?;
            if !selected.iter().any(|(existing, _)| *existing == id.as_str()) {
                selected.push((id.as_str(), source));
            }
        }
        Ok(selected)
    }

    /// Commented default configuration
    pub fn generate_default_yaml() -> String {
        include_str!("../templates/config.yaml").to_string()
    }
}

/// Write `content` to `path` through a temporary file in the same directory.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp_file =
        NamedTempFile::new_in(parent_dir).context("Failed to create temporary file for config")?;

    temp_file.write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist config file: {:?}", path))?;

    Ok(())
}

/// Lowercase and drop `-` / `_`, so `ibm-cloud`, `IBM_Cloud` and `ibmcloud`
/// all name the same source.
pub fn normalize_id(id: &str) -> String {
    id.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_response_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 3,
            retry_delay_ms: 2000,
            max_response_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Adapter kind; defaults to the source identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Report title; defaults to the adapter's name or the identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Drop RFC 1918 / RFC 4193 candidates
    #[serde(default)]
    pub exclude_private: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: None,
            display_name: None,
            url: None,
            urls: Vec::new(),
            enabled: true,
            exclude_private: false,
        }
    }
}

impl SourceConfig {
    /// `url` followed by `urls`.
    pub fn all_urls(&self) -> Vec<String> {
        self.url.iter().chain(self.urls.iter()).cloned().collect()
    }

    pub fn kind_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.kind.as_deref().unwrap_or(id)
    }
}

fn default_true() -> bool {
    true
}

fn default_sources() -> BTreeMap<String, SourceConfig> {
    BUILTIN_SOURCES
        .iter()
        .map(|builtin| {
            let source = SourceConfig {
                urls: builtin.default_urls.iter().map(|u| u.to_string()).collect(),
                ..SourceConfig::default()
            };
            (builtin.id.to_string(), source)
        })
        .collect()
}
