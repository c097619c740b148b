//! Sources command implementation.
//!
//! Lists configured sources and the adapter kinds the registry knows.

use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

use crate::config::Config;
use crate::sources::Registry;
use crate::utils::truncate;

const URL_WIDTH: usize = 60;

pub fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    print!("{}", render(&config, &Registry::builtin()));
    Ok(())
}

pub fn render(config: &Config, registry: &Registry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Configured sources ({}):", config.sources.len());
    let _ = writeln!(out, "  {:<16} {:<14} {:<8} URL", "ID", "KIND", "ENABLED");
    for (id, source) in &config.sources {
        let urls = source.all_urls();
        let url = match urls.as_slice() {
            [] => "-".to_string(),
            [only] => truncate(only, URL_WIDTH),
            [first, rest @ ..] => format!("{} (+{})", truncate(first, URL_WIDTH), rest.len()),
        };
        let enabled = if source.enabled { "yes" } else { "no" };
        let _ = writeln!(
            out,
            "  {:<16} {:<14} {:<8} {}",
            id,
            source.kind_for(id),
            enabled,
            url
        );
    }

    let kinds: Vec<&str> = registry.kinds().collect();
    let _ = writeln!(out);
    let _ = writeln!(out, "Available kinds: {}", kinds.join(", "));
    out
}
