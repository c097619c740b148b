//! Format-level extractors shared by several sources.

use serde_json::Value;

use crate::collection::Collection;
use crate::literal::classify;
use crate::scope::Dimension;

/// Deepest JSON nesting the walker descends into.
pub const MAX_JSON_DEPTH: usize = 64;

/// Plain text lists: one entry per line, or CSV rows where any field may be
/// an address. Blank lines and `#` comments are skipped.
pub fn parse_plain_list(body: &str) -> Collection {
    let mut collection = Collection::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for field in line.split(',') {
            let field = field.trim();
            if classify(field).is_some() {
                collection.push(field);
            }
        }
    }
    collection
}

/// Collect every string leaf of a JSON document that is an address literal.
///
/// Objects and arrays nested deeper than [`MAX_JSON_DEPTH`] are not visited.
pub fn walk_json(value: &Value) -> Collection {
    let mut collection = Collection::new();
    walk(value, 0, &mut collection);
    collection
}

fn walk(value: &Value, depth: usize, out: &mut Collection) {
    match value {
        Value::String(s) => {
            if classify(s).is_some() {
                out.push(s.trim());
            }
        }
        Value::Array(items) if depth < MAX_JSON_DEPTH => {
            for item in items {
                walk(item, depth + 1, out);
            }
        }
        Value::Object(map) if depth < MAX_JSON_DEPTH => {
            for item in map.values() {
                walk(item, depth + 1, out);
            }
        }
        _ => {}
    }
}

/// How a geofeed row becomes a region key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofeedStyle {
    /// Rows need at least four columns. Keyed on the city: `"City, CC"`, or
    /// the city alone without a country. Rows without a city stay untagged.
    CityRegions,
    /// Any row with a valid prefix counts. Keyed on the country: `"City, CC"`
    /// with a city, else `"CC"`. Rows without a country stay untagged.
    CountryRegions,
}

/// Geofeed CSV (`prefix,country,region,city,postal`).
pub fn parse_geofeed(body: &str, style: GeofeedStyle) -> Collection {
    let mut collection = Collection::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if style == GeofeedStyle::CityRegions && fields.len() < 4 {
            continue;
        }
        let prefix = fields[0];
        if classify(prefix).is_none() {
            continue;
        }
        let country = fields.get(1).copied().unwrap_or("");
        let city = fields.get(3).copied().unwrap_or("");

        let region = match style {
            GeofeedStyle::CityRegions => match (city.is_empty(), country.is_empty()) {
                (true, _) => None,
                (false, true) => Some(city.to_string()),
                (false, false) => Some(format!("{}, {}", city, country)),
            },
            GeofeedStyle::CountryRegions => match (country.is_empty(), city.is_empty()) {
                (true, _) => None,
                (false, true) => Some(country.to_string()),
                (false, false) => Some(format!("{}, {}", city, country)),
            },
        };
        match region {
            Some(region) => collection.push_scoped(prefix, Dimension::Region, region),
            None => collection.push(prefix),
        }
    }
    collection
}
