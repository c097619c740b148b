//! Built-in providers and their payload shapes.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{Format, GeofeedStyle};
use crate::collection::Collection;
use crate::scope::{Dimension, ScopeTag};

/// A provider known out of the box.
pub struct BuiltinSource {
    pub id: &'static str,
    pub display_name: &'static str,
    pub format: Format,
    pub default_urls: &'static [&'static str],
    /// Skip failing URLs as long as one succeeds.
    pub tolerate_partial: bool,
}

pub const BUILTIN_SOURCES: &[BuiltinSource] = &[
    BuiltinSource {
        id: "aws",
        display_name: "AWS",
        format: Format::Document(parse_aws),
        default_urls: &["https://ip-ranges.amazonaws.com/ip-ranges.json"],
        tolerate_partial: false,
    },
    BuiltinSource {
        id: "gcp",
        display_name: "GCP",
        format: Format::Document(parse_gcp),
        default_urls: &["https://www.gstatic.com/ipranges/cloud.json"],
        tolerate_partial: false,
    },
    BuiltinSource {
        id: "oci",
        display_name: "OCI",
        format: Format::Document(parse_oci),
        default_urls: &["https://docs.oracle.com/en-us/iaas/tools/public_ip_ranges.json"],
        tolerate_partial: false,
    },
    BuiltinSource {
        id: "cloudflare",
        display_name: "Cloudflare",
        format: Format::Plain,
        default_urls: &[
            "https://www.cloudflare.com/ips-v4",
            "https://www.cloudflare.com/ips-v6",
        ],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "fastly",
        display_name: "Fastly",
        format: Format::JsonWalk,
        default_urls: &["https://api.fastly.com/public-ip-list"],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "digitalocean",
        display_name: "DigitalOcean",
        format: Format::Geofeed(GeofeedStyle::CityRegions),
        default_urls: &["https://digitalocean.com/geo/google.csv"],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "starlink",
        display_name: "Starlink",
        format: Format::Plain,
        default_urls: &["https://geoip.starlinkisp.net/feed.csv"],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "vultr",
        display_name: "Vultr",
        format: Format::Document(parse_vultr),
        default_urls: &["https://geofeed.constant.com/?json"],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "zscaler",
        display_name: "Zscaler",
        format: Format::JsonWalk,
        default_urls: &[
            "https://config.zscaler.com/api/zscaler.net/cenr/json",
            "https://config.zscaler.com/api/zscaler.net/hubs/cidr/json/recommended",
        ],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "exoscale",
        display_name: "Exoscale",
        format: Format::Document(parse_exoscale),
        default_urls: &["https://exoscale-prefixes.sos-ch-dk-2.exo.io/exoscale_prefixes.json"],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "googlebot",
        display_name: "Googlebot",
        format: Format::Document(parse_prefix_list),
        default_urls: &["https://developers.google.com/static/search/apis/ipranges/googlebot.json"],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "meta",
        display_name: "Meta",
        format: Format::Geofeed(GeofeedStyle::CountryRegions),
        default_urls: &["https://www.facebook.com/peering/geofeed"],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "perplexity",
        display_name: "Perplexity",
        format: Format::Document(parse_perplexity),
        default_urls: &[
            "https://www.perplexity.com/perplexitybot.json",
            "https://www.perplexity.com/perplexity-user.json",
        ],
        tolerate_partial: true,
    },
    BuiltinSource {
        id: "ahrefs",
        display_name: "Ahrefs",
        format: Format::Document(parse_ahrefs),
        default_urls: &["https://api.ahrefs.com/v3/public/crawler-ips"],
        tolerate_partial: true,
    },
];

/// `Some(s)` for a non-blank string, else `fallback`.
fn or_fallback(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

// AWS ip-ranges.json

#[derive(Deserialize)]
struct AwsRanges {
    #[serde(default)]
    prefixes: Vec<AwsPrefix>,
    #[serde(default)]
    ipv6_prefixes: Vec<AwsIpv6Prefix>,
}

#[derive(Deserialize)]
struct AwsPrefix {
    ip_prefix: Option<String>,
    service: Option<String>,
    region: Option<String>,
}

#[derive(Deserialize)]
struct AwsIpv6Prefix {
    ipv6_prefix: Option<String>,
    service: Option<String>,
    region: Option<String>,
}

/// Tags service (default `UNKNOWN`) and region (default `GLOBAL`).
pub fn parse_aws(_url: &str, body: &str) -> Result<Collection> {
    let ranges: AwsRanges = serde_json::from_str(body).context("Invalid AWS ip-ranges document")?;

    let v4 = ranges
        .prefixes
        .into_iter()
        .map(|p| (p.ip_prefix, p.service, p.region));
    let v6 = ranges
        .ipv6_prefixes
        .into_iter()
        .map(|p| (p.ipv6_prefix, p.service, p.region));

    let mut collection = Collection::new();
    for (prefix, service, region) in v4.chain(v6) {
        let Some(prefix) = prefix else { continue };
        collection.push_tagged(
            prefix,
            [
                ScopeTag::new(Dimension::Service, or_fallback(service, "UNKNOWN")),
                ScopeTag::new(Dimension::Region, or_fallback(region, "GLOBAL")),
            ],
        );
    }
    Ok(collection)
}

// Google-style `{"prefixes": [{"ipv4Prefix"|"ipv6Prefix", ...}]}`

#[derive(Deserialize)]
struct GooglePrefixes {
    #[serde(default)]
    prefixes: Vec<GooglePrefix>,
}

#[derive(Deserialize)]
struct GooglePrefix {
    #[serde(rename = "ipv4Prefix")]
    ipv4_prefix: Option<String>,
    #[serde(rename = "ipv6Prefix")]
    ipv6_prefix: Option<String>,
    service: Option<String>,
    scope: Option<String>,
}

impl GooglePrefix {
    fn prefix(self) -> Option<(String, Option<String>, Option<String>)> {
        let prefix = self.ipv4_prefix.or(self.ipv6_prefix)?;
        Some((prefix, self.service, self.scope))
    }
}

fn google_prefixes(body: &str) -> Result<Vec<(String, Option<String>, Option<String>)>> {
    let doc: GooglePrefixes = serde_json::from_str(body).context("Invalid prefix list document")?;
    Ok(doc.prefixes.into_iter().filter_map(GooglePrefix::prefix).collect())
}

/// Tags service (default `UNKNOWN`) and region from `scope` (default `global`).
pub fn parse_gcp(_url: &str, body: &str) -> Result<Collection> {
    let mut collection = Collection::new();
    for (prefix, service, scope) in google_prefixes(body)? {
        collection.push_tagged(
            prefix,
            [
                ScopeTag::new(Dimension::Service, or_fallback(service, "UNKNOWN")),
                ScopeTag::new(Dimension::Region, or_fallback(scope, "global")),
            ],
        );
    }
    Ok(collection)
}

/// Untagged Google-style prefix list (Googlebot and similar crawlers).
pub fn parse_prefix_list(_url: &str, body: &str) -> Result<Collection> {
    Ok(google_prefixes(body)?
        .into_iter()
        .map(|(prefix, _, _)| prefix)
        .collect())
}

/// Google-style prefix list whose service comes from the URL it was served
/// at.
pub fn parse_perplexity(url: &str, body: &str) -> Result<Collection> {
    let service = if url.contains("perplexitybot") {
        "perplexitybot"
    } else if url.contains("perplexity-user") {
        "perplexity-user"
    } else {
        "unknown"
    };

    let mut collection = Collection::new();
    for (prefix, _, _) in google_prefixes(body)? {
        collection.push_scoped(prefix, Dimension::Service, service);
    }
    Ok(collection)
}

// Oracle Cloud public_ip_ranges.json

#[derive(Deserialize)]
struct OciRanges {
    #[serde(default)]
    regions: Vec<OciRegion>,
}

#[derive(Deserialize)]
struct OciRegion {
    region: Option<String>,
    #[serde(default)]
    cidrs: Vec<OciCidr>,
}

#[derive(Deserialize)]
struct OciCidr {
    cidr: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Region per block (default `UNKNOWN`); every tag is a service, untagged
/// CIDRs go to `UNTAGGED`.
pub fn parse_oci(_url: &str, body: &str) -> Result<Collection> {
    let ranges: OciRanges = serde_json::from_str(body).context("Invalid OCI ip ranges document")?;

    let mut collection = Collection::new();
    for region in ranges.regions {
        let region_name = or_fallback(region.region, "UNKNOWN");
        for entry in region.cidrs {
            let Some(cidr) = entry.cidr else { continue };
            let mut tags = vec![ScopeTag::new(Dimension::Region, region_name.clone())];
            if entry.tags.is_empty() {
                tags.push(ScopeTag::new(Dimension::Service, "UNTAGGED"));
            } else {
                tags.extend(
                    entry
                        .tags
                        .into_iter()
                        .map(|tag| ScopeTag::new(Dimension::Service, tag)),
                );
            }
            collection.push_tagged(cidr, tags);
        }
    }
    Ok(collection)
}

// Exoscale

#[derive(Deserialize)]
struct ExoscalePrefixes {
    #[serde(default)]
    prefixes: Vec<ExoscalePrefix>,
}

#[derive(Deserialize)]
struct ExoscalePrefix {
    #[serde(rename = "IPv4Prefix")]
    ipv4_prefix: Option<String>,
    #[serde(rename = "IPv6Prefix")]
    ipv6_prefix: Option<String>,
    zone: Option<String>,
}

/// Region from `zone`; prefixes without a zone stay untagged.
pub fn parse_exoscale(_url: &str, body: &str) -> Result<Collection> {
    let doc: ExoscalePrefixes = serde_json::from_str(body).context("Invalid Exoscale prefix document")?;

    let mut collection = Collection::new();
    for entry in doc.prefixes {
        let Some(prefix) = entry.ipv4_prefix.or(entry.ipv6_prefix) else {
            continue;
        };
        match entry.zone.filter(|z| !z.trim().is_empty()) {
            Some(zone) => collection.push_scoped(prefix, Dimension::Region, zone),
            None => collection.push(prefix),
        }
    }
    Ok(collection)
}

// Vultr geofeed JSON

#[derive(Deserialize)]
struct VultrFeed {
    #[serde(default)]
    subnets: Vec<VultrSubnet>,
}

#[derive(Deserialize)]
struct VultrSubnet {
    ip_prefix: Option<String>,
    city: Option<String>,
    alpha2code: Option<String>,
}

/// Region `"City, CC"` when the subnet has a city.
pub fn parse_vultr(_url: &str, body: &str) -> Result<Collection> {
    let feed: VultrFeed = serde_json::from_str(body).context("Invalid Vultr geofeed document")?;

    let mut collection = Collection::new();
    for subnet in feed.subnets {
        let Some(prefix) = subnet.ip_prefix else { continue };
        let city = subnet.city.unwrap_or_default();
        let country = subnet.alpha2code.unwrap_or_default();
        let (city, country) = (city.trim(), country.trim());

        if city.is_empty() {
            collection.push(prefix);
        } else if country.is_empty() {
            collection.push_scoped(prefix, Dimension::Region, city);
        } else {
            collection.push_scoped(prefix, Dimension::Region, format!("{}, {}", city, country));
        }
    }
    Ok(collection)
}

// Ahrefs crawler IPs

#[derive(Deserialize)]
struct AhrefsIps {
    #[serde(default)]
    ips: Vec<AhrefsIp>,
}

#[derive(Deserialize)]
struct AhrefsIp {
    ip_address: Option<String>,
}

pub fn parse_ahrefs(_url: &str, body: &str) -> Result<Collection> {
    let doc: AhrefsIps = serde_json::from_str(body).context("Invalid Ahrefs crawler IP document")?;
    Ok(doc.ips.into_iter().filter_map(|entry| entry.ip_address).collect())
}
