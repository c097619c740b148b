//! Address literal classification.
//!
//! Every raw string handed over by a source goes through [`classify`]. A string
//! is accepted when it parses as an IPv4 or IPv6 network with an optional
//! prefix length (no prefix means a host address). IPv4 networks may also
//! carry a dotted netmask or hostmask (`10.0.0.0/255.0.0.0`,
//! `10.0.0.0/0.255.255.255`). Anything else is dropped
//! without an error: callers must not assume one output per input.

use ipnet::{IpNet, Ipv4Net};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// Address family of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Suffix used in output file names (`ipv4`, `ipv6`).
    pub fn label(self) -> &'static str {
        match self {
            Family::V4 => "ipv4",
            Family::V6 => "ipv6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::V4 => f.write_str("IPv4"),
            Family::V6 => f.write_str("IPv6"),
        }
    }
}

/// A validated, trimmed address or CIDR block.
///
/// Identity is the trimmed text: `10.0.0.1` and `10.0.0.1/32` are two
/// different literals even though they cover the same address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressLiteral {
    raw: String,
    net: IpNet,
    single: bool,
}

impl AddressLiteral {
    /// Trimmed text as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn family(&self) -> Family {
        match self.net {
            IpNet::V4(_) => Family::V4,
            IpNet::V6(_) => Family::V6,
        }
    }

    /// True when the text carries no `/`, whatever the implied prefix.
    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Parsed network, host bits preserved.
    pub fn network(&self) -> IpNet {
        self.net
    }

    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    /// Numeric ordering key: family, network address, then prefix length.
    pub fn sort_key(&self) -> (Family, u128, u8) {
        let address = match self.net.trunc().network() {
            IpAddr::V4(v4) => u32::from(v4) as u128,
            IpAddr::V6(v6) => u128::from(v6),
        };
        (self.family(), address, self.prefix_len())
    }

    /// True when the whole block sits inside RFC 1918 or RFC 4193 space.
    pub fn is_private(&self) -> bool {
        match self.net {
            IpNet::V4(net) => {
                // Host bits are irrelevant, only the block boundary counts
                let prefix = net.prefix_len();
                let [a, b, ..] = net.network().octets();
                (a == 10 && prefix >= 8)
                    || (a == 172 && b & 0xf0 == 16 && prefix >= 12)
                    || (a == 192 && b == 168 && prefix >= 16)
            }
            // fc00::/7
            IpNet::V6(net) => net.network().segments()[0] & 0xfe00 == 0xfc00 && net.prefix_len() >= 7,
        }
    }
}

// Ordered by text so that sets of literals iterate deterministically.
impl Ord for AddressLiteral {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl PartialOrd for AddressLiteral {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AddressLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Classify a raw string into an [`AddressLiteral`].
///
/// Surrounding whitespace is trimmed first. Returns `None` for anything that
/// is not an address or CIDR block.
///
/// # Examples
/// ```
/// use ipharvest::literal::{classify, Family};
///
/// let lit = classify(" 192.0.2.0/24 ").unwrap();
/// assert_eq!(lit.raw(), "192.0.2.0/24");
/// assert_eq!(lit.family(), Family::V4);
/// assert!(!lit.is_single());
///
/// assert!(classify("2001:db8::1").unwrap().is_single());
/// assert!(classify("not-an-ip").is_none());
/// ```
pub fn classify(raw: &str) -> Option<AddressLiteral> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let single = !text.contains('/');
    let net = if single {
        IpNet::from(text.parse::<IpAddr>().ok()?)
    } else {
        text.parse::<IpNet>().ok().or_else(|| parse_ipv4_mask(text))?
    };

    Some(AddressLiteral {
        raw: text.to_string(),
        net,
        single,
    })
}

/// `a.b.c.d/m.m.m.m`, where the mask is a contiguous netmask or hostmask.
fn parse_ipv4_mask(text: &str) -> Option<IpNet> {
    let (addr, mask) = text.split_once('/')?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    let mask: Ipv4Addr = mask.parse().ok()?;
    Ipv4Net::with_netmask(addr, mask)
        .or_else(|_| Ipv4Net::with_netmask(addr, Ipv4Addr::from(!u32::from(mask))))
        .ok()
        .map(IpNet::V4)
}

/// Private-space check on a raw string; invalid input is never private.
///
/// # Examples
/// ```
/// use ipharvest::literal::is_private;
/// assert!(is_private("10.1.2.3"));
/// assert!(is_private("fd00::/8"));
/// assert!(!is_private("8.8.8.8"));
/// assert!(!is_private("garbage"));
/// ```
pub fn is_private(raw: &str) -> bool {
    classify(raw).is_some_and(|lit| lit.is_private())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn ipv4_literal_strategy() -> impl Strategy<Value = String> {
        (any::<u32>(), proptest::option::of(0u8..=32)).prop_map(|(addr, prefix)| {
            let ip = Ipv4Addr::from(addr);
            match prefix {
                Some(p) => format!("{}/{}", ip, p),
                None => ip.to_string(),
            }
        })
    }

    fn ipv6_literal_strategy() -> impl Strategy<Value = String> {
        (any::<u128>(), proptest::option::of(0u8..=128)).prop_map(|(addr, prefix)| {
            let ip = Ipv6Addr::from(addr);
            match prefix {
                Some(p) => format!("{}/{}", ip, p),
                None => ip.to_string(),
            }
        })
    }

    proptest! {
        /// Family and single flag agree with the standard parsers
        #[test]
        fn prop_classify_matches_reference(
            raw in prop_oneof![ipv4_literal_strategy(), ipv6_literal_strategy()]
        ) {
            let lit = classify(&raw).unwrap();
            let (addr_part, has_prefix) = match raw.split_once('/') {
                Some((addr, _)) => (addr, true),
                None => (raw.as_str(), false),
            };
            let reference: IpAddr = addr_part.parse().unwrap();
            let expected = if reference.is_ipv4() { Family::V4 } else { Family::V6 };
            prop_assert_eq!(lit.family(), expected);
            prop_assert_eq!(lit.is_single(), !has_prefix);
            prop_assert_eq!(lit.raw(), raw.as_str());
        }

        /// Classification never panics on arbitrary text
        #[test]
        fn prop_classify_arbitrary_no_panic(raw in ".{0,64}") {
            let _ = classify(&raw);
        }

        /// Whitespace padding does not change the literal
        #[test]
        fn prop_classify_ignores_padding(raw in ipv4_literal_strategy(), pad in "[ \t]{0,3}") {
            let padded = format!("{pad}{raw}{pad}");
            prop_assert_eq!(classify(&padded), classify(&raw));
        }
    }
}
