//! Deduplication and address-space accounting.
//!
//! Duplicates are exact text matches after trimming. No CIDR equivalence or
//! containment merging is applied: `10.0.0.0/24` and `10.0.0.0/25` both stay.

use std::collections::BTreeSet;

use crate::literal::{classify, AddressLiteral, Family};

/// Result of collapsing one source's raw strings.
#[derive(Debug, Default, Clone)]
pub struct Deduplicated {
    pub literals: BTreeSet<AddressLiteral>,
    /// Candidates that failed classification.
    pub invalid: usize,
    /// Valid candidates that repeated an earlier one.
    pub duplicates: usize,
}

/// Classify every raw string and keep one literal per distinct trimmed text.
///
/// # Examples
/// ```
/// use ipharvest::aggregator::deduplicate;
/// let dedup = deduplicate(["10.0.0.1", " 10.0.0.1 ", "nope"]);
/// assert_eq!(dedup.literals.len(), 1);
/// assert_eq!(dedup.invalid, 1);
/// assert_eq!(dedup.duplicates, 1);
/// ```
pub fn deduplicate<I, S>(raw: I) -> Deduplicated
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = Deduplicated::default();
    for candidate in raw {
        match classify(candidate.as_ref()) {
            Some(literal) => {
                if !result.literals.insert(literal) {
                    result.duplicates += 1;
                }
            }
            None => result.invalid += 1,
        }
    }
    result
}

/// Split literals into IPv4 and IPv6 lists, preserving iteration order.
pub fn split_by_family<'a, I>(literals: I) -> (Vec<&'a AddressLiteral>, Vec<&'a AddressLiteral>)
where
    I: IntoIterator<Item = &'a AddressLiteral>,
{
    literals
        .into_iter()
        .partition(|literal| literal.family() == Family::V4)
}

/// Address-space contribution of one literal.
///
/// IPv4 counts addresses (`2^(32 - prefix)`). IPv6 counts covered /64
/// subnets (`2^(128 - prefix) / 2^64`), so anything longer than /64
/// contributes 0.
pub fn address_space(literal: &AddressLiteral) -> u128 {
    let prefix = u32::from(literal.prefix_len());
    match literal.family() {
        Family::V4 => 1u128 << (32 - prefix),
        Family::V6 if prefix <= 64 => 1u128 << (64 - prefix),
        Family::V6 => 0,
    }
}

/// Sum of [`address_space`] over a list, saturating instead of overflowing.
pub fn total_address_space<'a, I>(literals: I) -> u128
where
    I: IntoIterator<Item = &'a AddressLiteral>,
{
    literals
        .into_iter()
        .map(address_space)
        .fold(0u128, |acc, count| acc.saturating_add(count))
}
