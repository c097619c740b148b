//! Aggregate statistics over a deduplicated literal set.

use serde::Serialize;

use crate::aggregator::{split_by_family, total_address_space};
use crate::literal::AddressLiteral;

/// Counts for one address family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FamilyStats {
    /// Literals without a prefix.
    pub single: usize,
    /// Literals with an explicit prefix.
    pub ranges: usize,
    /// IPv4: addresses. IPv6: /64 subnets.
    pub address_space: u128,
}

impl FamilyStats {
    fn compute(literals: &[&AddressLiteral]) -> Self {
        let single = literals.iter().filter(|l| l.is_single()).count();
        Self {
            single,
            ranges: literals.len() - single,
            address_space: total_address_space(literals.iter().copied()),
        }
    }

    pub fn total(&self) -> usize {
        self.single + self.ranges
    }
}

/// Totals for one source, recomputed on every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStatistics {
    pub total: usize,
    pub ipv4: FamilyStats,
    pub ipv6: FamilyStats,
}

impl AggregateStatistics {
    /// Compute from lists the caller already split by family.
    pub fn compute(ipv4: &[&AddressLiteral], ipv6: &[&AddressLiteral]) -> Self {
        Self {
            total: ipv4.len() + ipv6.len(),
            ipv4: FamilyStats::compute(ipv4),
            ipv6: FamilyStats::compute(ipv6),
        }
    }

    /// Split and compute in one go.
    pub fn from_literals<'a, I>(literals: I) -> Self
    where
        I: IntoIterator<Item = &'a AddressLiteral>,
    {
        let (ipv4, ipv6) = split_by_family(literals);
        Self::compute(&ipv4, &ipv6)
    }
}
