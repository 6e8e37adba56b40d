//! Level bucketing, network totals, and the display commission rate per level.

use super::{aggregate::PurchaserSummary, records::CommissionRecord};
use std::collections::BTreeMap;

/// Levels shown in the commission report unless configured otherwise.
pub const DEFAULT_LEVELS: [u32; 3] = [1, 2, 3];

/// Sales and commission totals over a whole fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkTotals {
    /// Sum of every record's commission
    pub total_commission: f64,
    /// Sum of every record's purchase amount
    pub total_sales: f64,
}

/// Sums commission and sales over the flat record list.
///
/// This runs over the records rather than the summaries, so every purchase
/// counts, including records that aggregation drops for lacking a purchaser.
#[must_use]
pub fn totals(records: &[CommissionRecord]) -> NetworkTotals {
    records
        .iter()
        .fold(NetworkTotals::default(), |acc, record| NetworkTotals {
            total_commission: acc.total_commission + record.commission_amount(),
            total_sales: acc.total_sales + record.amount(),
        })
}

/// Buckets summaries into the requested levels.
///
/// Only levels that have at least one purchaser appear in the result.
#[must_use]
pub fn classify_by_level(
    summaries: &[PurchaserSummary],
    levels: &[u32],
) -> BTreeMap<u32, Vec<PurchaserSummary>> {
    let mut buckets: BTreeMap<u32, Vec<PurchaserSummary>> = BTreeMap::new();
    for summary in summaries.iter().filter(|s| levels.contains(&s.level)) {
        buckets
            .entry(summary.level)
            .or_default()
            .push(summary.clone());
    }
    buckets
}

/// Display commission rate per level.
///
/// These are presentation constants: they label the level groups and are never
/// derived from, or checked against, the `percentage` on individual records.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRates {
    rates: BTreeMap<u32, f64>,
}

impl Default for LevelRates {
    fn default() -> Self {
        Self::from_pairs([(1, 0.15), (2, 0.05), (3, 0.04)])
    }
}

impl LevelRates {
    /// Builds a rate table from `(level, rate)` pairs; later pairs win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, f64)>) -> Self {
        Self {
            rates: pairs.into_iter().collect(),
        }
    }

    /// Rate configured for `level`, if any.
    #[must_use]
    pub fn rate_for(&self, level: u32) -> Option<f64> {
        self.rates.get(&level).copied()
    }

    /// Configured levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.rates.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{
        aggregate::aggregate,
        records::{Identity, Purchase},
    };

    fn record(uid: Option<&str>, level: u32, commission: f64, amount: f64) -> CommissionRecord {
        CommissionRecord {
            purchaser: uid.map(|u| Identity::new(u, u)),
            level,
            commission: Some(commission),
            purchase: Some(Purchase {
                amount: Some(amount),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_totals_count_every_record() {
        let records = vec![
            record(Some("A"), 1, 5.0, 10.0),
            record(Some("A"), 1, 3.0, 20.0),
            record(None, 2, 2.0, 4.0),
        ];
        let totals = totals(&records);
        assert_eq!(totals.total_commission, 10.0);
        assert_eq!(totals.total_sales, 34.0);
    }

    #[test]
    fn test_totals_of_empty_input_are_zero() {
        assert_eq!(totals(&[]), NetworkTotals::default());
    }

    #[test]
    fn test_classify_omits_empty_levels() {
        let records = vec![
            record(Some("A"), 1, 1.0, 1.0),
            record(Some("B"), 3, 1.0, 1.0),
            record(Some("C"), 1, 1.0, 1.0),
        ];
        let buckets = classify_by_level(&aggregate(&records), &DEFAULT_LEVELS);

        assert_eq!(buckets.len(), 2);
        assert!(!buckets.contains_key(&2));
        let level_one: Vec<&str> = buckets[&1].iter().map(PurchaserSummary::uid).collect();
        assert_eq!(level_one, vec!["A", "C"]);
        assert_eq!(buckets[&3].len(), 1);
    }

    #[test]
    fn test_classify_ignores_unrequested_levels() {
        let records = vec![record(Some("A"), 4, 1.0, 1.0), record(Some("B"), 0, 1.0, 1.0)];
        assert!(classify_by_level(&aggregate(&records), &DEFAULT_LEVELS).is_empty());
    }

    #[test]
    fn test_default_rates() {
        let rates = LevelRates::default();
        assert_eq!(rates.rate_for(1), Some(0.15));
        assert_eq!(rates.rate_for(2), Some(0.05));
        assert_eq!(rates.rate_for(3), Some(0.04));
        assert_eq!(rates.rate_for(4), None);
        assert_eq!(rates.levels().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_later_pairs_override_earlier_ones() {
        let rates = LevelRates::from_pairs([(1, 0.15), (1, 0.2)]);
        assert_eq!(rates.rate_for(1), Some(0.2));
    }
}
