//! Purchaser aggregation.
//!
//! Groups a flat list of commission records into one summary per purchaser,
//! keyed by `purchaser.uId`, with running purchase and commission totals.

use super::records::{CommissionRecord, Identity};
use std::collections::HashMap;

/// All purchases of a single purchaser within one commission-network fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaserSummary {
    /// The purchaser, as first seen in the input
    pub purchaser: Identity,
    /// Level carried from the first record of this purchaser
    pub level: u32,
    /// Upline carried from the first record of this purchaser
    pub upline: Option<Identity>,
    /// Every record of this purchaser, in input order
    pub purchases: Vec<CommissionRecord>,
    /// Sum of purchase amounts
    pub total_amount: f64,
    /// Sum of commissions
    pub total_commission: f64,
}

impl PurchaserSummary {
    /// The summary key.
    #[must_use]
    pub fn uid(&self) -> &str {
        self.purchaser.uid.as_deref().unwrap_or_default()
    }
}

/// Groups records by purchaser uid and sorts the summaries by level.
///
/// Records without a purchaser uid are dropped and contribute to no total.
/// The sort is stable, so purchasers on the same level keep their first-seen order.
#[must_use]
pub fn aggregate(records: &[CommissionRecord]) -> Vec<PurchaserSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<PurchaserSummary> = Vec::new();

    for record in records {
        let Some(uid) = record.purchaser_uid() else {
            continue;
        };

        let slot = *index.entry(uid).or_insert_with(|| {
            summaries.push(PurchaserSummary {
                purchaser: record.purchaser.clone().unwrap_or_default(),
                level: record.level,
                upline: record.upline.clone(),
                purchases: Vec::new(),
                total_amount: 0.0,
                total_commission: 0.0,
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[slot];
        summary.purchases.push(record.clone());
        summary.total_amount += record.amount();
        summary.total_commission += record.commission_amount();
    }

    summaries.sort_by_key(|s| s.level);
    summaries
}
