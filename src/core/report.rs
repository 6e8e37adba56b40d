//! Commission report generation.
//!
//! Bundles everything the commission page shows for one upline: the stat cards
//! (totals and purchaser count) and the per-level purchaser groups labelled with
//! their display rate. The report is rebuilt from scratch for every fetch.

use super::{
    aggregate::{PurchaserSummary, aggregate},
    format,
    levels::{LevelRates, NetworkTotals, classify_by_level, totals},
    records::{CommissionRecord, Identity},
};

/// Purchasers of one level together with the level's display rate.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelGroup {
    /// Network level (1 = direct referral)
    pub level: u32,
    /// Display rate for this level, if configured
    pub rate: Option<f64>,
    /// Purchasers on this level, first-seen order
    pub purchasers: Vec<PurchaserSummary>,
}

impl LevelGroup {
    /// Heading such as `Level 1 · 15%`.
    #[must_use]
    pub fn heading(&self) -> String {
        self.rate.map_or_else(
            || format!("Level {}", self.level),
            |rate| format!("Level {} · {}", self.level, format::format_percentage(rate)),
        )
    }

    /// Commission earned from this level.
    #[must_use]
    pub fn total_commission(&self) -> f64 {
        self.purchasers.iter().map(|p| p.total_commission).sum()
    }
}

/// Structured data for the commission page of one upline.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionReport {
    /// The upline the records were fetched for, taken from the first record
    pub upline: Option<Identity>,
    /// Totals over the flat record list
    pub totals: NetworkTotals,
    /// Number of distinct purchasers
    pub purchaser_count: usize,
    /// Non-empty level groups in ascending level order
    pub groups: Vec<LevelGroup>,
    /// Every purchaser summary, including those on levels that are not displayed
    pub purchasers: Vec<PurchaserSummary>,
}

impl CommissionReport {
    /// Builds the report from one fetch of commission records.
    #[must_use]
    pub fn build(records: &[CommissionRecord], levels: &[u32], rates: &LevelRates) -> Self {
        let summaries = aggregate(records);
        let purchaser_count = summaries.len();
        let groups = classify_by_level(&summaries, levels)
            .into_iter()
            .map(|(level, purchasers)| LevelGroup {
                level,
                rate: rates.rate_for(level),
                purchasers,
            })
            .collect();

        Self {
            upline: records.iter().find_map(|r| r.upline.clone()),
            totals: totals(records),
            purchaser_count,
            groups,
            purchasers: summaries,
        }
    }

    /// Finds a purchaser's summary by uid, whether or not its level is displayed.
    #[must_use]
    pub fn purchaser(&self, uid: &str) -> Option<&PurchaserSummary> {
        let uid = uid.trim();
        self.purchasers.iter().find(|p| p.uid() == uid)
    }

    /// True when the fetch produced nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One line per purchaser: name, purchase count, sales and commission.
#[must_use]
pub fn format_purchaser_line(summary: &PurchaserSummary) -> String {
    let count = summary.purchases.len();
    format!(
        "{} (`{}`) · {} purchase{} · sales {} · commission {}",
        summary.purchaser.display_name(),
        summary.uid(),
        count,
        if count == 1 { "" } else { "s" },
        format::format_currency(summary.total_amount),
        format::format_currency(summary.total_commission),
    )
}

/// One line per purchase record of a purchaser.
#[must_use]
pub fn format_purchase_line(record: &CommissionRecord) -> String {
    let purchase = record.purchase.clone().unwrap_or_default();
    let kind = purchase
        .purchase_type
        .map_or_else(|| "Purchase".to_string(), |t| t.to_string());
    let product = purchase.product_name.unwrap_or_else(|| "-".to_string());
    let date = purchase
        .date
        .map_or_else(|| "unknown date".to_string(), |d| format::format_date(&d));
    let rate = record
        .percentage
        .map(|p| format!(" @ {}", format::format_percentage(p)))
        .unwrap_or_default();

    format!(
        "{kind} · {product} · {} on {date} → {}{rate}",
        format::format_currency(record.amount()),
        format::format_currency(record.commission_amount()),
    )
}
