//! Commission record wire model.
//!
//! A commission record is one row of the commission-network response: who bought
//! what, at which depth below the viewing upline, and what that purchase paid out.
//! The backend is not strict about its numeric fields (decimals arrive as numbers,
//! numeric strings, or `null`), so every amount is parsed leniently and coalesces
//! to zero when it is missing or malformed.

use crate::errors::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A user reference as it appears in commission payloads (`{uId, name}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend user id; records without one are ignored by aggregation
    #[serde(rename = "uId", default, deserialize_with = "lenient_id")]
    pub uid: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

impl Identity {
    /// Builds an identity with both fields present.
    #[must_use]
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            name: Some(name.into()),
        }
    }

    /// Name if known, otherwise the uid, otherwise a placeholder.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.uid.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Product family that generated a commission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PurchaseType {
    /// Membership plan purchase
    Membership,
    /// `XFactor` add-on tied to a membership
    XFactor,
    /// Any type this viewer does not know about, kept verbatim
    Other(String),
}

impl From<String> for PurchaseType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "membership" => Self::Membership,
            "xfactor" | "x-factor" | "x_factor" => Self::XFactor,
            _ => Self::Other(value),
        }
    }
}

impl From<PurchaseType> for String {
    fn from(value: PurchaseType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Membership => f.write_str("Membership"),
            Self::XFactor => f.write_str("XFactor"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// The purchase behind a commission record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Membership or `XFactor`
    #[serde(rename = "type", default)]
    pub purchase_type: Option<PurchaseType>,
    /// Product name shown to admins
    #[serde(default)]
    pub product_name: Option<String>,
    /// Purchase amount in dollars
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    /// When the purchase happened
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<DateTime<Utc>>,
}

/// One flat commission record as delivered by the commission-network endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRecord {
    /// The member whose purchase generated this commission
    #[serde(default)]
    pub purchaser: Option<Identity>,
    /// Depth of the purchaser below the upline (expected 1..=3)
    #[serde(default, deserialize_with = "lenient_level")]
    pub level: u32,
    /// The referrer at the root of this network branch
    #[serde(default)]
    pub upline: Option<Identity>,
    /// The purchase itself
    #[serde(default)]
    pub purchase: Option<Purchase>,
    /// Commission paid to the upline for this purchase
    #[serde(default, deserialize_with = "lenient_amount")]
    pub commission: Option<f64>,
    /// Commission rate applied, in `[0, 1]`
    #[serde(default, deserialize_with = "lenient_amount")]
    pub percentage: Option<f64>,
    /// Platform fee withheld from the original commission
    #[serde(default, deserialize_with = "lenient_amount")]
    pub fee_amount: Option<f64>,
    /// Commission before fees
    #[serde(default, deserialize_with = "lenient_amount")]
    pub original_commission: Option<f64>,
}

impl CommissionRecord {
    /// The purchaser's uid, if the record carries one.
    #[must_use]
    pub fn purchaser_uid(&self) -> Option<&str> {
        self.purchaser.as_ref().and_then(|p| p.uid.as_deref())
    }

    /// Purchase amount, zero when absent.
    #[must_use]
    pub fn amount(&self) -> f64 {
        self.purchase.as_ref().and_then(|p| p.amount).unwrap_or(0.0)
    }

    /// Commission amount, zero when absent.
    #[must_use]
    pub fn commission_amount(&self) -> f64 {
        self.commission.unwrap_or(0.0)
    }
}

/// Parses a JSON array of commission records.
///
/// Individual fields are parsed leniently; only a payload that is not a JSON array
/// of objects is rejected.
pub fn parse_commission_records(json: &str) -> Result<Vec<CommissionRecord>> {
    Ok(serde_json::from_str(json)?)
}

fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(amount.filter(|a| a.is_finite()))
}

fn lenient_level<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_count(deserializer)?.unwrap_or(0))
}

/// A non-negative integer given as a number or a numeric string; anything else
/// is `None`.
pub(crate) fn lenient_count<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|l| u32::try_from(l).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

pub(crate) fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        _ => None,
    })
}
