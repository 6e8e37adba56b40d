//! Commission business logic - purchases and the commissions they paid.
//!
//! Stored commissions are read back as flat [`CommissionRecord`]s, the same shape
//! the commission backend delivers, so reports are built the same way whether the
//! records came from the local mirror or from an imported snapshot.

use crate::{
    core::{
        member::{create_member, get_member},
        records::{CommissionRecord, Identity, Purchase as PurchaseInfo, PurchaseType},
    },
    entities::{Commission, Member, Purchase, commission, member, purchase},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Records a purchase made by `purchaser_uid`.
///
/// # Errors
/// Returns an error if the amount is negative or not finite, or the insert fails.
pub async fn create_purchase<C: ConnectionTrait>(
    db: &C,
    purchaser_uid: &str,
    purchase_type: &PurchaseType,
    product_name: &str,
    amount: f64,
    purchased_at: DateTimeUtc,
) -> Result<purchase::Model> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Config {
            message: format!("Purchase amount must be a non-negative number, got {amount}"),
        });
    }

    let purchase = purchase::ActiveModel {
        purchaser_uid: Set(purchaser_uid.trim().to_string()),
        purchase_type: Set(purchase_type.to_string()),
        product_name: Set(product_name.to_string()),
        amount: Set(amount),
        purchased_at: Set(purchased_at),
        ..Default::default()
    };
    purchase.insert(db).await.map_err(Into::into)
}

/// Fields of a commission paid on one purchase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionInput {
    /// Depth of the purchaser below the upline
    pub level: u32,
    /// Commission paid out after fees
    pub commission: f64,
    /// Rate applied, in `[0, 1]`
    pub percentage: f64,
    /// Platform fee withheld
    pub fee_amount: f64,
    /// Commission before fees
    pub original_commission: f64,
}

/// Records a commission paid to `upline_uid` on a purchase.
///
/// # Errors
/// Returns an error if the purchase does not exist, the level is zero, or the
/// insert fails.
pub async fn create_commission<C: ConnectionTrait>(
    db: &C,
    purchase_id: i64,
    upline_uid: &str,
    input: CommissionInput,
) -> Result<commission::Model> {
    if input.level == 0 {
        return Err(Error::Config {
            message: "Commission level must be at least 1".to_string(),
        });
    }
    if Purchase::find_by_id(purchase_id).one(db).await?.is_none() {
        return Err(Error::Database(format!("Purchase {purchase_id} not found")));
    }

    let commission = commission::ActiveModel {
        purchase_id: Set(purchase_id),
        upline_uid: Set(upline_uid.trim().to_string()),
        level: Set(i32::try_from(input.level).unwrap_or(i32::MAX)),
        commission: Set(input.commission),
        percentage: Set(input.percentage),
        fee_amount: Set(input.fee_amount),
        original_commission: Set(input.original_commission),
        ..Default::default()
    };
    commission.insert(db).await.map_err(Into::into)
}

async fn member_names<C: ConnectionTrait>(
    db: &C,
    uids: Vec<String>,
) -> Result<HashMap<String, String>> {
    if uids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(Member::find()
        .filter(member::Column::Uid.is_in(uids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.uid, m.name))
        .collect())
}

fn identity(uid: &str, names: &HashMap<String, String>) -> Identity {
    Identity {
        uid: Some(uid.to_string()),
        name: names.get(uid).cloned(),
    }
}

/// Every commission paid to `upline_uid`, as flat records in payout order.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_commission_records_for_upline<C: ConnectionTrait>(
    db: &C,
    upline_uid: &str,
) -> Result<Vec<CommissionRecord>> {
    let rows = Commission::find()
        .filter(commission::Column::UplineUid.eq(upline_uid))
        .order_by_asc(commission::Column::Id)
        .find_also_related(Purchase)
        .all(db)
        .await?;

    let mut uids: Vec<String> = rows
        .iter()
        .filter_map(|(_, p)| p.as_ref().map(|p| p.purchaser_uid.clone()))
        .collect();
    uids.push(upline_uid.to_string());
    uids.sort();
    uids.dedup();
    let names = member_names(db, uids).await?;

    let records: Vec<CommissionRecord> = rows
        .into_iter()
        .map(|(c, p)| CommissionRecord {
            purchaser: p.as_ref().map(|p| identity(&p.purchaser_uid, &names)),
            level: u32::try_from(c.level).unwrap_or(0),
            upline: Some(identity(&c.upline_uid, &names)),
            purchase: p.map(|p| PurchaseInfo {
                purchase_type: Some(PurchaseType::from(p.purchase_type)),
                product_name: Some(p.product_name),
                amount: Some(p.amount),
                date: Some(p.purchased_at),
            }),
            commission: Some(c.commission),
            percentage: Some(c.percentage),
            fee_amount: Some(c.fee_amount),
            original_commission: Some(c.original_commission),
        })
        .collect();

    debug!(upline = upline_uid, count = records.len(), "Loaded commission records");
    Ok(records)
}

/// Number of stored commissions.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn count_commissions<C: ConnectionTrait>(db: &C) -> Result<u64> {
    Commission::find().count(db).await.map_err(Into::into)
}

/// What an import added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Members created for purchasers or uplines not stored yet
    pub members_created: usize,
    /// Purchases stored
    pub purchases: usize,
    /// Commissions stored
    pub commissions: usize,
    /// Records without a purchaser or upline uid
    pub skipped: usize,
}

async fn ensure_member<C: ConnectionTrait>(
    db: &C,
    person: &Identity,
    referrer: Option<&str>,
) -> Result<bool> {
    let Some(uid) = person.uid.as_deref().map(str::trim) else {
        return Ok(false);
    };
    if get_member(db, uid).await?.is_some() {
        return Ok(false);
    }
    create_member(db, uid, person.display_name(), referrer).await?;
    Ok(true)
}

/// Imports exported commission records in a single transaction.
///
/// Unknown purchasers and uplines become members; a level-1 purchaser is recorded
/// as referred by the upline. Each record stores one purchase and one commission.
///
/// # Errors
/// Returns an error if any insert fails; nothing is stored in that case.
pub async fn import_snapshot(
    db: &DatabaseConnection,
    records: &[CommissionRecord],
) -> Result<ImportSummary> {
    let txn = db.begin().await?;
    let mut summary = ImportSummary::default();

    for record in records {
        let (Some(purchaser), Some(upline)) = (&record.purchaser, &record.upline) else {
            summary.skipped += 1;
            continue;
        };
        let (Some(purchaser_uid), Some(upline_uid)) =
            (purchaser.uid.as_deref(), upline.uid.as_deref())
        else {
            summary.skipped += 1;
            continue;
        };

        if ensure_member(&txn, upline, None).await? {
            summary.members_created += 1;
        }
        let referrer = (record.level == 1).then_some(upline_uid);
        if ensure_member(&txn, purchaser, referrer).await? {
            summary.members_created += 1;
        }

        let info = record.purchase.clone().unwrap_or_default();
        let purchase_type = info
            .purchase_type
            .unwrap_or_else(|| PurchaseType::Other("Unknown".to_string()));
        let stored = create_purchase(
            &txn,
            purchaser_uid,
            &purchase_type,
            info.product_name.as_deref().unwrap_or_default(),
            info.amount.unwrap_or(0.0),
            info.date.unwrap_or_else(chrono::Utc::now),
        )
        .await?;
        summary.purchases += 1;

        if record.level == 0 {
            warn!(purchaser = purchaser_uid, "Imported purchase has no commission level");
            continue;
        }
        let commission = record.commission_amount();
        create_commission(
            &txn,
            stored.id,
            upline_uid,
            CommissionInput {
                level: record.level,
                commission,
                percentage: record.percentage.unwrap_or(0.0),
                fee_amount: record.fee_amount.unwrap_or(0.0),
                original_commission: record.original_commission.unwrap_or(commission),
            },
        )
        .await?;
        summary.commissions += 1;
    }

    txn.commit().await?;
    info!(
        "Imported {} commissions ({} new members, {} skipped)",
        summary.commissions, summary.members_created, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{aggregate::aggregate, records::parse_commission_records},
        test_utils::{create_sample_network, create_test_purchase_with_commission, setup_test_db},
    };

    #[tokio::test]
    async fn test_create_purchase_rejects_negative_amount() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_purchase(
            &db,
            "alice",
            &PurchaseType::Membership,
            "Gold",
            -1.0,
            chrono::Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_commission_requires_purchase() -> Result<()> {
        let db = setup_test_db().await?;
        let input = CommissionInput {
            level: 1,
            commission: 1.0,
            percentage: 0.15,
            fee_amount: 0.0,
            original_commission: 1.0,
        };
        assert!(create_commission(&db, 999, "rita", input).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_records_for_upline() -> Result<()> {
        let db = setup_test_db().await?;
        create_sample_network(&db).await?;
        create_test_purchase_with_commission(&db, "alice", "rita", 1, 100.0).await?;
        create_test_purchase_with_commission(&db, "alice", "rita", 1, 50.0).await?;
        create_test_purchase_with_commission(&db, "carol", "rita", 2, 40.0).await?;
        create_test_purchase_with_commission(&db, "carol", "alice", 1, 40.0).await?;

        let records = get_commission_records_for_upline(&db, "rita").await?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].purchaser_uid(), Some("alice"));
        assert_eq!(
            records[0].purchaser.as_ref().unwrap().name.as_deref(),
            Some("Alice")
        );
        assert_eq!(records[0].upline.as_ref().unwrap().display_name(), "Rita");
        assert_eq!(records[0].amount(), 100.0);
        assert_eq!(records[2].level, 2);

        let summaries = aggregate(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].purchases.len(), 2);
        assert_eq!(summaries[0].total_amount, 150.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_padded_uids_reuse_members() -> Result<()> {
        let db = setup_test_db().await?;
        let records = parse_commission_records(
            r#"[
                {"purchaser": {"uId": " x"}, "level": 1, "upline": {"uId": "rita "},
                 "purchase": {"amount": 10}, "commission": 1.5},
                {"purchaser": {"uId": " x"}, "level": 1, "upline": {"uId": "rita "},
                 "purchase": {"amount": 20}, "commission": 3}
            ]"#,
        )?;

        let summary = import_snapshot(&db, &records).await?;
        assert_eq!(summary.members_created, 2);
        assert_eq!(summary.commissions, 2);

        let x = get_member(&db, "x").await?.unwrap();
        assert_eq!(x.referrer_uid.as_deref(), Some("rita"));
        let stored = get_commission_records_for_upline(&db, "rita").await?;
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|r| r.purchaser_uid() == Some("x")));
        Ok(())
    }

    #[tokio::test]
    async fn test_import_snapshot() -> Result<()> {
        let db = setup_test_db().await?;
        let records = parse_commission_records(
            r#"[
                {"purchaser": {"uId": "alice", "name": "Alice"}, "level": 1,
                 "upline": {"uId": "rita", "name": "Rita"},
                 "purchase": {"type": "Membership", "productName": "Gold", "amount": 100},
                 "commission": 15, "percentage": 0.15},
                {"purchaser": {"uId": "carol", "name": "Carol"}, "level": 2,
                 "upline": {"uId": "rita", "name": "Rita"},
                 "purchase": {"type": "XFactor", "amount": "40"},
                 "commission": 2},
                {"purchaser": {"name": "No Id"}, "level": 1,
                 "upline": {"uId": "rita"}}
            ]"#,
        )?;

        assert_eq!(count_commissions(&db).await?, 0);
        let summary = import_snapshot(&db, &records).await?;
        assert_eq!(count_commissions(&db).await?, 2);
        assert_eq!(
            summary,
            ImportSummary {
                members_created: 3,
                purchases: 2,
                commissions: 2,
                skipped: 1,
            }
        );

        let alice = get_member(&db, "alice").await?.unwrap();
        assert_eq!(alice.referrer_uid.as_deref(), Some("rita"));
        let carol = get_member(&db, "carol").await?.unwrap();
        assert!(carol.referrer_uid.is_none());

        let stored = get_commission_records_for_upline(&db, "rita").await?;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].commission, Some(15.0));
        assert_eq!(stored[0].original_commission, Some(15.0));
        assert_eq!(
            stored[1].purchase.as_ref().unwrap().purchase_type,
            Some(PurchaseType::XFactor)
        );
        Ok(())
    }
}
