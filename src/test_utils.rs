//! Shared test utilities for the commission network.
//!
//! This module provides common helper functions for setting up test databases
//! and creating members, purchases, and commissions with sensible defaults.

use crate::{
    core::{
        commission::{CommissionInput, create_commission, create_purchase},
        levels::LevelRates,
        member::create_member,
        records::PurchaseType,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Routes tracing output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test member named after its uid, capitalized (`"alice"` -> `"Alice"`).
pub async fn create_test_member(
    db: &DatabaseConnection,
    uid: &str,
    referrer_uid: Option<&str>,
) -> Result<entities::member::Model> {
    let mut chars = uid.chars();
    let name: String = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    create_member(db, uid, &name, referrer_uid).await
}

/// Creates a membership purchase and the commission it paid to `upline_uid`.
///
/// # Defaults
/// * `product_name`: `"Gold Plan"`
/// * percentage: the default rate for `level`
/// * `fee_amount`: 0.0
pub async fn create_test_purchase_with_commission(
    db: &DatabaseConnection,
    purchaser_uid: &str,
    upline_uid: &str,
    level: u32,
    amount: f64,
) -> Result<entities::commission::Model> {
    let purchase = create_purchase(
        db,
        purchaser_uid,
        &PurchaseType::Membership,
        "Gold Plan",
        amount,
        chrono::Utc::now(),
    )
    .await?;
    let percentage = LevelRates::default().rate_for(level).unwrap_or(0.0);
    let commission = amount * percentage;
    create_commission(
        db,
        purchase.id,
        upline_uid,
        CommissionInput {
            level,
            commission,
            percentage,
            fee_amount: 0.0,
            original_commission: commission,
        },
    )
    .await
}

/// Creates a small referral network:
///
/// ```text
/// rita
/// ├── alice
/// │   ├── carol
/// │   │   └── erin
/// │   └── dave ("Dave Marsh")
/// └── bob
/// ```
pub async fn create_sample_network(db: &DatabaseConnection) -> Result<()> {
    create_test_member(db, "rita", None).await?;
    create_test_member(db, "alice", Some("rita")).await?;
    create_test_member(db, "bob", Some("rita")).await?;
    create_test_member(db, "carol", Some("alice")).await?;
    create_member(db, "dave", "Dave Marsh", Some("alice")).await?;
    create_test_member(db, "erin", Some("carol")).await?;
    Ok(())
}

/// Sets up a database holding the sample network.
pub async fn setup_with_network() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    create_sample_network(&db).await?;
    Ok(db)
}
