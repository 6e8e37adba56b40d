//! Commission entity - What one upline earned from one purchase.
//!
//! A purchase pays a commission to each upline within reach; `level` is the
//! purchaser's depth below that upline (1 = direct referral). `fee_amount` is
//! withheld from `original_commission`, leaving `commission`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Commission database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
    /// Unique identifier for the commission
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Purchase this commission was paid on
    pub purchase_id: i64,
    /// Uid of the upline receiving the commission
    pub upline_uid: String,
    /// Depth of the purchaser below the upline
    pub level: i32,
    /// Commission paid out after fees
    pub commission: f64,
    /// Rate applied, in `[0, 1]`
    pub percentage: f64,
    /// Platform fee withheld
    pub fee_amount: f64,
    /// Commission before fees
    pub original_commission: f64,
}

/// Defines relationships between Commission and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each commission belongs to one purchase
    #[sea_orm(
        belongs_to = "super::purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::purchase::Column::Id"
    )]
    Purchase,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
