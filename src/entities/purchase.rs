//! Purchase entity - A membership or `XFactor` purchase made by a member.
//!
//! Purchases are what commissions are paid on. `purchase_type` holds the product
//! family (`"Membership"` or `"XFactor"`); `product_name` the plan that was bought.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Unique identifier for the purchase
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Uid of the member who made the purchase
    pub purchaser_uid: String,
    /// Product family: `"Membership"`, `"XFactor"`, or whatever the backend sent
    pub purchase_type: String,
    /// Name of the plan or add-on
    pub product_name: String,
    /// Amount paid in dollars
    pub amount: f64,
    /// When the purchase was made
    pub purchased_at: DateTimeUtc,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each purchase belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::PurchaserUid",
        to = "super::member::Column::Uid"
    )]
    Member,
    /// One purchase pays commissions to several uplines
    #[sea_orm(has_many = "super::commission::Entity")]
    Commissions,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::commission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
