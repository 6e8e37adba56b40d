//! Member entity - A user of the platform and their place in the referral network.
//!
//! Each member is identified by the backend's `uId` and may point at the member who
//! referred them. Following `referrer_uid` upwards gives a member's upline; following
//! it downwards gives their network.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// Backend user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    /// Display name
    pub name: String,
    /// Uid of the member who referred this one, None for top-level members
    pub referrer_uid: Option<String>,
    /// When the member joined
    pub joined_at: DateTimeUtc,
}

/// Defines relationships between Member and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One member makes many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
