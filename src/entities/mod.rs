//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities mirror the commission backend: members and their referrers,
//! purchases, and the commissions those purchases paid out.

pub mod commission;
pub mod member;
pub mod purchase;

// Re-export specific types to avoid conflicts
pub use commission::{
    Column as CommissionColumn, Entity as Commission, Model as CommissionModel,
};
pub use member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
