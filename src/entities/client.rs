//! Client entity - An employee sponsored by a partner, tracked against a period allowance.
//!
//! `version` is bumped on every balance write and used as the compare-and-swap key
//! by the ledger operations.

use super::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning hotel
    pub hotel_id: i64,
    /// Sponsoring partner
    pub partner_id: i64,
    /// Denormalized partner name, rewritten whenever the partner is renamed
    pub partner_name: String,
    /// Client name
    pub name: String,
    /// Budget allotted for the current period
    pub period_allowance: Money,
    /// Sum of transactions recorded in the current period
    pub utilized_amount: Money,
    /// Overdraft carried by the client, never negative
    pub debt: Money,
    /// Optimistic concurrency counter
    pub version: i64,
    /// When the client was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each client belongs to one partner
    #[sea_orm(
        belongs_to = "super::partner::Entity",
        from = "Column::PartnerId",
        to = "super::partner::Column::Id"
    )]
    Partner,
}

impl Related<super::partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
