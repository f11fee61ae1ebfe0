//! Period history entity - Snapshot of a partner's terms for a closed billing period.
//!
//! Rows are appended by period rollover and never modified.

use super::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Period history database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "period_history")]
pub struct Model {
    /// Unique identifier for the history row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Partner whose period was closed
    pub partner_id: i64,
    /// Start of the closed period
    pub start_date: DateTimeUtc,
    /// End of the closed period
    pub end_date: DateTimeUtc,
    /// Employee cap in force during the period
    pub sponsored_employees_count: i32,
    /// Shared budget in force during the period
    pub total_shared_amount: Money,
    /// Clients under the partner when the period closed
    pub clients_count: i64,
    /// User who closed the period
    pub closed_by: String,
}

/// Defines relationships between `PeriodHistory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one partner
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
