//! Partner entity - A sponsoring company whose employees share a billing-period budget.
//!
//! `total_shared_amount` is split evenly across `sponsored_employees_count` seats.
//! A partner without `last_period_started_at` has no open billing period, and
//! transactions for its clients are refused until one is started.

use super::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a partner is currently sponsoring clients
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    /// Partner is sponsoring clients
    #[sea_orm(string_value = "active")]
    Active,
    /// Partner is suspended
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

/// Partner database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "partners")]
pub struct Model {
    /// Unique identifier for the partner
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning hotel
    pub hotel_id: i64,
    /// Company name, copied onto clients and transactions
    pub name: String,
    /// Maximum number of clients this partner may sponsor at once
    pub sponsored_employees_count: i32,
    /// Budget for the current period, split evenly among sponsored employees
    pub total_shared_amount: Money,
    /// Start of the current billing period, `None` before the first one
    pub last_period_started_at: Option<DateTimeUtc>,
    /// Active or inactive
    pub status: PartnerStatus,
    /// When the partner was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Partner and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each partner belongs to one hotel
    #[sea_orm(
        belongs_to = "super::hotel::Entity",
        from = "Column::HotelId",
        to = "super::hotel::Column::Id"
    )]
    Hotel,
    /// One partner sponsors many clients
    #[sea_orm(has_many = "super::client::Entity")]
    Clients,
    /// One partner has many closed periods
    #[sea_orm(has_many = "super::period_history::Entity")]
    PeriodHistory,
}

impl Related<super::hotel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hotel.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::period_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
