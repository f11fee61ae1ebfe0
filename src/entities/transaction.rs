//! Transaction entity - A meal or service charge billed against a client's allowance.
//!
//! Client and partner names are denormalized so history stays readable after a
//! client is deleted. There is no foreign key to `clients`, so deleting a client
//! leaves its transactions in place.
use super::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome recorded on a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Covered by the available balance
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Needs attention, e.g. it overdrew the allowance
    #[sea_orm(string_value = "flagged")]
    Flagged,
}

impl TransactionStatus {
    /// Lowercase label used in reports and CSV exports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Flagged => "flagged",
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning hotel
    pub hotel_id: i64,
    /// Client the amount was billed to
    pub client_id: i64,
    /// Client name at the time of the transaction
    pub client_name: String,
    /// Partner sponsoring the client
    pub partner_id: i64,
    /// Partner name at the time of the transaction
    pub partner_name: String,
    /// Billed amount, always positive
    pub amount: Money,
    /// Receipt number printed on the bill
    pub receipt_no: String,
    /// Completed or flagged
    pub status: TransactionStatus,
    /// User who recorded the transaction
    pub recorded_by: String,
    /// When the transaction was recorded
    pub created_at: DateTimeUtc,
}

/// Transactions have no enforced relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
