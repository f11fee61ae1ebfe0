//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod client;
pub mod hotel;
pub mod money;
pub mod partner;
pub mod period_history;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use hotel::{Column as HotelColumn, Entity as Hotel, Model as HotelModel};
pub use money::Money;
pub use partner::{
    Column as PartnerColumn, Entity as Partner, Model as PartnerModel, PartnerStatus,
};
pub use period_history::{
    Column as PeriodHistoryColumn, Entity as PeriodHistory, Model as PeriodHistoryModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionStatus,
};
