//! Hotel entity - The tenant every partner, client and transaction belongs to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hotel database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hotels")]
pub struct Model {
    /// Unique identifier for the hotel
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the hotel
    #[sea_orm(unique)]
    pub name: String,
    /// When the hotel was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Hotel and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One hotel has many partners
    #[sea_orm(has_many = "super::partner::Entity")]
    Partners,
}

impl Related<super::partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
