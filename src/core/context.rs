//! Execution context passed to every ledger operation.
//!
//! A [`LedgerContext`] bundles the storage handle, the acting user and the hotel
//! the user selected. Operations only see records of that hotel.

use crate::{
    config::settings::LedgerSettings,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

/// What an authenticated user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages partners, clients, periods and corrections
    Admin,
    /// Front-desk staff recording transactions
    Member,
}

/// The authenticated user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier, stored on audit columns
    pub user_id: String,
    /// Role granted to the user
    pub role: Role,
}

impl Actor {
    /// An administrator.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    /// A regular member.
    pub fn member(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Member,
        }
    }

    /// Fails with [`Error::Forbidden`] unless the actor is an admin.
    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Member => Err(Error::Forbidden {
                user_id: self.user_id.clone(),
                action,
            }),
        }
    }
}

/// Storage handle, caller identity, selected hotel and settings.
#[derive(Debug, Clone)]
pub struct LedgerContext {
    /// Database connection for all reads and writes
    pub db: DatabaseConnection,
    /// Who is performing the operation
    pub actor: Actor,
    /// Tenant the operation is scoped to
    pub hotel_id: i64,
    /// Ledger tunables
    pub settings: LedgerSettings,
}

impl LedgerContext {
    /// Creates a new context.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        actor: Actor,
        hotel_id: i64,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            db,
            actor,
            hotel_id,
            settings,
        }
    }

    /// Same storage, hotel and settings, acting as someone else.
    #[must_use]
    pub fn with_actor(&self, actor: Actor) -> Self {
        Self {
            db: self.db.clone(),
            actor,
            hotel_id: self.hotel_id,
            settings: self.settings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        assert!(Actor::admin("ops").require_admin("start a period").is_ok());

        let err = Actor::member("desk-1")
            .require_admin("start a period")
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { ref user_id, .. } if user_id == "desk-1"));
        assert_eq!(
            err.to_string(),
            "User 'desk-1' is not permitted to start a period"
        );
    }
}
