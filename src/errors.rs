//! Unified error type for the ledger.
//!
//! Every variant carries enough context to be shown to an administrator as-is.
//! [`Error::kind`] groups the variants into the categories callers branch on.

use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input, or a ledger rule refusing the request
    Validation,
    /// Partner employee cap reached or would be undercut
    Capacity,
    /// A referenced hotel, partner, client or transaction does not exist
    NotFound,
    /// Optimistic update retries were exhausted
    Conflict,
    /// The acting user lacks the required role
    Forbidden,
    /// Storage, configuration or collaborator failure
    Internal,
}

/// All errors produced by the ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Input failed validation
    #[error("Validation failed: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Amount is zero, negative or otherwise unusable
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Partner already sponsors as many clients as it is allowed to
    #[error("Partner '{partner}' has reached its limit of {limit} sponsored employees")]
    CapacityReached {
        /// Partner name
        partner: String,
        /// Sponsored employees cap
        limit: i32,
    },

    /// Capacity change would drop below the number of existing clients
    #[error(
        "Cannot set sponsored employees for '{partner}' to {requested}: {existing} clients are already assigned"
    )]
    CapacityBelowAllocated {
        /// Partner name
        partner: String,
        /// Requested cap
        requested: i32,
        /// Clients currently assigned
        existing: u64,
    },

    /// Hotel lookup failed
    #[error("Hotel not found: {id}")]
    HotelNotFound {
        /// Hotel id
        id: i64,
    },

    /// Partner lookup failed
    #[error("Partner not found: {id}")]
    PartnerNotFound {
        /// Partner id
        id: i64,
    },

    /// Client lookup failed
    #[error("Client not found: {id}")]
    ClientNotFound {
        /// Client id
        id: i64,
    },

    /// Transaction lookup failed
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// Transaction id
        id: i64,
    },

    /// Partner has never started a billing period
    #[error("Partner '{partner}' has no active billing period")]
    NoActivePeriod {
        /// Partner name
        partner: String,
    },

    /// Partner is inactive
    #[error("Partner '{partner}' is inactive")]
    PartnerInactive {
        /// Partner name
        partner: String,
    },

    /// Client carries debt from an earlier overdraft
    #[error("Client '{client}' has an outstanding debt of {debt}")]
    OutstandingDebt {
        /// Client name
        client: String,
        /// Outstanding debt
        debt: Decimal,
    },

    /// Overdraft needs explicit confirmation from the caller
    #[error("Amount {amount} exceeds the available balance of {available}; confirm the overage to proceed")]
    OverageNotConfirmed {
        /// Requested amount
        amount: Decimal,
        /// Balance available before the transaction
        available: Decimal,
    },

    /// Overdraft is larger than the configured ceiling
    #[error("Overage of {overage} exceeds the allowed ceiling of {ceiling}")]
    OverageCeilingExceeded {
        /// Amount not covered by the available balance
        overage: Decimal,
        /// Configured ceiling
        ceiling: Decimal,
    },

    /// Concurrent writers kept winning the compare-and-swap
    #[error("The record was modified concurrently ({attempts} attempts), please try again")]
    Conflict {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Acting user may not perform the action
    #[error("User '{user_id}' is not permitted to {action}")]
    Forbidden {
        /// Acting user
        user_id: String,
        /// Human-readable action name
        action: &'static str,
    },

    /// The summary collaborator failed
    #[error("Summary service error: {message}")]
    Summary {
        /// Collaborator error message
        message: String,
    },

    /// CSV encoding failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds a [`Error::Validation`] from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::InvalidAmount { .. }
            | Self::NoActivePeriod { .. }
            | Self::PartnerInactive { .. }
            | Self::OutstandingDebt { .. }
            | Self::OverageNotConfirmed { .. }
            | Self::OverageCeilingExceeded { .. } => ErrorKind::Validation,
            Self::CapacityReached { .. } | Self::CapacityBelowAllocated { .. } => {
                ErrorKind::Capacity
            }
            Self::HotelNotFound { .. }
            | Self::PartnerNotFound { .. }
            | Self::ClientNotFound { .. }
            | Self::TransactionNotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Summary { .. }
            | Self::Csv(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_capacity_errors() {
        let reached = Error::CapacityReached {
            partner: "Acme".to_string(),
            limit: 2,
        };
        let below = Error::CapacityBelowAllocated {
            partner: "Acme".to_string(),
            requested: 1,
            existing: 2,
        };
        assert_eq!(reached.kind(), ErrorKind::Capacity);
        assert_eq!(below.kind(), ErrorKind::Capacity);
    }

    #[test]
    fn test_messages_name_the_conflict() {
        let err = Error::CapacityBelowAllocated {
            partner: "Acme".to_string(),
            requested: 1,
            existing: 3,
        };
        let message = err.to_string();
        assert!(message.contains("Acme"));
        assert!(message.contains('1'));
        assert!(message.contains('3'));

        let err = Error::Conflict { attempts: 5 };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("try again"));
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err: Error = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
