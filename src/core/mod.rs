//! Core business logic - framework-agnostic ledger operations.
//!
//! Every operation takes a [`context::LedgerContext`] naming the storage handle,
//! the acting user and the selected hotel. Pure balance arithmetic lives in
//! [`allowance`] and is shared by the transaction and period modules.

/// Allowance, overage and rollover arithmetic
pub mod allowance;
/// Client management and optimistic balance writes
pub mod client;
/// Acting user, roles and per-hotel execution context
pub mod context;
/// Hotel (tenant) management
pub mod hotel;
/// Partner management and seeding
pub mod partner;
/// Billing period rollover and history
pub mod period;
/// Debt reports and dashboards
pub mod report;
/// CSV export and external summaries
pub mod summary;
/// Recording, correcting and listing transactions
pub mod transaction;
