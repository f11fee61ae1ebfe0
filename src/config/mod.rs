/// Database configuration and connection management
pub mod database;

/// Partner seed configuration loading from partners.toml
pub mod partners;

/// Ledger settings from environment variables
pub mod settings;
