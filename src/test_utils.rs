//! Shared test utilities for the ledger.
//!
//! Every helper works against an in-memory `SQLite` database with the full schema,
//! so tests exercise the same queries as production.

use crate::{
    config::settings::LedgerSettings,
    core::{
        client::add_client,
        context::{Actor, LedgerContext},
        hotel::create_hotel,
        partner::{PartnerTerms, create_partner},
        period::start_new_period,
        transaction::{NewTransaction, record_transaction},
    },
    entities::{client, partner, transaction},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

static RECEIPTS: AtomicU64 = AtomicU64::new(1);

/// Routes `tracing` output to the test harness. Safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A context with default settings.
pub fn context_for(db: DatabaseConnection, actor: Actor, hotel_id: i64) -> LedgerContext {
    LedgerContext::new(db, actor, hotel_id, LedgerSettings::default())
}

/// Fresh database with one hotel ("Test Hotel"), acting as admin `ops`.
pub async fn setup_admin_context() -> Result<LedgerContext> {
    init_test_tracing();
    let db = setup_test_db().await?;
    let actor = Actor::admin("ops");
    let hotel = create_hotel(&db, &actor, "Test Hotel").await?;
    Ok(context_for(db, actor, hotel.id))
}

/// Same as [`setup_admin_context`] but acting as member `desk`.
pub async fn setup_member_context() -> Result<LedgerContext> {
    let ctx = setup_admin_context().await?;
    Ok(ctx.with_actor(Actor::member("desk")))
}

/// Creates an active partner without an open period.
pub async fn create_test_partner(
    ctx: &LedgerContext,
    name: &str,
    sponsored_employees_count: i32,
    total_shared_amount: Decimal,
) -> Result<partner::Model> {
    create_partner(
        ctx,
        PartnerTerms::new(name, sponsored_employees_count, total_shared_amount),
    )
    .await
}

/// Adds a client to a partner.
pub async fn create_test_client(
    ctx: &LedgerContext,
    partner_id: i64,
    name: &str,
) -> Result<client::Model> {
    add_client(ctx, partner_id, name).await
}

/// Partner "Acme" with client "Alice", with its first period already started.
/// Returns both as stored after the period start.
pub async fn setup_started_partner_with_client(
    ctx: &LedgerContext,
    sponsored_employees_count: i32,
    total_shared_amount: Decimal,
) -> Result<(partner::Model, client::Model)> {
    let partner = create_test_partner(ctx, "Acme", sponsored_employees_count, total_shared_amount).await?;
    create_test_client(ctx, partner.id, "Alice").await?;

    let mut rollover = start_new_period(ctx, partner.id).await?;
    let alice = rollover.clients.remove(0);
    let client = crate::core::client::get_client(ctx, alice.client_id)
        .await?
        .ok_or(crate::errors::Error::ClientNotFound { id: alice.client_id })?;
    Ok((rollover.partner, client))
}

/// Records a transaction with a generated receipt number and no overage confirmation.
pub async fn record_test_transaction(
    ctx: &LedgerContext,
    client_id: i64,
    amount: Decimal,
) -> Result<transaction::Model> {
    let receipt = format!("R-{}", RECEIPTS.fetch_add(1, Ordering::Relaxed));
    record_transaction(ctx, NewTransaction::new(client_id, amount, receipt)).await
}
