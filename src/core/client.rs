//! Client business logic - Sponsored employees and their balances.
//!
//! Balance writes go through [`write_balances`], a compare-and-swap on the
//! client's `version` column. Callers run it inside a database transaction and
//! retry the whole read-modify-write when it reports a lost race.

use crate::{
    core::{
        allowance::{Balances, allowance_per_client},
        context::LedgerContext,
        partner::find_partner,
    },
    entities::{Client, Money, PartnerStatus, client},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Current balances of a client.
#[must_use]
pub const fn balances(client: &client::Model) -> Balances {
    Balances {
        period_allowance: client.period_allowance.0,
        utilized_amount: client.utilized_amount.0,
        debt: client.debt.0,
    }
}

/// `period_allowance - utilized_amount` for a client.
#[must_use]
pub fn available_balance(client: &client::Model) -> Decimal {
    balances(client).available()
}

/// Number of clients currently assigned to a partner.
pub async fn count_clients_for_partner<C>(db: &C, partner_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Client::find()
        .filter(client::Column::PartnerId.eq(partner_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Loads a client of `hotel_id`, failing with [`Error::ClientNotFound`] when it is
/// missing or belongs to another hotel.
pub(crate) async fn find_client<C>(db: &C, hotel_id: i64, client_id: i64) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .filter(client::Column::HotelId.eq(hotel_id))
        .one(db)
        .await?
        .ok_or(Error::ClientNotFound { id: client_id })
}

/// Writes `next` over the balances of `current` if nobody changed the client since
/// it was read. Returns `false` when the stored version moved on.
pub(crate) async fn write_balances<C>(db: &C, current: &client::Model, next: &Balances) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Client::update_many()
        .col_expr(client::Column::PeriodAllowance, Expr::value(Money(next.period_allowance)))
        .col_expr(client::Column::UtilizedAmount, Expr::value(Money(next.utilized_amount)))
        .col_expr(client::Column::Debt, Expr::value(Money(next.debt)))
        .col_expr(client::Column::Version, Expr::value(current.version + 1))
        .filter(client::Column::Id.eq(current.id))
        .filter(client::Column::Version.eq(current.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        debug!(client_id = current.id, version = current.version, "Stale client version");
        return Ok(false);
    }
    Ok(true)
}

/// Adds a client under a partner with open capacity. Admin only.
///
/// The client starts with `period_allowance = total / count`, nothing utilized and
/// no debt.
///
/// # Arguments
/// * `partner_id` - The sponsoring partner
/// * `name` - Client name, trimmed before storing
///
/// # Errors
/// - [`Error::CapacityReached`] when the partner already sponsors
///   `sponsored_employees_count` clients
/// - [`Error::PartnerNotFound`] / [`Error::PartnerInactive`]
/// - [`Error::Validation`] for an empty name
#[instrument(skip(ctx), fields(hotel_id = ctx.hotel_id))]
pub async fn add_client(ctx: &LedgerContext, partner_id: i64, name: &str) -> Result<client::Model> {
    ctx.actor.require_admin("add clients")?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Client name cannot be empty"));
    }

    let txn = ctx.db.begin().await?;

    let partner = find_partner(&txn, ctx.hotel_id, partner_id).await?;
    if partner.status == PartnerStatus::Inactive {
        return Err(Error::PartnerInactive {
            partner: partner.name,
        });
    }

    let existing = count_clients_for_partner(&txn, partner_id).await?;
    let limit = u64::try_from(partner.sponsored_employees_count).unwrap_or(0);
    if existing >= limit {
        return Err(Error::CapacityReached {
            partner: partner.name,
            limit: partner.sponsored_employees_count,
        });
    }

    let client = client::ActiveModel {
        hotel_id: Set(ctx.hotel_id),
        partner_id: Set(partner.id),
        partner_name: Set(partner.name.clone()),
        name: Set(name.to_string()),
        period_allowance: Set(Money(allowance_per_client(
            partner.total_shared_amount.0,
            partner.sponsored_employees_count,
        ))),
        utilized_amount: Set(Money::ZERO),
        debt: Set(Money::ZERO),
        version: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        client_id = client.id,
        partner_id,
        allowance = %client.period_allowance,
        "Client added"
    );
    Ok(client)
}

/// Finds a client of the context's hotel by ID.
pub async fn get_client(ctx: &LedgerContext, client_id: i64) -> Result<Option<client::Model>> {
    Client::find_by_id(client_id)
        .filter(client::Column::HotelId.eq(ctx.hotel_id))
        .one(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Lists the clients of a partner alphabetically.
pub async fn list_clients_for_partner(
    ctx: &LedgerContext,
    partner_id: i64,
) -> Result<Vec<client::Model>> {
    Client::find()
        .filter(client::Column::HotelId.eq(ctx.hotel_id))
        .filter(client::Column::PartnerId.eq(partner_id))
        .order_by_asc(client::Column::Name)
        .all(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Lists every client of the context's hotel.
pub async fn list_clients(ctx: &LedgerContext) -> Result<Vec<client::Model>> {
    Client::find()
        .filter(client::Column::HotelId.eq(ctx.hotel_id))
        .order_by_asc(client::Column::PartnerName)
        .order_by_asc(client::Column::Name)
        .all(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Removes a client. Admin only.
///
/// The client's transactions are kept as they are; deleting one of them later
/// simply skips the balance reversal.
pub async fn delete_client(ctx: &LedgerContext, client_id: i64) -> Result<()> {
    ctx.actor.require_admin("delete clients")?;

    let client = find_client(&ctx.db, ctx.hotel_id, client_id).await?;
    let outstanding = client.debt;
    client.delete(&ctx.db).await?;

    info!(client_id, %outstanding, "Client deleted");
    Ok(())
}
