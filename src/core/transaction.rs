//! Transaction business logic - Billing, reversing and flagging client charges.
//!
//! Recording a transaction and updating the client's balances happen in one
//! database transaction: the balances are written with a compare-and-swap on the
//! client's version and the transaction row is inserted next to it, so both
//! succeed or neither does. A lost race rolls back and retries up to
//! `max_retries` times before surfacing [`Error::Conflict`].

use crate::{
    core::{
        allowance::{assess_transaction, reverse_transaction, validate_amount},
        client::{balances, find_client, write_balances},
        context::LedgerContext,
        partner::find_partner,
    },
    entities::{Client, Money, Partner, PartnerStatus, Transaction, TransactionStatus, transaction},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// A charge to bill against a client's allowance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Client being billed
    pub client_id: i64,
    /// Amount to bill, must be positive
    pub amount: Decimal,
    /// Receipt number printed on the bill
    pub receipt_no: String,
    /// Caller confirmed an overdraft (only consulted by the capped policy)
    pub allow_overage: bool,
}

impl NewTransaction {
    /// A charge without overdraft confirmation.
    pub fn new(client_id: i64, amount: Decimal, receipt_no: impl Into<String>) -> Self {
        Self {
            client_id,
            amount,
            receipt_no: receipt_no.into(),
            allow_overage: false,
        }
    }

    /// Marks the overdraft as confirmed by the caller.
    #[must_use]
    pub const fn confirm_overage(mut self) -> Self {
        self.allow_overage = true;
        self
    }
}

/// Bills a client and returns the recorded transaction.
///
/// The status is `flagged` when the flag policy accepted an overdraft, otherwise
/// `completed`. Any role may record transactions.
///
/// # Arguments
/// * `ctx` - Hotel, acting user and ledger settings
/// * `request` - Client, amount, receipt number and overage confirmation
///
/// # Errors
/// - [`Error::InvalidAmount`] / [`Error::Validation`] for a non-positive amount or
///   a missing receipt number
/// - [`Error::ClientNotFound`] / [`Error::PartnerNotFound`]
/// - [`Error::PartnerInactive`] / [`Error::NoActivePeriod`] when the partner cannot
///   be billed
/// - [`Error::OutstandingDebt`] while the client still owes money
/// - [`Error::OverageNotConfirmed`] / [`Error::OverageCeilingExceeded`] under the
///   capped policy
/// - [`Error::Conflict`] when concurrent writers exhausted the retries
#[instrument(skip(ctx), fields(hotel_id = ctx.hotel_id, by = %ctx.actor.user_id))]
pub async fn record_transaction(
    ctx: &LedgerContext,
    request: NewTransaction,
) -> Result<transaction::Model> {
    validate_amount(request.amount)?;
    if request.receipt_no.trim().is_empty() {
        return Err(Error::validation("Receipt number is required"));
    }

    let attempts = ctx.settings.max_retries;
    for attempt in 1..=attempts {
        if let Some(recorded) = try_record_transaction(ctx, &request).await? {
            info!(
                transaction_id = recorded.id,
                client_id = recorded.client_id,
                amount = %recorded.amount,
                status = recorded.status.as_str(),
                "Transaction recorded"
            );
            return Ok(recorded);
        }
        warn!(client_id = request.client_id, attempt, "Client balance changed concurrently, retrying");
    }
    Err(Error::Conflict { attempts })
}

async fn try_record_transaction(
    ctx: &LedgerContext,
    request: &NewTransaction,
) -> Result<Option<transaction::Model>> {
    let txn = ctx.db.begin().await?;

    let client = find_client(&txn, ctx.hotel_id, request.client_id).await?;
    let partner = find_partner(&txn, ctx.hotel_id, client.partner_id).await?;

    if partner.status == PartnerStatus::Inactive {
        return Err(Error::PartnerInactive {
            partner: partner.name,
        });
    }
    if partner.last_period_started_at.is_none() {
        return Err(Error::NoActivePeriod {
            partner: partner.name,
        });
    }
    if client.debt > Decimal::ZERO {
        return Err(Error::OutstandingDebt {
            client: client.name,
            debt: client.debt.0,
        });
    }

    let assessment = assess_transaction(
        ctx.settings.overage_policy,
        ctx.settings.overage_ceiling,
        &balances(&client),
        request.amount,
        request.allow_overage,
    )?;

    if !write_balances(&txn, &client, &assessment.balances).await? {
        txn.rollback().await?;
        return Ok(None);
    }

    if assessment.overage > Decimal::ZERO {
        debug!(client_id = client.id, overage = %assessment.overage, "Transaction exceeds available balance");
    }

    let recorded = transaction::ActiveModel {
        hotel_id: Set(ctx.hotel_id),
        client_id: Set(client.id),
        client_name: Set(client.name),
        partner_id: Set(partner.id),
        partner_name: Set(partner.name),
        amount: Set(Money(request.amount)),
        receipt_no: Set(request.receipt_no.trim().to_string()),
        status: Set(assessment.status),
        recorded_by: Set(ctx.actor.user_id.clone()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(Some(recorded))
}

/// Deletes a transaction and reverses its effect on the owning client. Admin only.
///
/// The client's debt drops by the amount (never below zero); utilization is given
/// back too when the transaction belongs to the current period. If the client has
/// been deleted in the meantime, the transaction is removed without touching any
/// balance.
///
/// # Arguments
/// * `transaction_id` - The transaction to remove
#[instrument(skip(ctx), fields(hotel_id = ctx.hotel_id, by = %ctx.actor.user_id))]
pub async fn delete_transaction(ctx: &LedgerContext, transaction_id: i64) -> Result<()> {
    ctx.actor.require_admin("delete transactions")?;

    let attempts = ctx.settings.max_retries;
    for attempt in 1..=attempts {
        if try_delete_transaction(ctx, transaction_id).await? {
            info!(transaction_id, "Transaction deleted");
            return Ok(());
        }
        warn!(transaction_id, attempt, "Client balance changed concurrently, retrying");
    }
    Err(Error::Conflict { attempts })
}

async fn try_delete_transaction(ctx: &LedgerContext, transaction_id: i64) -> Result<bool> {
    let txn = ctx.db.begin().await?;

    let recorded = find_transaction(&txn, ctx.hotel_id, transaction_id).await?;

    let client = Client::find_by_id(recorded.client_id).one(&txn).await?;
    if let Some(client) = client {
        let period_start = Partner::find_by_id(client.partner_id)
            .one(&txn)
            .await?
            .and_then(|p| p.last_period_started_at);
        let in_current_period = period_start.is_some_and(|start| recorded.created_at >= start);

        let reversed = reverse_transaction(&balances(&client), recorded.amount.0, in_current_period);
        if !write_balances(&txn, &client, &reversed).await? {
            txn.rollback().await?;
            return Ok(false);
        }
    } else {
        debug!(
            transaction_id,
            client_id = recorded.client_id,
            "Client no longer exists, skipping balance reversal"
        );
    }

    recorded.delete(&txn).await?;
    txn.commit().await?;
    Ok(true)
}

/// Marks a transaction as flagged for review. No balances change.
pub async fn flag_transaction(ctx: &LedgerContext, transaction_id: i64) -> Result<transaction::Model> {
    let recorded = find_transaction(&ctx.db, ctx.hotel_id, transaction_id).await?;

    let mut active: transaction::ActiveModel = recorded.into();
    active.status = Set(TransactionStatus::Flagged);
    let flagged = active.update(&ctx.db).await?;

    info!(transaction_id, by = %ctx.actor.user_id, "Transaction flagged");
    Ok(flagged)
}

async fn find_transaction<C>(db: &C, hotel_id: i64, transaction_id: i64) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::HotelId.eq(hotel_id))
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })
}

/// Finds a transaction of the context's hotel by ID.
pub async fn get_transaction(
    ctx: &LedgerContext,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::HotelId.eq(ctx.hotel_id))
        .one(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Transactions billed to a client, newest first.
pub async fn list_transactions_for_client(
    ctx: &LedgerContext,
    client_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::HotelId.eq(ctx.hotel_id))
        .filter(transaction::Column::ClientId.eq(client_id))
        .order_by_desc(transaction::Column::Id)
        .all(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Transactions billed to any client of a partner, newest first.
pub async fn list_transactions_for_partner(
    ctx: &LedgerContext,
    partner_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::HotelId.eq(ctx.hotel_id))
        .filter(transaction::Column::PartnerId.eq(partner_id))
        .order_by_desc(transaction::Column::Id)
        .all(&ctx.db)
        .await
        .map_err(Into::into)
}

/// The most recent transactions recorded by a user.
pub async fn list_transactions_recorded_by(
    ctx: &LedgerContext,
    user_id: &str,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::HotelId.eq(ctx.hotel_id))
        .filter(transaction::Column::RecordedBy.eq(user_id))
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(&ctx.db)
        .await
        .map_err(Into::into)
}
