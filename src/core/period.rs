//! Billing period business logic
//!
//! Starting a new period closes the current one for a partner:
//!
//! 1. A [`period_history`] row snapshots the terms that applied to the closed period
//! 2. Every client is rolled over with [`roll_over`]: outstanding debt is paid out of
//!    the fresh allowance first, any remainder is carried forward as debt, and
//!    utilization resets to zero
//! 3. The partner's `last_period_started_at` moves to now
//!
//! All of it happens in one database transaction.

use crate::{
    core::{
        allowance::{allowance_per_client, roll_over},
        client::write_balances,
        context::LedgerContext,
        partner::find_partner,
    },
    entities::{Client, Partner, PartnerStatus, PeriodHistory, client, partner, period_history},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};

/// Balances of one client before and after a rollover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRollover {
    /// Client that was rolled over
    pub client_id: i64,
    /// Client name
    pub client_name: String,
    /// Debt carried into the rollover
    pub previous_debt: Decimal,
    /// Utilization of the closed period
    pub previous_utilized: Decimal,
    /// Allowance before deducting debt
    pub new_allowance: Decimal,
    /// Allowance after deducting debt
    pub period_allowance: Decimal,
    /// Debt carried into the new period
    pub debt: Decimal,
}

/// Result of [`start_new_period`].
#[derive(Debug, Clone)]
pub struct PeriodRollover {
    /// Partner with its new `last_period_started_at`
    pub partner: partner::Model,
    /// History row recorded for the closed period
    pub history: period_history::Model,
    /// Per-client outcome
    pub clients: Vec<ClientRollover>,
}

/// Closes the current billing period of a partner and opens a new one. Admin only.
///
/// # Arguments
/// * `partner_id` - The partner whose clients are rolled over
///
/// # Errors
/// - [`Error::PartnerNotFound`] / [`Error::PartnerInactive`]
/// - [`Error::Conflict`] when client balances kept changing underneath the rollover
#[instrument(skip(ctx), fields(hotel_id = ctx.hotel_id, by = %ctx.actor.user_id))]
pub async fn start_new_period(ctx: &LedgerContext, partner_id: i64) -> Result<PeriodRollover> {
    ctx.actor.require_admin("start a new period")?;

    let attempts = ctx.settings.max_retries;
    for attempt in 1..=attempts {
        if let Some(rollover) = try_start_new_period(ctx, partner_id).await? {
            info!(
                partner_id,
                clients = rollover.clients.len(),
                carried_debt = %rollover.clients.iter().map(|c| c.debt).sum::<Decimal>(),
                "New billing period started"
            );
            return Ok(rollover);
        }
        warn!(partner_id, attempt, "Client balances changed during rollover, retrying");
    }
    Err(Error::Conflict { attempts })
}

async fn try_start_new_period(ctx: &LedgerContext, partner_id: i64) -> Result<Option<PeriodRollover>> {
    let txn = ctx.db.begin().await?;

    let partner = find_partner(&txn, ctx.hotel_id, partner_id).await?;
    if partner.status == PartnerStatus::Inactive {
        return Err(Error::PartnerInactive {
            partner: partner.name,
        });
    }

    let now = Utc::now();
    let new_allowance =
        allowance_per_client(partner.total_shared_amount.0, partner.sponsored_employees_count);

    let clients = Client::find()
        .filter(client::Column::PartnerId.eq(partner_id))
        .order_by_asc(client::Column::Id)
        .all(&txn)
        .await?;

    let history = period_history::ActiveModel {
        partner_id: Set(partner.id),
        start_date: Set(partner.last_period_started_at.unwrap_or(partner.created_at)),
        end_date: Set(now),
        sponsored_employees_count: Set(partner.sponsored_employees_count),
        total_shared_amount: Set(partner.total_shared_amount),
        clients_count: Set(i64::try_from(clients.len()).unwrap_or(i64::MAX)),
        closed_by: Set(ctx.actor.user_id.clone()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut outcomes = Vec::with_capacity(clients.len());
    for current in clients {
        let next = roll_over(current.debt.0, new_allowance);
        if !write_balances(&txn, &current, &next).await? {
            txn.rollback().await?;
            return Ok(None);
        }
        outcomes.push(ClientRollover {
            client_id: current.id,
            client_name: current.name,
            previous_debt: current.debt.0,
            previous_utilized: current.utilized_amount.0,
            new_allowance,
            period_allowance: next.period_allowance,
            debt: next.debt,
        });
    }

    let mut active: partner::ActiveModel = partner.into();
    active.last_period_started_at = Set(Some(now));
    let partner = active.update(&txn).await?;

    txn.commit().await?;

    Ok(Some(PeriodRollover {
        partner,
        history,
        clients: outcomes,
    }))
}

/// Closed periods of a partner, most recent first.
pub async fn list_period_history(
    ctx: &LedgerContext,
    partner_id: i64,
) -> Result<Vec<period_history::Model>> {
    // Scope check: the partner must belong to the context's hotel
    find_partner(&ctx.db, ctx.hotel_id, partner_id).await?;

    PeriodHistory::find()
        .filter(period_history::Column::PartnerId.eq(partner_id))
        .order_by_desc(period_history::Column::Id)
        .all(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Partners of the context's hotel whose period started before `cutoff` (or never
/// started), i.e. candidates for a rollover.
pub async fn partners_due_for_rollover(
    ctx: &LedgerContext,
    cutoff: chrono::DateTime<Utc>,
) -> Result<Vec<partner::Model>> {
    let partners = Partner::find()
        .filter(partner::Column::HotelId.eq(ctx.hotel_id))
        .filter(partner::Column::Status.eq(PartnerStatus::Active))
        .order_by_asc(partner::Column::Name)
        .all(&ctx.db)
        .await?;

    Ok(partners
        .into_iter()
        .filter(|p| p.last_period_started_at.is_none_or(|start| start < cutoff))
        .collect())
}

/// Formats a rollover into a human-readable summary, one line per client.
#[must_use]
pub fn format_rollover_summary(rollover: &PeriodRollover, currency: &str) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "New period for {} - {} clients\n",
        rollover.partner.name,
        rollover.clients.len()
    );

    for c in &rollover.clients {
        // write! is infallible when writing to String
        let _ = writeln!(
            summary,
            "  {} | debt {currency} {:.2} -> allowance {currency} {:.2}, debt {currency} {:.2}",
            c.client_name, c.previous_debt, c.period_allowance, c.debt
        );
    }

    summary
}
