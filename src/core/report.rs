//! Report generation business logic.
//!
//! This module builds the printable debt/period report of a partner and the
//! dashboard summaries shown to admins and members. All functions return
//! structured data; the `format_*` helpers turn it into plain text.

use crate::{
    core::{
        client::{available_balance, list_clients_for_partner},
        context::LedgerContext,
        partner::find_partner,
        transaction::{list_transactions_for_partner, list_transactions_recorded_by},
    },
    entities::{Client, Partner, PartnerStatus, Transaction, TransactionStatus, client, partner, transaction},
    errors::Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::*;
use std::fmt::Write;

/// One client's line in a [`DebtReport`].
#[derive(Debug, Clone)]
pub struct ClientLedgerLine {
    /// The client being reported on
    pub client: client::Model,
    /// `period_allowance - utilized_amount`
    pub available: Decimal,
    /// Utilization as a percentage of the allowance
    pub utilization_percent: Decimal,
    /// Transactions recorded in the current period
    pub transactions_count: usize,
    /// Flagged transactions in the current period
    pub flagged_count: usize,
}

/// Debt and utilization of every client of a partner for the current period.
#[derive(Debug, Clone)]
pub struct DebtReport {
    /// Partner reported on
    pub partner: partner::Model,
    /// Start of the period covered, `None` if no period was ever started
    pub period_started_at: Option<DateTime<Utc>>,
    /// One line per client, alphabetical
    pub lines: Vec<ClientLedgerLine>,
    /// Sum of allowances
    pub total_allowance: Decimal,
    /// Sum of utilized amounts
    pub total_utilized: Decimal,
    /// Sum of outstanding debt
    pub total_debt: Decimal,
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl DebtReport {
    /// Lines of clients that currently owe money.
    pub fn debtors(&self) -> impl Iterator<Item = &ClientLedgerLine> {
        self.lines.iter().filter(|l| l.client.debt > Decimal::ZERO)
    }
}

/// Builds the debt report of a partner. Admin only.
///
/// # Arguments
/// * `partner_id` - The partner to report on
pub async fn generate_debt_report(ctx: &LedgerContext, partner_id: i64) -> Result<DebtReport> {
    ctx.actor.require_admin("view debt reports")?;

    let partner = find_partner(&ctx.db, ctx.hotel_id, partner_id).await?;
    let clients = list_clients_for_partner(ctx, partner_id).await?;
    let period_started_at = partner.last_period_started_at;

    let in_period: Vec<transaction::Model> = list_transactions_for_partner(ctx, partner_id)
        .await?
        .into_iter()
        .filter(|t| period_started_at.is_some_and(|start| t.created_at >= start))
        .collect();

    let lines: Vec<ClientLedgerLine> = clients
        .into_iter()
        .map(|c| {
            let own = in_period.iter().filter(|t| t.client_id == c.id);
            let transactions_count = own.clone().count();
            let flagged_count = own.filter(|t| t.status == TransactionStatus::Flagged).count();
            ClientLedgerLine {
                available: available_balance(&c),
                utilization_percent: calculate_utilization(c.utilized_amount.0, c.period_allowance.0),
                transactions_count,
                flagged_count,
                client: c,
            }
        })
        .collect();

    Ok(DebtReport {
        total_allowance: lines.iter().map(|l| l.client.period_allowance.0).sum(),
        total_utilized: lines.iter().map(|l| l.client.utilized_amount.0).sum(),
        total_debt: lines.iter().map(|l| l.client.debt.0).sum(),
        partner,
        period_started_at,
        lines,
        generated_at: Utc::now(),
    })
}

/// Utilization as a percentage of the allowance, rounded to one decimal.
///
/// A zero allowance reports 0% when nothing was spent and 100% otherwise.
#[must_use]
pub fn calculate_utilization(utilized: Decimal, allowance: Decimal) -> Decimal {
    if allowance <= Decimal::ZERO {
        return if utilized > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    (utilized / allowance * Decimal::ONE_HUNDRED).round_dp(1)
}

/// Formats an amount with its currency code and two decimals.
#[must_use]
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    format!("{currency} {amount:.2}")
}

/// Renders a [`DebtReport`] as printable text.
#[must_use]
pub fn format_debt_report(report: &DebtReport, currency: &str) -> String {
    let period = report.period_started_at.map_or_else(
        || "no active period".to_string(),
        |start| format!("period since {}", start.format("%Y-%m-%d")),
    );

    let mut out = format!(
        "Debt report - {} ({period})\nGenerated {}\n\n",
        report.partner.name,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    // write! is infallible when writing to String
    let _ = writeln!(
        out,
        "{:<24} {:>14} {:>14} {:>14} {:>14} {:>6}",
        "Client", "Allowance", "Utilized", "Available", "Debt", "Txns"
    );
    for line in &report.lines {
        let flag = if line.flagged_count > 0 { " !" } else { "" };
        let _ = writeln!(
            out,
            "{:<24} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>6}{flag}",
            line.client.name,
            line.client.period_allowance,
            line.client.utilized_amount,
            line.available,
            line.client.debt,
            line.transactions_count
        );
    }

    let _ = write!(
        out,
        "\nTotal allowance: {}\nTotal utilized: {}\nOutstanding debt: {}",
        format_amount(report.total_allowance, currency),
        format_amount(report.total_utilized, currency),
        format_amount(report.total_debt, currency)
    );
    let debtors = report.debtors().count();
    if debtors > 0 {
        let _ = write!(out, " ({debtors} clients)");
    }
    out.push('\n');

    out
}

/// Hotel-wide figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminDashboard {
    /// All partners
    pub partners: u64,
    /// Partners currently active
    pub active_partners: u64,
    /// All clients
    pub clients: u64,
    /// Clients with outstanding debt
    pub clients_in_debt: usize,
    /// All recorded transactions
    pub transactions: u64,
    /// Flagged transactions
    pub flagged_transactions: u64,
    /// Sum of allowances
    pub total_allowance: Decimal,
    /// Sum of utilized amounts
    pub total_utilized: Decimal,
    /// Sum of outstanding debt
    pub total_debt: Decimal,
}

/// Builds the admin dashboard for the context's hotel. Admin only.
pub async fn admin_dashboard(ctx: &LedgerContext) -> Result<AdminDashboard> {
    ctx.actor.require_admin("view the admin dashboard")?;

    let partners = Partner::find()
        .filter(partner::Column::HotelId.eq(ctx.hotel_id))
        .count(&ctx.db)
        .await?;
    let active_partners = Partner::find()
        .filter(partner::Column::HotelId.eq(ctx.hotel_id))
        .filter(partner::Column::Status.eq(PartnerStatus::Active))
        .count(&ctx.db)
        .await?;
    let transactions = Transaction::find()
        .filter(transaction::Column::HotelId.eq(ctx.hotel_id))
        .count(&ctx.db)
        .await?;
    let flagged_transactions = Transaction::find()
        .filter(transaction::Column::HotelId.eq(ctx.hotel_id))
        .filter(transaction::Column::Status.eq(TransactionStatus::Flagged))
        .count(&ctx.db)
        .await?;

    let clients = Client::find()
        .filter(client::Column::HotelId.eq(ctx.hotel_id))
        .all(&ctx.db)
        .await?;

    Ok(AdminDashboard {
        partners,
        active_partners,
        clients: u64::try_from(clients.len()).unwrap_or(u64::MAX),
        clients_in_debt: clients.iter().filter(|c| c.debt > Decimal::ZERO).count(),
        transactions,
        flagged_transactions,
        total_allowance: clients.iter().map(|c| c.period_allowance.0).sum(),
        total_utilized: clients.iter().map(|c| c.utilized_amount.0).sum(),
        total_debt: clients.iter().map(|c| c.debt.0).sum(),
    })
}

/// What a member sees: their own recent work.
#[derive(Debug, Clone)]
pub struct MemberDashboard {
    /// Most recent transactions recorded by the member
    pub recent_transactions: Vec<transaction::Model>,
    /// Transactions the member recorded today (UTC)
    pub today_count: usize,
    /// Amount the member billed today (UTC)
    pub today_total: Decimal,
}

/// Builds the dashboard of the acting user. Available to every role.
pub async fn member_dashboard(ctx: &LedgerContext, recent_limit: u64) -> Result<MemberDashboard> {
    let today = Utc::now().date_naive();

    let todays: Vec<transaction::Model> = Transaction::find()
        .filter(transaction::Column::HotelId.eq(ctx.hotel_id))
        .filter(transaction::Column::RecordedBy.eq(ctx.actor.user_id.as_str()))
        .all(&ctx.db)
        .await?
        .into_iter()
        .filter(|t| t.created_at.date_naive() == today)
        .collect();

    Ok(MemberDashboard {
        recent_transactions: list_transactions_recorded_by(ctx, &ctx.actor.user_id, recent_limit)
            .await?,
        today_count: todays.len(),
        today_total: todays.iter().map(|t| t.amount.0).sum(),
    })
}
