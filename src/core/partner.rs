//! Partner business logic - Creating partners and changing their sponsorship terms.
//!
//! Changing terms fans out to every client of the partner: their period allowance
//! is recomputed and their denormalized `partner_name` rewritten, all inside the
//! same database transaction as the partner update.

use crate::{
    config::partners::PartnerConfig,
    core::{allowance::allowance_per_client, client::count_clients_for_partner, context::LedgerContext},
    entities::{Client, Money, Partner, PartnerStatus, PeriodHistory, client, partner, period_history},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Name, capacity and budget of a partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerTerms {
    /// Company name
    pub name: String,
    /// Maximum number of sponsored clients
    pub sponsored_employees_count: i32,
    /// Budget split among the sponsored clients each period
    pub total_shared_amount: Decimal,
}

impl PartnerTerms {
    /// Bundles the three terms.
    pub fn new(
        name: impl Into<String>,
        sponsored_employees_count: i32,
        total_shared_amount: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            sponsored_employees_count,
            total_shared_amount,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Partner name cannot be empty"));
        }
        if self.sponsored_employees_count < 1 {
            return Err(Error::validation(format!(
                "Sponsored employees must be at least 1, got {}",
                self.sponsored_employees_count
            )));
        }
        if self.total_shared_amount.is_sign_negative() {
            return Err(Error::InvalidAmount {
                amount: self.total_shared_amount,
            });
        }
        Ok(())
    }
}

/// Loads a partner of `hotel_id`, failing with [`Error::PartnerNotFound`] when it is
/// missing or belongs to another hotel.
pub(crate) async fn find_partner<C>(db: &C, hotel_id: i64, partner_id: i64) -> Result<partner::Model>
where
    C: ConnectionTrait,
{
    Partner::find_by_id(partner_id)
        .filter(partner::Column::HotelId.eq(hotel_id))
        .one(db)
        .await?
        .ok_or(Error::PartnerNotFound { id: partner_id })
}

/// Creates a partner in the context's hotel. Admin only.
///
/// The partner starts active and without a billing period; clients can be added
/// right away but cannot transact until [`start_new_period`](super::period::start_new_period)
/// is called.
///
/// # Arguments
/// * `terms` - Name, sponsored employee count and total shared amount
#[instrument(skip(ctx), fields(hotel_id = ctx.hotel_id))]
pub async fn create_partner(ctx: &LedgerContext, terms: PartnerTerms) -> Result<partner::Model> {
    ctx.actor.require_admin("create partners")?;
    terms.validate()?;

    let partner = partner::ActiveModel {
        hotel_id: Set(ctx.hotel_id),
        name: Set(terms.name.trim().to_string()),
        sponsored_employees_count: Set(terms.sponsored_employees_count),
        total_shared_amount: Set(Money(terms.total_shared_amount)),
        last_period_started_at: Set(None),
        status: Set(PartnerStatus::Active),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&ctx.db)
    .await?;

    info!(partner_id = partner.id, name = %partner.name, "Partner created");
    Ok(partner)
}

/// Finds a partner of the context's hotel by ID.
pub async fn get_partner(ctx: &LedgerContext, partner_id: i64) -> Result<Option<partner::Model>> {
    Partner::find_by_id(partner_id)
        .filter(partner::Column::HotelId.eq(ctx.hotel_id))
        .one(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Finds a partner of the context's hotel by exact name.
pub async fn get_partner_by_name(ctx: &LedgerContext, name: &str) -> Result<Option<partner::Model>> {
    Partner::find()
        .filter(partner::Column::HotelId.eq(ctx.hotel_id))
        .filter(partner::Column::Name.eq(name.trim()))
        .one(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Lists the partners of the context's hotel, ordered alphabetically by name.
pub async fn list_partners(ctx: &LedgerContext) -> Result<Vec<partner::Model>> {
    Partner::find()
        .filter(partner::Column::HotelId.eq(ctx.hotel_id))
        .order_by_asc(partner::Column::Name)
        .all(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Changes a partner's name, capacity and budget. Admin only.
///
/// Every client of the partner gets `period_allowance = total / count`, rounded to
/// cents, and the new partner name. Utilization and debt are left alone; this does
/// not start a period.
///
/// # Arguments
/// * `partner_id` - The partner to change
/// * `terms` - New name, sponsored employee count and total shared amount
///
/// # Errors
/// - [`Error::CapacityBelowAllocated`] if the new capacity is smaller than the
///   number of clients already assigned
/// - [`Error::Validation`] / [`Error::InvalidAmount`] for malformed terms
#[instrument(skip(ctx), fields(hotel_id = ctx.hotel_id))]
pub async fn update_partner_terms(
    ctx: &LedgerContext,
    partner_id: i64,
    terms: PartnerTerms,
) -> Result<partner::Model> {
    ctx.actor.require_admin("update partner terms")?;

    let txn = ctx.db.begin().await?;

    let partner = find_partner(&txn, ctx.hotel_id, partner_id).await?;
    let existing = count_clients_for_partner(&txn, partner_id).await?;
    let requested = u64::try_from(terms.sponsored_employees_count).unwrap_or(0);
    if requested < existing {
        return Err(Error::CapacityBelowAllocated {
            partner: partner.name,
            requested: terms.sponsored_employees_count,
            existing,
        });
    }
    terms.validate()?;

    let name = terms.name.trim().to_string();
    let new_allowance =
        allowance_per_client(terms.total_shared_amount, terms.sponsored_employees_count);

    let mut active: partner::ActiveModel = partner.into();
    active.name = Set(name.clone());
    active.sponsored_employees_count = Set(terms.sponsored_employees_count);
    active.total_shared_amount = Set(Money(terms.total_shared_amount));
    let updated = active.update(&txn).await?;

    let fan_out = Client::update_many()
        .col_expr(client::Column::PeriodAllowance, Expr::value(Money(new_allowance)))
        .col_expr(client::Column::PartnerName, Expr::value(name))
        .col_expr(client::Column::Version, Expr::col(client::Column::Version).add(1))
        .filter(client::Column::PartnerId.eq(partner_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        partner_id,
        clients_updated = fan_out.rows_affected,
        %new_allowance,
        "Partner terms updated"
    );
    Ok(updated)
}

/// Activates or suspends a partner. Admin only.
///
/// Suspended partners keep their clients and balances but cannot open new periods,
/// accept new clients or record transactions.
pub async fn set_partner_status(
    ctx: &LedgerContext,
    partner_id: i64,
    status: PartnerStatus,
) -> Result<partner::Model> {
    ctx.actor.require_admin("change partner status")?;

    let partner = find_partner(&ctx.db, ctx.hotel_id, partner_id).await?;
    let mut active: partner::ActiveModel = partner.into();
    active.status = Set(status);
    let updated = active.update(&ctx.db).await?;

    info!(partner_id, ?status, "Partner status changed");
    Ok(updated)
}

/// Deletes a partner that no longer sponsors anyone, together with its period
/// history. Admin only. Transactions keep their denormalized partner name.
///
/// # Errors
/// [`Error::Validation`] while clients are still assigned to the partner.
pub async fn delete_partner(ctx: &LedgerContext, partner_id: i64) -> Result<()> {
    ctx.actor.require_admin("delete partners")?;

    let txn = ctx.db.begin().await?;
    let partner = find_partner(&txn, ctx.hotel_id, partner_id).await?;

    let existing = count_clients_for_partner(&txn, partner_id).await?;
    if existing > 0 {
        return Err(Error::validation(format!(
            "Partner '{}' still has {existing} clients; remove them first",
            partner.name
        )));
    }

    PeriodHistory::delete_many()
        .filter(period_history::Column::PartnerId.eq(partner_id))
        .exec(&txn)
        .await?;
    partner.delete(&txn).await?;

    txn.commit().await?;
    info!(partner_id, "Partner deleted");
    Ok(())
}

/// Creates the configured partners that do not exist yet (matched by name) and
/// opens their first period when requested. Returns the partners created.
///
/// # Arguments
/// * `partners` - Entries of the `[[partners]]` seed table
pub async fn seed_partners(
    ctx: &LedgerContext,
    partners: &[PartnerConfig],
) -> Result<Vec<partner::Model>> {
    let mut created = Vec::new();

    for config in partners {
        if get_partner_by_name(ctx, &config.name).await?.is_some() {
            continue;
        }

        let partner = create_partner(
            ctx,
            PartnerTerms::new(
                config.name.clone(),
                config.sponsored_employees_count,
                config.total_shared_amount,
            ),
        )
        .await?;

        let partner = if config.start_period {
            crate::core::period::start_new_period(ctx, partner.id).await?.partner
        } else {
            partner
        };
        created.push(partner);
    }

    info!(seeded = created.len(), "Partner seeding finished");
    Ok(created)
}
