//! Hotel (tenant) management.
//!
//! Hotels sit above the [`LedgerContext`](super::context::LedgerContext): a context
//! is built for one hotel, so these functions take the connection directly.

use crate::{
    config::settings::LedgerSettings,
    core::context::{Actor, LedgerContext},
    entities::{Hotel, hotel},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Registers a new hotel. Admin only.
pub async fn create_hotel<C>(db: &C, actor: &Actor, name: &str) -> Result<hotel::Model>
where
    C: ConnectionTrait,
{
    actor.require_admin("create a hotel")?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Hotel name cannot be empty"));
    }

    let hotel = hotel::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(hotel_id = hotel.id, name = %hotel.name, by = %actor.user_id, "Hotel created");
    Ok(hotel)
}

/// Returns the hotel called `name`, creating it first if needed.
pub async fn ensure_hotel<C>(db: &C, actor: &Actor, name: &str) -> Result<hotel::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = Hotel::find()
        .filter(hotel::Column::Name.eq(name.trim()))
        .one(db)
        .await?
    {
        return Ok(existing);
    }
    create_hotel(db, actor, name).await
}

/// Finds a hotel by its unique ID.
pub async fn get_hotel_by_id<C>(db: &C, hotel_id: i64) -> Result<Option<hotel::Model>>
where
    C: ConnectionTrait,
{
    Hotel::find_by_id(hotel_id).one(db).await.map_err(Into::into)
}

/// Lists all hotels alphabetically, for the tenant picker.
pub async fn list_hotels<C>(db: &C) -> Result<Vec<hotel::Model>>
where
    C: ConnectionTrait,
{
    Hotel::find()
        .order_by_asc(hotel::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Builds the context for a hotel the user picked, failing with
/// [`Error::HotelNotFound`] when it does not exist.
///
/// # Arguments
/// * `db` - Connection moved into the returned context
/// * `actor` - User every later operation is attributed to
/// * `hotel_id` - The tenant to scope the context to
/// * `settings` - Ledger tunables for the session
pub async fn select_hotel(
    db: DatabaseConnection,
    actor: Actor,
    hotel_id: i64,
    settings: LedgerSettings,
) -> Result<LedgerContext> {
    if get_hotel_by_id(&db, hotel_id).await?.is_none() {
        return Err(Error::HotelNotFound { id: hotel_id });
    }
    Ok(LedgerContext::new(db, actor, hotel_id, settings))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_hotel_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_hotel(&db, &Actor::admin("ops"), "   ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_hotel(&db, &Actor::member("desk"), "Lakeside").await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        assert!(list_hotels(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_hotel_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = Actor::admin("ops");

        let first = ensure_hotel(&db, &admin, "Lakeside Lodge").await?;
        let second = ensure_hotel(&db, &admin, " Lakeside Lodge ").await?;
        assert_eq!(first.id, second.id);

        create_hotel(&db, &admin, "Airport Inn").await?;
        let names: Vec<String> = list_hotels(&db).await?.into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Airport Inn", "Lakeside Lodge"]);

        assert!(get_hotel_by_id(&db, first.id).await?.is_some());
        assert!(get_hotel_by_id(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_select_hotel() -> Result<()> {
        let db = setup_test_db().await?;
        let hotel = create_hotel(&db, &Actor::admin("ops"), "Lakeside Lodge").await?;

        let ctx = select_hotel(db.clone(), Actor::member("desk"), hotel.id, LedgerSettings::default()).await?;
        assert_eq!(ctx.hotel_id, hotel.id);
        assert_eq!(ctx.actor.user_id, "desk");

        let result = select_hotel(db, Actor::member("desk"), 42, LedgerSettings::default()).await;
        assert!(matches!(result, Err(Error::HotelNotFound { id: 42 })));
        Ok(())
    }
}
