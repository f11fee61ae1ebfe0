use dotenvy::dotenv;
use hotel_hub::{
    config::{database, partners, settings::LedgerSettings},
    core::{
        context::Actor,
        hotel::{ensure_hotel, select_hotel},
        partner::{list_partners, seed_partners},
        report::{format_debt_report, generate_debt_report},
    },
    errors::Result,
};
use std::{env, path::Path};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Ledger settings
    let settings = LedgerSettings::from_env()
        .inspect_err(|e| error!("Invalid ledger settings: {}", e))?;
    info!(policy = %settings.overage_policy, currency = %settings.currency, "Ledger settings loaded");

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the hotel and its partners
    if !Path::new(partners::DEFAULT_CONFIG_PATH).exists() {
        warn!("{} not found, nothing to provision", partners::DEFAULT_CONFIG_PATH);
        return Ok(());
    }
    let seed = partners::load_default_config()
        .inspect_err(|e| error!("Failed to load {}: {}", partners::DEFAULT_CONFIG_PATH, e))?;

    let operator = Actor::admin(env::var("HOTEL_HUB_OPERATOR").unwrap_or_else(|_| "system".to_string()));
    let hotel = ensure_hotel(&db, &operator, &seed.hotel.name).await?;
    let ctx = select_hotel(db, operator, hotel.id, settings).await?;

    seed_partners(&ctx, &seed.partners)
        .await
        .inspect(|created| info!("Seeded {} new partners for {}.", created.len(), hotel.name))
        .inspect_err(|e| error!("Failed to seed partners: {}", e))?;

    // 6. Print the current debt position of every partner
    for partner in list_partners(&ctx).await? {
        let report = generate_debt_report(&ctx, partner.id).await?;
        println!("{}", format_debt_report(&report, &ctx.settings.currency));
    }

    Ok(())
}
