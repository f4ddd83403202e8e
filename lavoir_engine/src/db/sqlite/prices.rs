use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{PriceRecord, PriceUpdate, PricingMode},
    traits::PricingStoreError,
};

const PRICE_COLUMNS: &str = "id, article_id, service_type_id, base_price, premium_price, price_per_kg, \
                             pricing_mode, is_available, created_at, updated_at";

pub async fn fetch_price(
    article_id: i64,
    service_type_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PriceRecord>, PricingStoreError> {
    let q = format!("SELECT {PRICE_COLUMNS} FROM article_service_prices WHERE article_id = $1 AND service_type_id = $2");
    let record = sqlx::query_as::<_, PriceRecord>(&q)
        .bind(article_id)
        .bind(service_type_id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

/// The pricing mode a bootstrapped record inherits: the service type's declared default, or
/// `PER_ITEM` when the service type is unknown or carries an unparseable mode.
pub async fn default_mode_for_service_type(
    service_type_id: i64,
    conn: &mut SqliteConnection,
) -> Result<PricingMode, PricingStoreError> {
    let mode: Option<String> =
        sqlx::query_scalar("SELECT default_pricing_mode FROM service_types WHERE id = $1")
            .bind(service_type_id)
            .fetch_optional(conn)
            .await?;
    let mode = match mode {
        Some(s) => s.parse().unwrap_or_else(|_| {
            error!("🗃️ Service type #{service_type_id} declares an invalid pricing mode ({s}). Using PER_ITEM.");
            PricingMode::PerItem
        }),
        None => PricingMode::PerItem,
    };
    Ok(mode)
}

/// Inserts the 1-franc default record for the pair. A concurrent insert wins silently; the caller
/// re-reads either way.
pub async fn insert_default_price(
    article_id: i64,
    service_type_id: i64,
    mode: PricingMode,
    conn: &mut SqliteConnection,
) -> Result<(), PricingStoreError> {
    sqlx::query(
        "INSERT INTO article_service_prices (article_id, service_type_id, base_price, premium_price, price_per_kg, \
         pricing_mode, is_available) VALUES ($1, $2, 1, 1, 1, $3, 1) \
         ON CONFLICT (article_id, service_type_id) DO NOTHING",
    )
    .bind(article_id)
    .bind(service_type_id)
    .bind(mode)
    .execute(conn)
    .await?;
    Ok(())
}

/// Applies an admin price write: update the populated fields, or create the record with defaults
/// for the rest.
pub async fn upsert_price(
    update: &PriceUpdate,
    conn: &mut SqliteConnection,
) -> Result<PriceRecord, PricingStoreError> {
    let updated = sqlx::query(
        "UPDATE article_service_prices SET \
            base_price = COALESCE($1, base_price), \
            premium_price = COALESCE($2, premium_price), \
            price_per_kg = COALESCE($3, price_per_kg), \
            pricing_mode = COALESCE($4, pricing_mode), \
            is_available = COALESCE($5, is_available), \
            updated_at = CURRENT_TIMESTAMP \
         WHERE article_id = $6 AND service_type_id = $7",
    )
    .bind(update.base_price)
    .bind(update.premium_price)
    .bind(update.price_per_kg)
    .bind(update.pricing_mode)
    .bind(update.is_available)
    .bind(update.article_id)
    .bind(update.service_type_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        let mode = match update.pricing_mode {
            Some(mode) => mode,
            None => default_mode_for_service_type(update.service_type_id, &mut *conn).await?,
        };
        sqlx::query(
            "INSERT INTO article_service_prices (article_id, service_type_id, base_price, premium_price, \
             price_per_kg, pricing_mode, is_available) VALUES ($1, $2, COALESCE($3, 1), COALESCE($4, 1), $5, $6, \
             COALESCE($7, 1))",
        )
        .bind(update.article_id)
        .bind(update.service_type_id)
        .bind(update.base_price)
        .bind(update.premium_price)
        .bind(update.price_per_kg)
        .bind(mode)
        .bind(update.is_available)
        .execute(&mut *conn)
        .await?;
        debug!(
            "🗃️ Created price record for article #{}/service #{}",
            update.article_id, update.service_type_id
        );
    }

    fetch_price(update.article_id, update.service_type_id, conn).await?.ok_or_else(|| {
        PricingStoreError::DatabaseError("Price record missing immediately after upsert".to_string())
    })
}
