use thiserror::Error;

use crate::db_types::{PriceRecord, PriceUpdate};

#[derive(Debug, Clone, Error)]
pub enum PricingStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for PricingStoreError {
    fn from(e: sqlx::Error) -> Self {
        PricingStoreError::DatabaseError(e.to_string())
    }
}

/// Storage behaviour for price records.
#[allow(async_fn_in_trait)]
pub trait PricingStore {
    /// Fetches the price record for the given (article, service type) pair, if one is configured.
    async fn fetch_price(
        &self,
        article_id: i64,
        service_type_id: i64,
    ) -> Result<Option<PriceRecord>, PricingStoreError>;

    /// Materialises a default price record (1-franc prices, pricing mode inherited from the service
    /// type, `PER_ITEM` if the service type is unknown) in a single atomic transaction, and returns
    /// it. If another writer created the record concurrently, the existing record is returned.
    async fn bootstrap_price(
        &self,
        article_id: i64,
        service_type_id: i64,
    ) -> Result<PriceRecord, PricingStoreError>;

    /// Applies an admin price write. Creates the record if it does not exist, updates only the
    /// populated fields otherwise. Returns the stored record.
    async fn upsert_price(&self, update: &PriceUpdate) -> Result<PriceRecord, PricingStoreError>;
}
