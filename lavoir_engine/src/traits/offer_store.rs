use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::Offer;

#[derive(Debug, Clone, Error)]
pub enum OfferStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OfferStoreError {
    fn from(e: sqlx::Error) -> Self {
        OfferStoreError::DatabaseError(e.to_string())
    }
}

/// Storage behaviour for promotional offers.
#[allow(async_fn_in_trait)]
pub trait OfferStore {
    /// Fetches the offers with the given ids that are active and whose validity window contains
    /// `now`, with their article id lists populated. Offers that are inactive, expired or not yet
    /// started are silently dropped from the result.
    async fn fetch_offers_for_checkout(
        &self,
        offer_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<Offer>, OfferStoreError>;
}
