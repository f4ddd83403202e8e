use thiserror::Error;

use crate::db_types::LoyaltyAccount;

#[derive(Debug, Clone, Error)]
pub enum LoyaltyError {
    #[error("Insufficient loyalty points: {requested} requested, {available} available")]
    InsufficientPoints { requested: i64, available: i64 },
    #[error("Point amounts must be strictly positive, got {0}")]
    InvalidPointAmount(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LoyaltyError {
    fn from(e: sqlx::Error) -> Self {
        LoyaltyError::DatabaseError(e.to_string())
    }
}

/// The loyalty point ledger. Points are an internal currency earned per order and redeemable for
/// discounts. A balance must never go negative: debits are guarded at the storage layer.
#[allow(async_fn_in_trait)]
pub trait LoyaltyStore {
    /// Fetches the loyalty account for the given user, if one exists. Accounts are created lazily on
    /// the first credit.
    async fn loyalty_account(&self, user_id: &str) -> Result<Option<LoyaltyAccount>, LoyaltyError>;

    /// Credits points to the user's account (creating it if necessary) and journals the entry.
    /// Returns the updated account.
    async fn credit_points(
        &self,
        user_id: &str,
        points: i64,
        source: &str,
        reference_id: Option<i64>,
    ) -> Result<LoyaltyAccount, LoyaltyError>;

    /// Debits points from the user's account with an atomic balance guard and journals the entry.
    /// Fails with [`LoyaltyError::InsufficientPoints`], leaving the balance untouched, if the
    /// account does not hold enough points.
    async fn debit_points(
        &self,
        user_id: &str,
        points: i64,
        source: &str,
        reference_id: Option<i64>,
    ) -> Result<LoyaltyAccount, LoyaltyError>;
}
