use thiserror::Error;

use crate::traits::{
    data_objects::{CheckoutCommit, CheckoutReceipt},
    AffiliateLedger,
    AffiliateLedgerError,
    LoyaltyError,
    LoyaltyStore,
    OfferStore,
    OrderManagement,
    OrderManagementError,
    PricingStore,
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutCommitError {
    #[error("{0}")]
    Loyalty(#[from] LoyaltyError),
    #[error("{0}")]
    Ledger(#[from] AffiliateLedgerError),
    #[error("{0}")]
    Orders(#[from] OrderManagementError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CheckoutCommitError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutCommitError::DatabaseError(e.to_string())
    }
}

/// The composite contract for backends supporting the full checkout flow.
///
/// This is the highest level of behaviour a backend exposes: everything the orchestrator planned for
/// one order — the order itself, its lines, the loyalty point debit and credit, and the commission
/// distribution — lands in storage through one call and one transaction. If any step fails, nothing
/// is persisted.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase:
    Clone + PricingStore + OfferStore + LoyaltyStore + AffiliateLedger + OrderManagement
{
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Atomically persists a planned checkout and returns the stored rows.
    async fn commit_checkout(&self, commit: CheckoutCommit) -> Result<CheckoutReceipt, CheckoutCommitError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CheckoutCommitError> {
        Ok(())
    }
}
