use lavoir_common::Fcfa;
use thiserror::Error;

use crate::{
    db_types::{AffiliateCode, AffiliateProfile, CommissionStatus, CommissionTransaction},
    traits::data_objects::CommissionPlan,
};

#[derive(Debug, Clone, Error)]
pub enum AffiliateLedgerError {
    #[error("Insufficient commission balance: {requested} requested, {available} available")]
    InsufficientBalance { requested: Fcfa, available: Fcfa },
    #[error("Commission for order {order_id} has already been distributed to affiliate #{affiliate_id}")]
    AlreadyDistributed { order_id: i64, affiliate_id: i64 },
    #[error("Withdrawal #{0} does not exist")]
    WithdrawalNotFound(i64),
    #[error("Withdrawal #{0} is not pending")]
    WithdrawalNotPending(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AffiliateLedgerError {
    fn from(e: sqlx::Error) -> Self {
        AffiliateLedgerError::DatabaseError(e.to_string())
    }
}

/// How a pending withdrawal is settled by an admin.
#[derive(Debug, Clone)]
pub enum WithdrawalOutcome {
    /// The payout went through. The balance was already debited at request time.
    Approved,
    /// The payout was refused; the amount is refunded into the commission balance.
    Rejected { reason: String },
}

/// The affiliate commission ledger.
///
/// The ledger is append-only on the transaction side: every balance movement leaves a
/// [`CommissionTransaction`] behind, so the sum of an affiliate's transactions always reconciles
/// with the balance deltas on the profile.
#[allow(async_fn_in_trait)]
pub trait AffiliateLedger {
    async fn affiliate_by_code(
        &self,
        code: &AffiliateCode,
    ) -> Result<Option<AffiliateProfile>, AffiliateLedgerError>;

    async fn affiliate_by_id(&self, affiliate_id: i64) -> Result<Option<AffiliateProfile>, AffiliateLedgerError>;

    /// Fetches the referral ancestors of the given affiliate, nearest first, in a single query.
    /// At most `max_levels` ancestors are returned; the query bound also keeps a malformed cyclic
    /// chain from looping.
    async fn ancestor_chain(
        &self,
        affiliate_id: i64,
        max_levels: usize,
    ) -> Result<Vec<AffiliateProfile>, AffiliateLedgerError>;

    /// Records every share of a commission plan against the given order in one atomic transaction:
    /// balance/earnings increments on each profile, the direct affiliate's referral count, and one
    /// PENDING transaction row per share.
    ///
    /// A share that was already recorded for this (affiliate, order, level) makes the whole call
    /// fail with [`AffiliateLedgerError::AlreadyDistributed`] and rolls everything back; payout is
    /// at-most-once per order by construction.
    async fn record_commissions(
        &self,
        order_id: i64,
        plan: &CommissionPlan,
    ) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError>;

    /// Debits the requested amount from the affiliate's commission balance with an atomic guard and
    /// creates the PENDING withdrawal transaction, in one transaction. Fails with
    /// [`AffiliateLedgerError::InsufficientBalance`], leaving the balance untouched, if the balance
    /// does not cover the amount.
    async fn request_withdrawal(
        &self,
        affiliate_id: i64,
        amount: Fcfa,
    ) -> Result<CommissionTransaction, AffiliateLedgerError>;

    /// Settles a pending withdrawal. Approval only flips the status; rejection also refunds the
    /// amount into the commission balance. Fails with [`AffiliateLedgerError::WithdrawalNotPending`]
    /// from any other state.
    async fn settle_withdrawal(
        &self,
        withdrawal_id: i64,
        outcome: WithdrawalOutcome,
    ) -> Result<CommissionTransaction, AffiliateLedgerError>;

    async fn commissions_for_affiliate(
        &self,
        affiliate_id: i64,
    ) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError>;

    /// Fetches withdrawal transactions, optionally restricted to one status, newest first.
    async fn withdrawals_by_status(
        &self,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError>;
}
