use lavoir_common::Fcfa;
use thiserror::Error;

use crate::{
    db_types::{AffiliateCode, OrderStatusType, Role},
    traits::{
        AffiliateLedgerError,
        CheckoutCommitError,
        LoyaltyError,
        OfferStoreError,
        OrderManagementError,
        PricingStoreError,
    },
};

//--------------------------------------      ErrorKind      ---------------------------------------------------------
/// Coarse classification of engine errors, so an HTTP layer (or any other caller) can map failures
/// exhaustively instead of matching on message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong (missing field, bad amount, forbidden transition). 4xx-equivalent.
    Validation,
    /// A referenced entity does not exist. 404-equivalent.
    NotFound,
    /// The actor is not permitted to do this. 403-equivalent.
    Authorization,
    /// The operation collides with current state (duplicate payout, withdrawal already settled).
    /// 409-equivalent.
    Conflict,
    /// The storage layer failed. 5xx-equivalent; retry policy belongs to the caller.
    Storage,
}

//--------------------------------------    PricingError     ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum PricingError {
    #[error("No price is configured for article #{article_id} on service type #{service_type_id}")]
    PriceNotConfigured { article_id: i64, service_type_id: i64 },
    #[error("Article #{article_id} is not available on service type #{service_type_id}")]
    ArticleUnavailable { article_id: i64, service_type_id: i64 },
    #[error("Article #{article_id} is priced per weight but the order line carries no weight")]
    MissingWeight { article_id: i64 },
    #[error("Article #{article_id} is priced per weight but no per-kg rate is configured for service type #{service_type_id}")]
    MissingRateConfig { article_id: i64, service_type_id: i64 },
    #[error("{0}")]
    Store(#[from] PricingStoreError),
}

impl PricingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::PriceNotConfigured { .. } => ErrorKind::NotFound,
            PricingError::ArticleUnavailable { .. }
            | PricingError::MissingWeight { .. }
            | PricingError::MissingRateConfig { .. } => ErrorKind::Validation,
            PricingError::Store(_) => ErrorKind::Storage,
        }
    }
}

//--------------------------------------    DiscountError    ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum DiscountError {
    #[error("{0}")]
    Offers(#[from] OfferStoreError),
    #[error("{0}")]
    Loyalty(#[from] LoyaltyError),
}

impl DiscountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscountError::Offers(OfferStoreError::DatabaseError(_)) => ErrorKind::Storage,
            DiscountError::Loyalty(LoyaltyError::DatabaseError(_)) => ErrorKind::Storage,
            DiscountError::Loyalty(_) => ErrorKind::Validation,
        }
    }
}

//--------------------------------------   CommissionError   ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum CommissionError {
    #[error("No affiliate exists for code {0}")]
    AffiliateNotFound(AffiliateCode),
    #[error("No affiliate exists with id #{0}")]
    AffiliateIdNotFound(i64),
    #[error("Affiliate {0} is not active")]
    AffiliateInactive(AffiliateCode),
    #[error("Withdrawal amounts must be strictly positive, got {0}")]
    InvalidWithdrawalAmount(Fcfa),
    #[error("{0}")]
    Ledger(#[from] AffiliateLedgerError),
}

impl CommissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommissionError::AffiliateNotFound(_) | CommissionError::AffiliateIdNotFound(_) => ErrorKind::NotFound,
            CommissionError::AffiliateInactive(_) | CommissionError::InvalidWithdrawalAmount(_) => {
                ErrorKind::Validation
            },
            CommissionError::Ledger(e) => match e {
                AffiliateLedgerError::InsufficientBalance { .. } => ErrorKind::Validation,
                AffiliateLedgerError::AlreadyDistributed { .. } => ErrorKind::Conflict,
                AffiliateLedgerError::WithdrawalNotFound(_) => ErrorKind::NotFound,
                AffiliateLedgerError::WithdrawalNotPending(_) => ErrorKind::Conflict,
                AffiliateLedgerError::DatabaseError(_) => ErrorKind::Storage,
            },
        }
    }
}

//--------------------------------------  OrderStatusError   ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum OrderStatusError {
    #[error("The requested order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Role {role} is not permitted to update order statuses")]
    Unauthorized { role: Role },
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Order is already in terminal status {0}")]
    AlreadyTerminal(OrderStatusType),
    #[error("{0}")]
    Store(#[from] OrderManagementError),
}

impl OrderStatusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderStatusError::OrderNotFound(_) => ErrorKind::NotFound,
            OrderStatusError::Unauthorized { .. } => ErrorKind::Authorization,
            OrderStatusError::InvalidTransition { .. } => ErrorKind::Validation,
            OrderStatusError::AlreadyTerminal(_) => ErrorKind::Conflict,
            OrderStatusError::Store(OrderManagementError::OrderNotFound(_)) => ErrorKind::NotFound,
            OrderStatusError::Store(OrderManagementError::DatabaseError(_)) => ErrorKind::Storage,
        }
    }
}

//--------------------------------------    CheckoutError    ---------------------------------------------------------
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Invalid order request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Pricing(#[from] PricingError),
    #[error("{0}")]
    Discount(#[from] DiscountError),
    #[error("{0}")]
    Commission(#[from] CommissionError),
    #[error("{0}")]
    Commit(#[from] CheckoutCommitError),
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::InvalidRequest(_) => ErrorKind::Validation,
            CheckoutError::Pricing(e) => e.kind(),
            CheckoutError::Discount(e) => e.kind(),
            CheckoutError::Commission(e) => e.kind(),
            CheckoutError::Commit(e) => match e {
                CheckoutCommitError::Loyalty(LoyaltyError::DatabaseError(_)) => ErrorKind::Storage,
                CheckoutCommitError::Loyalty(_) => ErrorKind::Validation,
                CheckoutCommitError::Ledger(AffiliateLedgerError::AlreadyDistributed { .. }) => ErrorKind::Conflict,
                CheckoutCommitError::Ledger(AffiliateLedgerError::DatabaseError(_)) => ErrorKind::Storage,
                CheckoutCommitError::Ledger(_) => ErrorKind::Validation,
                CheckoutCommitError::Orders(OrderManagementError::OrderNotFound(_)) => ErrorKind::NotFound,
                CheckoutCommitError::Orders(OrderManagementError::DatabaseError(_)) => ErrorKind::Storage,
                CheckoutCommitError::DatabaseError(_) => ErrorKind::Storage,
            },
        }
    }
}
