use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{AffiliateCode, Order, OrderLine, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("The requested order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// Search criteria for orders. Empty filters match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<String>,
    pub affiliate_code: Option<AffiliateCode>,
    pub statuses: Vec<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_affiliate_code(mut self, code: AffiliateCode) -> Self {
        self.affiliate_code = Some(code);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.affiliate_code.is_none()
            && self.statuses.is_empty()
            && self.since.is_none()
            && self.until.is_none()
    }
}

/// Storage behaviour for orders and their audit trail.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderManagementError>;

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderManagementError>;

    /// Persists a status change in one atomic transaction: the order row, a status-log entry, and —
    /// when the new status is `DELIVERED` — the delivery-history statistics row. The transition
    /// itself is validated by the caller; this method only records it.
    async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: &str,
    ) -> Result<Order, OrderManagementError>;

    /// Fetches orders matching the filter, oldest first.
    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderManagementError>;
}
