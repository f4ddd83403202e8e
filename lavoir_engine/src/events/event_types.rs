use lavoir_common::Fcfa;
use serde::{Deserialize, Serialize};

use crate::db_types::{CommissionTransaction, Order, OrderStatusType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub total: Fcfa,
    pub points_earned: i64,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, points_earned: i64) -> Self {
        let total = order.total_amount;
        Self { order, total, points_earned }
    }

    /// The notification payload for the order owner.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "orderId": self.order.id,
            "totalAmount": self.total,
            "pointsEarned": self.points_earned,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub previous_status: OrderStatusType,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, previous_status: OrderStatusType) -> Self {
        Self { order, previous_status }
    }

    /// The user to notify: the order owner.
    pub fn recipient(&self) -> &str {
        &self.order.user_id
    }

    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "orderId": self.order.id,
            "previousStatus": self.previous_status,
            "newStatus": self.order.status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionEarnedEvent {
    pub transaction: CommissionTransaction,
}

impl CommissionEarnedEvent {
    pub fn new(transaction: CommissionTransaction) -> Self {
        Self { transaction }
    }
}

/// Raised when a withdrawal is requested, approved or rejected; the transaction status tells which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    pub transaction: CommissionTransaction,
}

impl WithdrawalEvent {
    pub fn new(transaction: CommissionTransaction) -> Self {
        Self { transaction }
    }

    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "transactionId": self.transaction.id,
            "amount": -self.transaction.amount,
            "status": self.transaction.status,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    CommissionEarned(CommissionEarnedEvent),
    Withdrawal(WithdrawalEvent),
}
