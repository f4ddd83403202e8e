use chrono::{DateTime, Utc};
use lavoir_common::Fcfa;
use serde::{Deserialize, Serialize};

use crate::{
    api::errors::CheckoutError,
    db_types::{AffiliateCode, Order, OrderLine},
    traits::AppliedDiscount,
};

//--------------------------------------  OrderItemRequest   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub article_id: i64,
    pub quantity: u32,
    #[serde(default)]
    pub is_premium: bool,
    /// Weighed load in kilograms, for articles priced per weight.
    #[serde(default)]
    pub weight: Option<f64>,
}

//--------------------------------------    OrderRequest     ---------------------------------------------------------
/// The order-creation input, as received from the order controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: String,
    pub service_type_id: i64,
    pub address_id: i64,
    pub payment_method: String,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub offer_ids: Vec<i64>,
    #[serde(default)]
    pub affiliate_code: Option<AffiliateCode>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_type: Option<String>,
    #[serde(default)]
    pub collection_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivery_date: Option<DateTime<Utc>>,
}

impl OrderRequest {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::InvalidRequest("An order needs at least one item".to_string()));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(CheckoutError::InvalidRequest(format!(
                "Quantity for article #{} must be at least 1",
                item.article_id
            )));
        }
        Ok(())
    }

    pub fn article_ids(&self) -> Vec<i64> {
        self.items.iter().map(|i| i.article_id).collect()
    }
}

//--------------------------------------  PricingBreakdown   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Fcfa,
    pub discounts: Vec<AppliedDiscount>,
    pub total: Fcfa,
}

//--------------------------------------    RewardSummary    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSummary {
    pub points_earned: i64,
    pub current_balance: i64,
}

//--------------------------------------   CheckoutResult    ---------------------------------------------------------
/// Everything the caller gets back from a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub pricing: PricingBreakdown,
    pub rewards: RewardSummary,
}
