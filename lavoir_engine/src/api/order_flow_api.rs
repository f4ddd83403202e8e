use std::fmt::Debug;

use lavoir_common::Fcfa;
use log::*;

use crate::{
    api::{
        commission_api::CommissionApi,
        discount_api::DiscountApi,
        errors::CheckoutError,
        order_objects::{CheckoutResult, OrderRequest, PricingBreakdown, RewardSummary},
        pricing_api::{line_total, PriceResolution, PricingApi},
    },
    db_types::{NewOrder, PricedLine},
    events::{EventProducers, OrderCreatedEvent},
    traits::{CheckoutCommit, CheckoutDatabase, CommissionPlan},
};

/// `OrderFlowApi` is the checkout orchestrator: it prices each line, stacks discounts, plans the
/// affiliate commission, and commits the whole order in one backend transaction before emitting the
/// order-created event.
pub struct OrderFlowApi<B> {
    db: B,
    pricing: PricingApi<B>,
    discounts: DiscountApi<B>,
    commissions: CommissionApi<B>,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B>
where B: CheckoutDatabase
{
    /// Creates an orchestrator with strict price resolution (the production default; see
    /// [`PriceResolution`]).
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self::with_price_resolution(db, producers, PriceResolution::from_env())
    }

    pub fn with_price_resolution(db: B, producers: EventProducers, resolution: PriceResolution) -> Self {
        let pricing = PricingApi::new(db.clone()).with_resolution(resolution);
        let discounts = DiscountApi::new(db.clone());
        let commissions = CommissionApi::new(db.clone(), producers.clone());
        Self { db, pricing, discounts, commissions, producers }
    }

    /// Prices and persists a new order.
    ///
    /// Every ledger mutation — the order and its lines, the loyalty point debit for a points
    /// exchange, the earned-point credit, and the commission distribution — lands in one atomic
    /// transaction. If any step fails nothing is persisted; only the order-created notification is
    /// decoupled from the transaction.
    pub async fn checkout(&self, request: OrderRequest) -> Result<CheckoutResult, CheckoutError> {
        request.validate()?;

        let mut lines = Vec::with_capacity(request.items.len());
        let mut subtotal = Fcfa::zero();
        for item in &request.items {
            let record = self.pricing.resolve(item.article_id, request.service_type_id).await?;
            let total = line_total(&record, item.quantity, item.weight, item.is_premium)?;
            let unit_price = if item.is_premium { record.premium_price } else { record.base_price };
            subtotal += total;
            lines.push(PricedLine {
                article_id: item.article_id,
                service_type_id: request.service_type_id,
                quantity: i64::from(item.quantity),
                unit_price,
                is_premium: item.is_premium,
                weight: item.weight,
                line_total: total,
            });
        }
        trace!("🧺️ Subtotal for user [{}]: {subtotal} over {} line(s)", request.user_id, lines.len());

        let article_ids = request.article_ids();
        let discount = self
            .discounts
            .apply(subtotal, &article_ids, &request.offer_ids, &request.user_id)
            .await?;

        let commission: Option<CommissionPlan> = match &request.affiliate_code {
            Some(code) => Some(self.commissions.plan_distribution(code, discount.final_amount).await?),
            None => None,
        };

        // 1 loyalty point per franc of the final total
        let points_earned = discount.final_amount.value();

        let order = NewOrder {
            user_id: request.user_id.clone(),
            service_type_id: request.service_type_id,
            address_id: request.address_id,
            subtotal,
            total_amount: discount.final_amount,
            affiliate_code: request.affiliate_code.clone(),
            payment_method: request.payment_method.clone(),
            is_recurring: request.is_recurring,
            recurrence_type: request.recurrence_type.clone(),
            collection_date: request.collection_date,
            delivery_date: request.delivery_date,
        };
        let commit = CheckoutCommit { order, lines, discount: discount.clone(), commission, points_earned };
        let receipt = self.db.commit_checkout(commit).await?;
        debug!(
            "🧺️ Order #{} committed for user [{}]: {subtotal} - {} = {}",
            receipt.order.id,
            receipt.order.user_id,
            discount.total_discount(),
            receipt.order.total_amount
        );

        self.call_order_created_hook(&receipt, points_earned).await;
        self.commissions.call_commission_earned_hook(&receipt.commissions).await;

        Ok(CheckoutResult {
            pricing: PricingBreakdown {
                subtotal,
                discounts: discount.applied,
                total: receipt.order.total_amount,
            },
            rewards: RewardSummary { points_earned, current_balance: receipt.loyalty.points_balance },
            order: receipt.order,
            lines: receipt.lines,
        })
    }

    async fn call_order_created_hook(&self, receipt: &crate::traits::CheckoutReceipt, points_earned: i64) {
        for emitter in &self.producers.order_created_producer {
            debug!("🧺️ Notifying order created hook subscribers");
            emitter
                .publish_event(OrderCreatedEvent::new(receipt.order.clone(), points_earned))
                .await;
        }
    }

    pub fn pricing(&self) -> &PricingApi<B> {
        &self.pricing
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
