use chrono::Utc;
use lavoir_common::Fcfa;
use log::*;

use crate::{
    api::errors::DiscountError,
    db_types::{DiscountType, Offer},
    traits::{AppliedDiscount, DiscountPlan, LoyaltyStore, OfferStore},
};

/// `DiscountApi` stacks offers and loyalty-point redemption on top of an order subtotal.
///
/// `apply` only *plans*: it reads offers and the loyalty balance and computes what the order should
/// cost. The point debit it reserves is executed inside the checkout transaction with a balance
/// guard, so a concurrent spend fails the checkout instead of overdrawing the account.
pub struct DiscountApi<B> {
    db: B,
}

impl<B> DiscountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> DiscountApi<B>
where B: OfferStore + LoyaltyStore
{
    pub async fn apply(
        &self,
        subtotal: Fcfa,
        article_ids: &[i64],
        offer_ids: &[i64],
        user_id: &str,
    ) -> Result<DiscountPlan, DiscountError> {
        if offer_ids.is_empty() {
            return Ok(DiscountPlan::unchanged(subtotal));
        }
        let offers = self.db.fetch_offers_for_checkout(offer_ids, Utc::now()).await?;
        let points_balance = self.db.loyalty_account(user_id).await?.map(|a| a.points_balance).unwrap_or(0);
        let plan = compute_discounts(subtotal, article_ids, offers, points_balance);
        debug!(
            "💳️ Discount plan for user [{user_id}]: {} off {} across {} offer(s)",
            plan.total_discount(),
            subtotal,
            plan.applied.len()
        );
        Ok(plan)
    }
}

/// The discount stacking rules, applied to an already-fetched offer set.
///
/// Non-cumulative offers are considered first and at most one of them is ever applied; once one
/// lands, iteration stops. Percentage discounts always compute off the *original* subtotal, so two
/// cumulative percentage offers do not compound. Each discount is clamped to the offer's cap, and
/// the final amount never drops below zero.
pub(crate) fn compute_discounts(
    subtotal: Fcfa,
    article_ids: &[i64],
    mut offers: Vec<Offer>,
    points_balance: i64,
) -> DiscountPlan {
    // stable: non-cumulative first, fetch order otherwise preserved
    offers.sort_by_key(|o| o.is_cumulative);

    let mut plan = DiscountPlan::unchanged(subtotal);
    let mut points_available = points_balance;

    for offer in &offers {
        if !offer.applies_to_any(article_ids) {
            continue;
        }
        if let Some(min) = offer.min_purchase_amount {
            if subtotal < min {
                trace!("💳️ Offer #{} skipped: subtotal {subtotal} under minimum {min}", offer.id);
                continue;
            }
        }

        let mut discount = match offer.discount_type {
            DiscountType::Percentage => subtotal.percent(offer.discount_value as f64),
            DiscountType::FixedAmount => Fcfa::from(offer.discount_value),
            DiscountType::PointsExchange => {
                let required = offer.points_required.unwrap_or(0);
                if points_available < required {
                    trace!(
                        "💳️ Offer #{} skipped: {required} points required, {points_available} available",
                        offer.id
                    );
                    continue;
                }
                points_available -= required;
                plan.points_to_debit += required;
                Fcfa::from(offer.discount_value)
            },
        };

        if let Some(cap) = offer.max_discount_amount {
            discount = discount.min(cap);
        }

        plan.final_amount -= discount;
        plan.applied.push(AppliedDiscount { offer_id: offer.id, amount: discount });

        if !offer.is_cumulative {
            break;
        }
    }

    plan.final_amount = plan.final_amount.max_zero();
    plan
}
