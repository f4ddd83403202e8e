use lavoir_common::Fcfa;
use log::*;

use crate::{
    api::errors::CommissionError,
    db_types::{AffiliateCode, AffiliateProfile, CommissionStatus, CommissionTransaction},
    events::{CommissionEarnedEvent, EventProducers, WithdrawalEvent},
    traits::{AffiliateLedger, CommissionPlan, CommissionShare, WithdrawalOutcome, WithdrawalReceipt},
};

/// Fallback commission percentage when neither a level rate nor a per-profile rate is configured.
pub const DEFAULT_COMMISSION_RATE: f64 = 10.0;
/// Each ancestor level earns this percentage of the previous level's paid amount.
pub const PARENT_COMMISSION_RATE: f64 = 10.0;
/// How far up the referral tree commission propagates. Level 0 (the direct affiliate) is always
/// paid; at most this many ancestor levels follow.
pub const MAX_PARENT_LEVELS: usize = 3;

/// `CommissionApi` distributes order commissions up the referral chain and manages withdrawals
/// against accrued balances.
pub struct CommissionApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> CommissionApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> CommissionApi<B>
where B: AffiliateLedger
{
    /// Computes the commission distribution for an order without touching the ledger.
    ///
    /// The affiliate's ancestors are fetched in one pass up front, and the plan is built by an
    /// iterative walk over that chain, so the depth bound is explicit and no query runs per level.
    pub async fn plan_distribution(
        &self,
        code: &AffiliateCode,
        order_total: Fcfa,
    ) -> Result<CommissionPlan, CommissionError> {
        let profile = self
            .db
            .affiliate_by_code(code)
            .await?
            .ok_or_else(|| CommissionError::AffiliateNotFound(code.clone()))?;
        if !profile.is_payable() {
            return Err(CommissionError::AffiliateInactive(code.clone()));
        }
        let ancestors = self.db.ancestor_chain(profile.id, MAX_PARENT_LEVELS).await?;
        Ok(build_commission_plan(&profile, &ancestors, order_total))
    }

    /// Plans and records the commission for an order in one go. Use this for orders that were not
    /// created through the checkout flow; checkout commits its plan atomically with the order.
    ///
    /// Distribution is at-most-once per order: a repeat call fails with `AlreadyDistributed` and
    /// changes nothing.
    pub async fn distribute(
        &self,
        order_id: i64,
        code: &AffiliateCode,
        order_total: Fcfa,
    ) -> Result<Vec<CommissionTransaction>, CommissionError> {
        let plan = self.plan_distribution(code, order_total).await?;
        let transactions = self.db.record_commissions(order_id, &plan).await?;
        debug!(
            "🤝️ Order #{order_id}: {} paid to {} affiliate(s) for code {code}",
            plan.total_commission(),
            transactions.len()
        );
        self.call_commission_earned_hook(&transactions).await;
        Ok(transactions)
    }

    pub(crate) async fn call_commission_earned_hook(&self, transactions: &[CommissionTransaction]) {
        for emitter in &self.producers.commission_earned_producer {
            for tx in transactions {
                emitter.publish_event(CommissionEarnedEvent::new(tx.clone())).await;
            }
        }
    }

    /// Files a withdrawal request against the affiliate's commission balance.
    pub async fn request_withdrawal(
        &self,
        affiliate_id: i64,
        amount: Fcfa,
    ) -> Result<WithdrawalReceipt, CommissionError> {
        if !amount.is_positive() {
            return Err(CommissionError::InvalidWithdrawalAmount(amount));
        }
        let profile = self
            .db
            .affiliate_by_id(affiliate_id)
            .await?
            .ok_or(CommissionError::AffiliateIdNotFound(affiliate_id))?;
        if !profile.is_payable() {
            return Err(CommissionError::AffiliateInactive(profile.affiliate_code.clone()));
        }
        let tx = self.db.request_withdrawal(affiliate_id, amount).await?;
        info!("🤝️ Affiliate #{affiliate_id} requested a withdrawal of {amount}");
        self.call_withdrawal_hook(&tx).await;
        Ok(WithdrawalReceipt::from(&tx))
    }

    /// Approves a pending withdrawal. The balance was already debited at request time.
    pub async fn approve_withdrawal(&self, withdrawal_id: i64) -> Result<WithdrawalReceipt, CommissionError> {
        let tx = self.db.settle_withdrawal(withdrawal_id, WithdrawalOutcome::Approved).await?;
        info!("🤝️ Withdrawal #{withdrawal_id} approved");
        self.call_withdrawal_hook(&tx).await;
        Ok(WithdrawalReceipt::from(&tx))
    }

    /// Rejects a pending withdrawal and refunds the amount into the commission balance.
    pub async fn reject_withdrawal(
        &self,
        withdrawal_id: i64,
        reason: &str,
    ) -> Result<WithdrawalReceipt, CommissionError> {
        let outcome = WithdrawalOutcome::Rejected { reason: reason.to_string() };
        let tx = self.db.settle_withdrawal(withdrawal_id, outcome).await?;
        info!("🤝️ Withdrawal #{withdrawal_id} rejected: {reason}");
        self.call_withdrawal_hook(&tx).await;
        Ok(WithdrawalReceipt::from(&tx))
    }

    async fn call_withdrawal_hook(&self, tx: &CommissionTransaction) {
        for emitter in &self.producers.withdrawal_producer {
            emitter.publish_event(WithdrawalEvent::new(tx.clone())).await;
        }
    }

    pub async fn commissions_for_affiliate(
        &self,
        affiliate_id: i64,
    ) -> Result<Vec<CommissionTransaction>, CommissionError> {
        Ok(self.db.commissions_for_affiliate(affiliate_id).await?)
    }

    pub async fn withdrawals_by_status(
        &self,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionTransaction>, CommissionError> {
        Ok(self.db.withdrawals_by_status(status).await?)
    }
}

/// Builds the commission distribution for one order.
///
/// The direct affiliate earns `level_rate ?? commission_rate ?? 10%` of the order total. Each
/// ancestor then earns 10% of the previous level's *paid* amount, never of the order total.
/// Inactive ancestors are skipped without resetting the decay. The walk stops after
/// [`MAX_PARENT_LEVELS`] ancestors or once a share decays to zero francs.
pub(crate) fn build_commission_plan(
    profile: &AffiliateProfile,
    ancestors: &[AffiliateProfile],
    order_total: Fcfa,
) -> CommissionPlan {
    let rate = profile.level_rate.or(profile.commission_rate).unwrap_or(DEFAULT_COMMISSION_RATE);
    let direct = order_total.percent(rate);
    let mut shares = vec![CommissionShare { affiliate_id: profile.id, amount: direct, level: 0 }];

    let mut previous = direct;
    for (i, ancestor) in ancestors.iter().take(MAX_PARENT_LEVELS).enumerate() {
        let amount = previous.percent(PARENT_COMMISSION_RATE);
        if !amount.is_positive() {
            break;
        }
        if ancestor.is_payable() {
            shares.push(CommissionShare { affiliate_id: ancestor.id, amount, level: (i + 1) as i64 });
            previous = amount;
        } else {
            trace!("🤝️ Ancestor affiliate #{} skipped: not active", ancestor.id);
        }
    }

    CommissionPlan { affiliate_code: profile.affiliate_code.clone(), order_total, shares }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::AffiliateStatus;

    fn affiliate(id: i64, parent: Option<i64>) -> AffiliateProfile {
        AffiliateProfile {
            id,
            user_id: format!("user-{id}"),
            affiliate_code: AffiliateCode::from(format!("CODE{id}")),
            parent_affiliate_id: parent,
            commission_rate: None,
            level_rate: None,
            commission_balance: Fcfa::zero(),
            total_earned: Fcfa::zero(),
            monthly_earnings: Fcfa::zero(),
            total_referrals: 0,
            is_active: true,
            status: AffiliateStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn direct_commission_uses_the_default_rate() {
        let plan = build_commission_plan(&affiliate(1, None), &[], Fcfa::from(10_000));
        assert_eq!(plan.shares, vec![CommissionShare { affiliate_id: 1, amount: Fcfa::from(1_000), level: 0 }]);
    }

    #[test]
    fn profile_rate_overrides_the_default_and_level_rate_wins() {
        let mut direct = affiliate(1, None);
        direct.commission_rate = Some(15.0);
        let plan = build_commission_plan(&direct, &[], Fcfa::from(10_000));
        assert_eq!(plan.direct_share().unwrap().amount, Fcfa::from(1_500));

        direct.level_rate = Some(20.0);
        let plan = build_commission_plan(&direct, &[], Fcfa::from(10_000));
        assert_eq!(plan.direct_share().unwrap().amount, Fcfa::from(2_000));
    }

    #[test]
    fn parents_earn_a_share_of_the_previous_level_not_the_order() {
        let plan = build_commission_plan(&affiliate(1, Some(2)), &[affiliate(2, None)], Fcfa::from(10_000));
        assert_eq!(plan.shares.len(), 2);
        assert_eq!(plan.shares[1], CommissionShare { affiliate_id: 2, amount: Fcfa::from(100), level: 1 });
    }

    #[test]
    fn propagation_stops_at_three_parent_levels() {
        let ancestors = vec![
            affiliate(2, Some(3)),
            affiliate(3, Some(4)),
            affiliate(4, Some(5)),
            affiliate(5, Some(6)),
            affiliate(6, None),
        ];
        let plan = build_commission_plan(&affiliate(1, Some(2)), &ancestors, Fcfa::from(10_000_000));
        assert_eq!(plan.shares.len(), 1 + MAX_PARENT_LEVELS);
        assert_eq!(plan.shares.last().unwrap().level, 3);
        // 1_000_000 -> 100_000 -> 10_000 -> 1_000
        assert_eq!(plan.shares[3].amount, Fcfa::from(1_000));
    }

    #[test]
    fn inactive_ancestors_are_skipped_without_resetting_the_decay() {
        let mut suspended = affiliate(2, Some(3));
        suspended.status = AffiliateStatus::Suspended;
        let ancestors = vec![suspended, affiliate(3, None)];
        let plan = build_commission_plan(&affiliate(1, Some(2)), &ancestors, Fcfa::from(10_000));
        assert_eq!(plan.shares.len(), 2);
        // the grandparent still earns 10% of the *direct* commission
        assert_eq!(plan.shares[1], CommissionShare { affiliate_id: 3, amount: Fcfa::from(100), level: 2 });
    }

    #[test]
    fn fully_decayed_shares_are_dropped() {
        let ancestors = vec![affiliate(2, Some(3)), affiliate(3, None)];
        // 10% of 50 is 5; 10% of 5 is 0 after truncation
        let plan = build_commission_plan(&affiliate(1, Some(2)), &ancestors, Fcfa::from(500));
        assert_eq!(plan.shares.len(), 2);
        assert_eq!(plan.total_commission(), Fcfa::from(55));
    }
}
