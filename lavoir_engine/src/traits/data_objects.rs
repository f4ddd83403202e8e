use lavoir_common::Fcfa;
use serde::{Deserialize, Serialize};

use crate::db_types::{
    AffiliateCode,
    CommissionStatus,
    CommissionTransaction,
    LoyaltyAccount,
    NewOrder,
    Order,
    OrderLine,
    PricedLine,
};

//--------------------------------------   AppliedDiscount   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub offer_id: i64,
    pub amount: Fcfa,
}

//--------------------------------------    DiscountPlan     ---------------------------------------------------------
/// The outcome of a discount computation: what the order will cost and which mutations have to be
/// committed alongside it. The plan only *reserves* loyalty points; the debit happens inside the
/// checkout transaction with a balance guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountPlan {
    pub subtotal: Fcfa,
    pub final_amount: Fcfa,
    pub applied: Vec<AppliedDiscount>,
    pub points_to_debit: i64,
}

impl DiscountPlan {
    /// A plan that leaves the subtotal untouched.
    pub fn unchanged(subtotal: Fcfa) -> Self {
        Self { subtotal, final_amount: subtotal, applied: Vec::new(), points_to_debit: 0 }
    }

    pub fn total_discount(&self) -> Fcfa {
        self.applied.iter().map(|d| d.amount).sum()
    }
}

//--------------------------------------   CommissionShare   ---------------------------------------------------------
/// One affiliate's share of an order commission. Level 0 is the direct affiliate; higher levels are
/// ancestors in the referral tree receiving decayed commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionShare {
    pub affiliate_id: i64,
    pub amount: Fcfa,
    pub level: i64,
}

//--------------------------------------    CommissionPlan   ---------------------------------------------------------
/// The pre-computed commission distribution for one order: the share of each affiliate up the
/// referral chain, nearest first. Computed before any ledger row is touched, committed atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionPlan {
    pub affiliate_code: AffiliateCode,
    pub order_total: Fcfa,
    pub shares: Vec<CommissionShare>,
}

impl CommissionPlan {
    pub fn direct_share(&self) -> Option<&CommissionShare> {
        self.shares.iter().find(|s| s.level == 0)
    }

    pub fn total_commission(&self) -> Fcfa {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

//--------------------------------------    CheckoutCommit   ---------------------------------------------------------
/// Everything `commit_checkout` has to persist in one transaction.
#[derive(Debug, Clone)]
pub struct CheckoutCommit {
    pub order: NewOrder,
    pub lines: Vec<PricedLine>,
    pub discount: DiscountPlan,
    pub commission: Option<CommissionPlan>,
    /// Loyalty points credited for placing the order (1 point per franc of the final total).
    pub points_earned: i64,
}

//--------------------------------------   CheckoutReceipt   ---------------------------------------------------------
/// What came out of a committed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub commissions: Vec<CommissionTransaction>,
    pub loyalty: LoyaltyAccount,
}

//-------------------------------------- WithdrawalReceipt   ---------------------------------------------------------
/// The caller-facing summary of a withdrawal request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub transaction_id: i64,
    pub affiliate_id: i64,
    /// The amount requested for payout (positive, unlike the ledger row).
    pub amount: Fcfa,
    pub status: CommissionStatus,
}

impl From<&CommissionTransaction> for WithdrawalReceipt {
    fn from(tx: &CommissionTransaction) -> Self {
        Self { transaction_id: tx.id, affiliate_id: tx.affiliate_id, amount: -tx.amount, status: tx.status }
    }
}
