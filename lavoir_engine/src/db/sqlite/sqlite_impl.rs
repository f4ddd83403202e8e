//! `SqliteDatabase` is a concrete implementation of a Lavoir engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module. Every mutating method opens one transaction; balance changes go
//! through atomic, guarded `SET x = x + ?` updates inside the helper modules.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use lavoir_common::Fcfa;
use log::*;
use sqlx::SqlitePool;

use super::{affiliates, db::new_pool, loyalty, offers, orders, prices};
use crate::{
    db_types::{
        AffiliateCode,
        AffiliateProfile,
        CommissionStatus,
        CommissionTransaction,
        LoyaltyAccount,
        Offer,
        Order,
        OrderLine,
        OrderStatusType,
        PriceRecord,
        PriceUpdate,
    },
    traits::{
        AffiliateLedger,
        AffiliateLedgerError,
        CheckoutCommit,
        CheckoutCommitError,
        CheckoutDatabase,
        CheckoutReceipt,
        LoyaltyError,
        LoyaltyStore,
        OfferStore,
        OfferStoreError,
        OrderManagement,
        OrderManagementError,
        OrderQueryFilter,
        PricingStore,
        PricingStoreError,
        WithdrawalOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PricingStore for SqliteDatabase {
    async fn fetch_price(
        &self,
        article_id: i64,
        service_type_id: i64,
    ) -> Result<Option<PriceRecord>, PricingStoreError> {
        let mut conn = self.pool.acquire().await?;
        prices::fetch_price(article_id, service_type_id, &mut conn).await
    }

    async fn bootstrap_price(
        &self,
        article_id: i64,
        service_type_id: i64,
    ) -> Result<PriceRecord, PricingStoreError> {
        let mut tx = self.pool.begin().await?;
        let mode = prices::default_mode_for_service_type(service_type_id, &mut tx).await?;
        prices::insert_default_price(article_id, service_type_id, mode, &mut tx).await?;
        let record = prices::fetch_price(article_id, service_type_id, &mut tx).await?.ok_or_else(|| {
            PricingStoreError::DatabaseError("Price record missing immediately after bootstrap".to_string())
        })?;
        tx.commit().await?;
        debug!("🗃️ Bootstrapped default price for article #{article_id}/service #{service_type_id}");
        Ok(record)
    }

    async fn upsert_price(&self, update: &PriceUpdate) -> Result<PriceRecord, PricingStoreError> {
        let mut tx = self.pool.begin().await?;
        let record = prices::upsert_price(update, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }
}

impl OfferStore for SqliteDatabase {
    async fn fetch_offers_for_checkout(
        &self,
        offer_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<Offer>, OfferStoreError> {
        let mut conn = self.pool.acquire().await?;
        offers::fetch_offers_for_checkout(offer_ids, now, &mut conn).await
    }
}

impl LoyaltyStore for SqliteDatabase {
    async fn loyalty_account(&self, user_id: &str) -> Result<Option<LoyaltyAccount>, LoyaltyError> {
        let mut conn = self.pool.acquire().await?;
        loyalty::account(user_id, &mut conn).await
    }

    async fn credit_points(
        &self,
        user_id: &str,
        points: i64,
        source: &str,
        reference_id: Option<i64>,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        let mut tx = self.pool.begin().await?;
        let account = loyalty::credit(user_id, points, source, reference_id, &mut tx).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn debit_points(
        &self,
        user_id: &str,
        points: i64,
        source: &str,
        reference_id: Option<i64>,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        let mut tx = self.pool.begin().await?;
        let account = loyalty::debit(user_id, points, source, reference_id, &mut tx).await?;
        tx.commit().await?;
        Ok(account)
    }
}

impl AffiliateLedger for SqliteDatabase {
    async fn affiliate_by_code(
        &self,
        code: &AffiliateCode,
    ) -> Result<Option<AffiliateProfile>, AffiliateLedgerError> {
        let mut conn = self.pool.acquire().await?;
        affiliates::affiliate_by_code(code, &mut conn).await
    }

    async fn affiliate_by_id(&self, affiliate_id: i64) -> Result<Option<AffiliateProfile>, AffiliateLedgerError> {
        let mut conn = self.pool.acquire().await?;
        affiliates::affiliate_by_id(affiliate_id, &mut conn).await
    }

    async fn ancestor_chain(
        &self,
        affiliate_id: i64,
        max_levels: usize,
    ) -> Result<Vec<AffiliateProfile>, AffiliateLedgerError> {
        let mut conn = self.pool.acquire().await?;
        affiliates::ancestor_chain(affiliate_id, max_levels, &mut conn).await
    }

    async fn record_commissions(
        &self,
        order_id: i64,
        plan: &crate::traits::CommissionPlan,
    ) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError> {
        let mut tx = self.pool.begin().await?;
        let recorded = affiliates::record_commissions(order_id, plan, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {} commission transaction(s) recorded for order #{order_id}", recorded.len());
        Ok(recorded)
    }

    async fn request_withdrawal(
        &self,
        affiliate_id: i64,
        amount: Fcfa,
    ) -> Result<CommissionTransaction, AffiliateLedgerError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal = affiliates::request_withdrawal(affiliate_id, amount, &mut tx).await?;
        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn settle_withdrawal(
        &self,
        withdrawal_id: i64,
        outcome: WithdrawalOutcome,
    ) -> Result<CommissionTransaction, AffiliateLedgerError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal = affiliates::settle_withdrawal(withdrawal_id, outcome, &mut tx).await?;
        tx.commit().await?;
        Ok(withdrawal)
    }

    async fn commissions_for_affiliate(
        &self,
        affiliate_id: i64,
    ) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError> {
        let mut conn = self.pool.acquire().await?;
        affiliates::commissions_for_affiliate(affiliate_id, &mut conn).await
    }

    async fn withdrawals_by_status(
        &self,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError> {
        let mut conn = self.pool.acquire().await?;
        affiliates::withdrawals_by_status(status, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_lines(order_id, &mut conn).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: &str,
    ) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(order_id, new_status, changed_by, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(filter, &mut conn).await
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn commit_checkout(&self, commit: CheckoutCommit) -> Result<CheckoutReceipt, CheckoutCommitError> {
        let mut tx = self.pool.begin().await?;
        let user_id = commit.order.user_id.clone();

        let order_id = orders::insert_order(&commit.order, &mut tx).await?;
        orders::insert_lines(order_id, &commit.lines, &mut tx).await?;

        if commit.discount.points_to_debit > 0 {
            loyalty::debit(&user_id, commit.discount.points_to_debit, "OFFER", Some(order_id), &mut tx).await?;
        }

        let commissions = match &commit.commission {
            Some(plan) => affiliates::record_commissions(order_id, plan, &mut tx).await?,
            None => Vec::new(),
        };

        let account = if commit.points_earned > 0 {
            loyalty::credit(&user_id, commit.points_earned, "ORDER", Some(order_id), &mut tx).await?
        } else {
            loyalty::ensure_account(&user_id, &mut tx).await?
        };

        let order = orders::fetch_order(order_id, &mut tx)
            .await?
            .ok_or(OrderManagementError::OrderNotFound(order_id))?;
        let lines = orders::fetch_lines(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Checkout for order #{order_id} committed ({} line(s))", lines.len());

        Ok(CheckoutReceipt { order, lines, commissions, loyalty: account })
    }
}
