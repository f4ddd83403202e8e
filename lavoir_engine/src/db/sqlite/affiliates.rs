use lavoir_common::Fcfa;
use log::*;
use sqlx::{error::ErrorKind as SqlxErrorKind, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{AffiliateCode, AffiliateProfile, CommissionStatus, CommissionTransaction},
    traits::{AffiliateLedgerError, CommissionPlan, WithdrawalOutcome},
};

const PROFILE_COLUMNS: &str = "id, user_id, affiliate_code, parent_affiliate_id, commission_rate, level_rate, \
                               commission_balance, total_earned, monthly_earnings, total_referrals, is_active, \
                               status, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, affiliate_id, order_id, amount, level, status, notes, created_at, updated_at";

pub async fn affiliate_by_code(
    code: &AffiliateCode,
    conn: &mut SqliteConnection,
) -> Result<Option<AffiliateProfile>, AffiliateLedgerError> {
    let q = format!("SELECT {PROFILE_COLUMNS} FROM affiliate_profiles WHERE affiliate_code = $1");
    let profile = sqlx::query_as::<_, AffiliateProfile>(&q).bind(code).fetch_optional(conn).await?;
    Ok(profile)
}

pub async fn affiliate_by_id(
    affiliate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<AffiliateProfile>, AffiliateLedgerError> {
    let q = format!("SELECT {PROFILE_COLUMNS} FROM affiliate_profiles WHERE id = $1");
    let profile = sqlx::query_as::<_, AffiliateProfile>(&q).bind(affiliate_id).fetch_optional(conn).await?;
    Ok(profile)
}

/// Walks the referral tree upwards in a single recursive query, nearest ancestor first. The level
/// bound caps the walk, which also keeps a malformed cyclic chain from recursing forever.
pub async fn ancestor_chain(
    affiliate_id: i64,
    max_levels: usize,
    conn: &mut SqliteConnection,
) -> Result<Vec<AffiliateProfile>, AffiliateLedgerError> {
    let q = format!(
        "WITH RECURSIVE chain (id, lvl) AS ( \
            SELECT parent_affiliate_id, 1 FROM affiliate_profiles \
                WHERE id = $1 AND parent_affiliate_id IS NOT NULL \
            UNION ALL \
            SELECT p.parent_affiliate_id, c.lvl + 1 FROM affiliate_profiles p \
                JOIN chain c ON p.id = c.id \
                WHERE p.parent_affiliate_id IS NOT NULL AND c.lvl < $2 \
         ) \
         SELECT {PROFILE_COLUMNS} FROM affiliate_profiles \
         WHERE id IN (SELECT id FROM chain) \
         ORDER BY (SELECT lvl FROM chain WHERE chain.id = affiliate_profiles.id)"
    );
    let ancestors = sqlx::query_as::<_, AffiliateProfile>(&q)
        .bind(affiliate_id)
        .bind(max_levels as i64)
        .fetch_all(conn)
        .await?;
    Ok(ancestors)
}

pub async fn transaction_by_id(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CommissionTransaction>, AffiliateLedgerError> {
    let q = format!("SELECT {TRANSACTION_COLUMNS} FROM commission_transactions WHERE id = $1");
    let tx = sqlx::query_as::<_, CommissionTransaction>(&q).bind(transaction_id).fetch_optional(conn).await?;
    Ok(tx)
}

/// Records every share of the plan: one PENDING transaction row plus atomic balance/earnings
/// increments per affiliate, and the referral-count bump for the direct affiliate. Embed this in a
/// transaction; a duplicate (affiliate, order, level) row trips the partial unique index and the
/// whole call fails with `AlreadyDistributed`.
pub async fn record_commissions(
    order_id: i64,
    plan: &CommissionPlan,
    conn: &mut SqliteConnection,
) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError> {
    let mut recorded = Vec::with_capacity(plan.shares.len());
    for share in &plan.shares {
        let inserted = sqlx::query(
            "INSERT INTO commission_transactions (affiliate_id, order_id, amount, level, status) \
             VALUES ($1, $2, $3, $4, 'PENDING')",
        )
        .bind(share.affiliate_id)
        .bind(order_id)
        .bind(share.amount)
        .bind(share.level)
        .execute(&mut *conn)
        .await;
        let transaction_id = match inserted {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if matches!(e.kind(), SqlxErrorKind::UniqueViolation) => {
                warn!(
                    "🗃️ Commission for order #{order_id} was already distributed to affiliate #{}",
                    share.affiliate_id
                );
                return Err(AffiliateLedgerError::AlreadyDistributed {
                    order_id,
                    affiliate_id: share.affiliate_id,
                });
            },
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            "UPDATE affiliate_profiles SET \
                commission_balance = commission_balance + $1, \
                total_earned = total_earned + $1, \
                monthly_earnings = monthly_earnings + $1, \
                total_referrals = total_referrals + $2, \
                updated_at = CURRENT_TIMESTAMP \
             WHERE id = $3",
        )
        .bind(share.amount)
        .bind(if share.level == 0 { 1i64 } else { 0 })
        .bind(share.affiliate_id)
        .execute(&mut *conn)
        .await?;

        let tx = transaction_by_id(transaction_id, &mut *conn).await?.ok_or_else(|| {
            AffiliateLedgerError::DatabaseError("Commission transaction missing immediately after insert".to_string())
        })?;
        trace!("🗃️ Level {} commission of {} recorded for affiliate #{}", share.level, share.amount, share.affiliate_id);
        recorded.push(tx);
    }
    Ok(recorded)
}

/// Guarded withdrawal debit: the balance check and the decrement are one statement.
pub async fn request_withdrawal(
    affiliate_id: i64,
    amount: Fcfa,
    conn: &mut SqliteConnection,
) -> Result<CommissionTransaction, AffiliateLedgerError> {
    let debited = sqlx::query(
        "UPDATE affiliate_profiles SET commission_balance = commission_balance - $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND commission_balance >= $1",
    )
    .bind(amount)
    .bind(affiliate_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if debited == 0 {
        let available = affiliate_by_id(affiliate_id, &mut *conn)
            .await?
            .map(|p| p.commission_balance)
            .unwrap_or_else(Fcfa::zero);
        return Err(AffiliateLedgerError::InsufficientBalance { requested: amount, available });
    }

    let done = sqlx::query(
        "INSERT INTO commission_transactions (affiliate_id, order_id, amount, level, status) \
         VALUES ($1, NULL, $2, 0, 'PENDING')",
    )
    .bind(affiliate_id)
    .bind(-amount)
    .execute(&mut *conn)
    .await?;
    transaction_by_id(done.last_insert_rowid(), conn).await?.ok_or_else(|| {
        AffiliateLedgerError::DatabaseError("Withdrawal transaction missing immediately after insert".to_string())
    })
}

pub async fn settle_withdrawal(
    withdrawal_id: i64,
    outcome: WithdrawalOutcome,
    conn: &mut SqliteConnection,
) -> Result<CommissionTransaction, AffiliateLedgerError> {
    let tx = transaction_by_id(withdrawal_id, &mut *conn)
        .await?
        .filter(CommissionTransaction::is_withdrawal)
        .ok_or(AffiliateLedgerError::WithdrawalNotFound(withdrawal_id))?;
    if tx.status != CommissionStatus::Pending {
        return Err(AffiliateLedgerError::WithdrawalNotPending(withdrawal_id));
    }

    match outcome {
        WithdrawalOutcome::Approved => {
            sqlx::query(
                "UPDATE commission_transactions SET status = 'APPROVED', updated_at = CURRENT_TIMESTAMP WHERE id = $1",
            )
            .bind(withdrawal_id)
            .execute(&mut *conn)
            .await?;
        },
        WithdrawalOutcome::Rejected { reason } => {
            // the ledger row carries a negative amount; negating it refunds the request
            sqlx::query(
                "UPDATE affiliate_profiles SET commission_balance = commission_balance + $1, \
                 updated_at = CURRENT_TIMESTAMP WHERE id = $2",
            )
            .bind(-tx.amount)
            .bind(tx.affiliate_id)
            .execute(&mut *conn)
            .await?;
            sqlx::query(
                "UPDATE commission_transactions SET status = 'REJECTED', notes = $1, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $2",
            )
            .bind(reason)
            .bind(withdrawal_id)
            .execute(&mut *conn)
            .await?;
        },
    }

    transaction_by_id(withdrawal_id, conn).await?.ok_or(AffiliateLedgerError::WithdrawalNotFound(withdrawal_id))
}

pub async fn commissions_for_affiliate(
    affiliate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError> {
    let q = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM commission_transactions WHERE affiliate_id = $1 \
         ORDER BY created_at DESC, id DESC"
    );
    let transactions = sqlx::query_as::<_, CommissionTransaction>(&q).bind(affiliate_id).fetch_all(conn).await?;
    Ok(transactions)
}

pub async fn withdrawals_by_status(
    status: Option<CommissionStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<CommissionTransaction>, AffiliateLedgerError> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {TRANSACTION_COLUMNS} FROM commission_transactions WHERE order_id IS NULL"
    ));
    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    let withdrawals = builder.build_query_as::<CommissionTransaction>().fetch_all(conn).await?;
    Ok(withdrawals)
}
