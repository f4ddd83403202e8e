use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{LoyaltyAccount, LoyaltyEntryKind},
    traits::LoyaltyError,
};

const ACCOUNT_COLUMNS: &str = "user_id, points_balance, total_earned, updated_at";

pub async fn account(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<LoyaltyAccount>, LoyaltyError> {
    let q = format!("SELECT {ACCOUNT_COLUMNS} FROM loyalty_accounts WHERE user_id = $1");
    let account = sqlx::query_as::<_, LoyaltyAccount>(&q).bind(user_id).fetch_optional(conn).await?;
    Ok(account)
}

/// Fetches the account, creating an empty one first if the user has none yet.
pub async fn ensure_account(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<LoyaltyAccount, LoyaltyError> {
    sqlx::query("INSERT INTO loyalty_accounts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    account(user_id, conn)
        .await?
        .ok_or_else(|| LoyaltyError::DatabaseError("Loyalty account missing immediately after creation".to_string()))
}

async fn journal(
    user_id: &str,
    points: i64,
    kind: LoyaltyEntryKind,
    source: &str,
    reference_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<(), LoyaltyError> {
    sqlx::query(
        "INSERT INTO loyalty_transactions (user_id, points, kind, source, reference_id) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(points)
    .bind(kind)
    .bind(source)
    .bind(reference_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn credit(
    user_id: &str,
    points: i64,
    source: &str,
    reference_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<LoyaltyAccount, LoyaltyError> {
    if points <= 0 {
        return Err(LoyaltyError::InvalidPointAmount(points));
    }
    sqlx::query(
        "INSERT INTO loyalty_accounts (user_id, points_balance, total_earned) VALUES ($1, $2, $2) \
         ON CONFLICT (user_id) DO UPDATE SET \
            points_balance = points_balance + excluded.points_balance, \
            total_earned = total_earned + excluded.total_earned, \
            updated_at = CURRENT_TIMESTAMP",
    )
    .bind(user_id)
    .bind(points)
    .execute(&mut *conn)
    .await?;
    journal(user_id, points, LoyaltyEntryKind::Earned, source, reference_id, &mut *conn).await?;
    debug!("🗃️ Credited {points} loyalty point(s) to [{user_id}] ({source})");
    ensure_account(user_id, conn).await
}

/// Guarded debit: the balance check and the decrement are one statement, so concurrent spends can
/// never drive the balance negative.
pub async fn debit(
    user_id: &str,
    points: i64,
    source: &str,
    reference_id: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<LoyaltyAccount, LoyaltyError> {
    if points <= 0 {
        return Err(LoyaltyError::InvalidPointAmount(points));
    }
    let debited = sqlx::query(
        "UPDATE loyalty_accounts SET points_balance = points_balance - $1, updated_at = CURRENT_TIMESTAMP \
         WHERE user_id = $2 AND points_balance >= $1",
    )
    .bind(points)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if debited == 0 {
        let available = account(user_id, &mut *conn).await?.map(|a| a.points_balance).unwrap_or(0);
        return Err(LoyaltyError::InsufficientPoints { requested: points, available });
    }
    journal(user_id, points, LoyaltyEntryKind::Spent, source, reference_id, &mut *conn).await?;
    debug!("🗃️ Debited {points} loyalty point(s) from [{user_id}] ({source})");
    ensure_account(user_id, conn).await
}
