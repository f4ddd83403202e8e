use lavoir_common::Fcfa;
use lavoir_engine::{
    db_types::{AffiliateCode, CommissionStatus},
    events::EventProducers,
    traits::AffiliateLedgerError,
    CommissionApi,
    CommissionError,
    ErrorKind,
    SqliteDatabase,
};

mod support;

fn api(db: &SqliteDatabase) -> CommissionApi<SqliteDatabase> {
    CommissionApi::new(db.clone(), EventProducers::default())
}

#[tokio::test]
async fn direct_and_parent_commission_amounts() {
    let db = support::new_test_db().await;
    let parent = support::seed_affiliate(&db, support::AffiliateFixture { code: "PARENT", ..Default::default() }).await;
    let child = support::seed_affiliate(&db, support::AffiliateFixture {
        code: "CHILD",
        parent: Some(parent),
        ..Default::default()
    })
    .await;

    let order_id = support::seed_order(&db, "alice", 10_000).await;
    let transactions = api(&db).distribute(order_id, &AffiliateCode::from("CHILD"), Fcfa::from(10_000)).await.unwrap();

    // 10% of the order for the direct affiliate, 10% of *that* for the parent
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].amount, Fcfa::from(1_000));
    assert_eq!(transactions[0].level, 0);
    assert_eq!(transactions[1].amount, Fcfa::from(100));
    assert_eq!(transactions[1].level, 1);
    assert!(transactions.iter().all(|t| t.status == CommissionStatus::Pending));

    assert_eq!(support::affiliate_balance(&db, child).await, 1_000);
    assert_eq!(support::affiliate_balance(&db, parent).await, 100);

    let referrals: i64 = sqlx::query_scalar("SELECT total_referrals FROM affiliate_profiles WHERE id = $1")
        .bind(child)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(referrals, 1);
}

#[tokio::test]
async fn distribution_is_at_most_once_per_order() {
    let db = support::new_test_db().await;
    let affiliate = support::seed_affiliate(&db, support::AffiliateFixture { code: "ONCE", ..Default::default() }).await;
    let order_id = support::seed_order(&db, "bob", 10_000).await;

    let api = api(&db);
    api.distribute(order_id, &AffiliateCode::from("ONCE"), Fcfa::from(10_000)).await.unwrap();
    let err = api.distribute(order_id, &AffiliateCode::from("ONCE"), Fcfa::from(10_000)).await.unwrap_err();

    assert!(matches!(
        err,
        CommissionError::Ledger(AffiliateLedgerError::AlreadyDistributed { affiliate_id, .. }) if affiliate_id == affiliate
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(support::affiliate_balance(&db, affiliate).await, 1_000);
    assert_eq!(support::count(&db, "SELECT COUNT(*) FROM commission_transactions").await, 1);
}

#[tokio::test]
async fn propagation_stops_after_three_parent_levels() {
    let db = support::new_test_db().await;
    let mut parent = None;
    let mut ids = Vec::new();
    // great-great-great-grandparent down to the direct affiliate
    for code in ["L5", "L4", "L3", "L2", "L1", "L0"] {
        let id = support::seed_affiliate(&db, support::AffiliateFixture { code, parent, ..Default::default() }).await;
        ids.push(id);
        parent = Some(id);
    }

    let order_id = support::seed_order(&db, "carol", 10_000_000).await;
    let transactions =
        api(&db).distribute(order_id, &AffiliateCode::from("L0"), Fcfa::from(10_000_000)).await.unwrap();

    assert_eq!(transactions.len(), 4);
    assert_eq!(transactions.last().unwrap().level, 3);
    // 1_000_000 -> 100_000 -> 10_000 -> 1_000; L4 and L5 get nothing
    assert_eq!(transactions.last().unwrap().amount, Fcfa::from(1_000));
    assert_eq!(support::affiliate_balance(&db, ids[1]).await, 0);
    assert_eq!(support::affiliate_balance(&db, ids[0]).await, 0);
}

#[tokio::test]
async fn only_active_affiliates_are_paid() {
    let db = support::new_test_db().await;
    support::seed_affiliate(&db, support::AffiliateFixture {
        code: "SUSPENDED",
        status: "SUSPENDED",
        ..Default::default()
    })
    .await;
    let order_id = support::seed_order(&db, "dave", 5_000).await;

    let api = api(&db);
    let err = api.distribute(order_id, &AffiliateCode::from("SUSPENDED"), Fcfa::from(5_000)).await.unwrap_err();
    assert!(matches!(err, CommissionError::AffiliateInactive(_)));

    let err = api.distribute(order_id, &AffiliateCode::from("NOBODY"), Fcfa::from(5_000)).await.unwrap_err();
    assert!(matches!(err, CommissionError::AffiliateNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn configured_rates_override_the_default() {
    let db = support::new_test_db().await;
    support::seed_affiliate(&db, support::AffiliateFixture {
        code: "RATED",
        commission_rate: Some(15.0),
        ..Default::default()
    })
    .await;
    let order_id = support::seed_order(&db, "erin", 10_000).await;

    let transactions =
        api(&db).distribute(order_id, &AffiliateCode::from("RATED"), Fcfa::from(10_000)).await.unwrap();
    assert_eq!(transactions[0].amount, Fcfa::from(1_500));
}

#[tokio::test]
async fn withdrawal_request_needs_a_sufficient_balance() {
    let db = support::new_test_db().await;
    let affiliate =
        support::seed_affiliate(&db, support::AffiliateFixture { code: "POOR", balance: 500, ..Default::default() })
            .await;

    let err = api(&db).request_withdrawal(affiliate, Fcfa::from(10_000)).await.unwrap_err();
    assert!(matches!(
        err,
        CommissionError::Ledger(AffiliateLedgerError::InsufficientBalance { requested, available })
            if requested == Fcfa::from(10_000) && available == Fcfa::from(500)
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    // the failed request left the balance untouched
    assert_eq!(support::affiliate_balance(&db, affiliate).await, 500);
}

#[tokio::test]
async fn rejected_withdrawals_refund_the_balance() {
    let db = support::new_test_db().await;
    let affiliate =
        support::seed_affiliate(&db, support::AffiliateFixture { code: "RICH", balance: 5_000, ..Default::default() })
            .await;
    let api = api(&db);

    let receipt = api.request_withdrawal(affiliate, Fcfa::from(2_000)).await.unwrap();
    assert_eq!(receipt.amount, Fcfa::from(2_000));
    assert_eq!(receipt.status, CommissionStatus::Pending);
    assert_eq!(support::affiliate_balance(&db, affiliate).await, 3_000);

    let rejected = api.reject_withdrawal(receipt.transaction_id, "missing payment details").await.unwrap();
    assert_eq!(rejected.status, CommissionStatus::Rejected);
    assert_eq!(support::affiliate_balance(&db, affiliate).await, 5_000);

    // settling twice is a conflict
    let err = api.approve_withdrawal(receipt.transaction_id).await.unwrap_err();
    assert!(matches!(err, CommissionError::Ledger(AffiliateLedgerError::WithdrawalNotPending(_))));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn approved_withdrawals_keep_the_debit() {
    let db = support::new_test_db().await;
    let affiliate =
        support::seed_affiliate(&db, support::AffiliateFixture { code: "PAID", balance: 5_000, ..Default::default() })
            .await;
    let api = api(&db);

    let receipt = api.request_withdrawal(affiliate, Fcfa::from(2_000)).await.unwrap();
    let approved = api.approve_withdrawal(receipt.transaction_id).await.unwrap();
    assert_eq!(approved.status, CommissionStatus::Approved);
    assert_eq!(support::affiliate_balance(&db, affiliate).await, 3_000);

    let pending = api.withdrawals_by_status(Some(CommissionStatus::Pending)).await.unwrap();
    assert!(pending.is_empty());
    let approved_list = api.withdrawals_by_status(Some(CommissionStatus::Approved)).await.unwrap();
    assert_eq!(approved_list.len(), 1);
}

#[tokio::test]
async fn inactive_affiliates_cannot_withdraw() {
    let db = support::new_test_db().await;
    let affiliate = support::seed_affiliate(&db, support::AffiliateFixture {
        code: "DORMANT",
        is_active: false,
        balance: 5_000,
        ..Default::default()
    })
    .await;

    let err = api(&db).request_withdrawal(affiliate, Fcfa::from(1_000)).await.unwrap_err();
    assert!(matches!(err, CommissionError::AffiliateInactive(_)));
    assert_eq!(support::affiliate_balance(&db, affiliate).await, 5_000);
}
