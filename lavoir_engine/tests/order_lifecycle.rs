use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use lavoir_engine::{
    db_types::{Actor, OrderStatusType, Role},
    events::{EventHandler, EventProducers, OrderStatusChangedEvent},
    ErrorKind,
    OrderStatusApi,
    OrderStatusError,
    SqliteDatabase,
};

mod support;

fn api(db: &SqliteDatabase) -> OrderStatusApi<SqliteDatabase> {
    OrderStatusApi::new(db.clone(), EventProducers::default())
}

fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

#[tokio::test]
async fn orders_walk_the_whole_fulfilment_chain() {
    let db = support::new_test_db().await;
    let order_id = support::seed_order(&db, "alice", 4_500).await;
    let api = api(&db);

    use OrderStatusType::*;
    for status in [Collecting, Collected, Processing, Ready, Delivering, Delivered] {
        let order = api.transition(order_id, status, &admin()).await.unwrap();
        assert_eq!(order.status, status);
    }

    assert_eq!(
        support::count(&db, "SELECT COUNT(*) FROM order_status_log").await,
        6,
        "every transition leaves an audit entry"
    );
    assert_eq!(support::count(&db, "SELECT COUNT(*) FROM delivery_history").await, 1);
    let recorded: i64 = sqlx::query_scalar("SELECT total_amount FROM delivery_history WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(recorded, 4_500);
}

#[tokio::test]
async fn skipping_ahead_is_rejected() {
    let db = support::new_test_db().await;
    let order_id = support::seed_order(&db, "bob", 1_000).await;
    let api = api(&db);

    let err = api.transition(order_id, OrderStatusType::Delivered, &admin()).await.unwrap_err();
    assert!(matches!(
        err,
        OrderStatusError::InvalidTransition { from: OrderStatusType::Pending, to: OrderStatusType::Delivered }
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    // the rejected transition changed nothing
    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(status, "PENDING");
    assert_eq!(support::count(&db, "SELECT COUNT(*) FROM order_status_log").await, 0);

    let order = api.transition(order_id, OrderStatusType::Collecting, &admin()).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Collecting);
}

#[tokio::test]
async fn only_staff_and_couriers_may_transition() {
    let db = support::new_test_db().await;
    let order_id = support::seed_order(&db, "carol", 1_000).await;
    let api = api(&db);

    let err = api
        .transition(order_id, OrderStatusType::Collecting, &Actor::new("carol", Role::Client))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderStatusError::Unauthorized { role: Role::Client }));
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let order = api
        .transition(order_id, OrderStatusType::Collecting, &Actor::new("courier-7", Role::Delivery))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatusType::Collecting);
}

#[tokio::test]
async fn missing_orders_are_reported() {
    let db = support::new_test_db().await;
    let err = api(&db).transition(4_242, OrderStatusType::Collecting, &admin()).await.unwrap_err();
    assert!(matches!(err, OrderStatusError::OrderNotFound(4_242)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn cancellation_is_an_explicit_side_channel() {
    let db = support::new_test_db().await;
    let order_id = support::seed_order(&db, "dave", 1_000).await;
    let api = api(&db);

    // CANCELLED is not reachable through the transition table...
    let err = api.transition(order_id, OrderStatusType::Cancelled, &admin()).await.unwrap_err();
    assert!(matches!(err, OrderStatusError::InvalidTransition { .. }));

    // ...but cancel() reaches it from any non-terminal status
    api.transition(order_id, OrderStatusType::Collecting, &admin()).await.unwrap();
    api.transition(order_id, OrderStatusType::Collected, &admin()).await.unwrap();
    let order = api.cancel(order_id, &admin()).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);

    // terminal means terminal
    let err = api.cancel(order_id, &admin()).await.unwrap_err();
    assert!(matches!(err, OrderStatusError::AlreadyTerminal(OrderStatusType::Cancelled)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let err = api.transition(order_id, OrderStatusType::Collecting, &admin()).await.unwrap_err();
    assert!(matches!(err, OrderStatusError::InvalidTransition { .. }));
}

#[tokio::test]
async fn delivered_orders_accept_no_further_changes() {
    let db = support::new_test_db().await;
    let order_id = support::seed_order(&db, "erin", 1_000).await;
    let api = api(&db);

    use OrderStatusType::*;
    for status in [Collecting, Collected, Processing, Ready, Delivering, Delivered] {
        api.transition(order_id, status, &admin()).await.unwrap();
    }

    let err = api.cancel(order_id, &admin()).await.unwrap_err();
    assert!(matches!(err, OrderStatusError::AlreadyTerminal(Delivered)));
}

#[tokio::test]
async fn every_status_change_raises_an_event() {
    let db = support::new_test_db().await;
    let order_id = support::seed_order(&db, "frank", 1_000).await;

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let handler = EventHandler::new(8, Arc::new(move |event: OrderStatusChangedEvent| {
        let counter = counter.clone();
        Box::pin(async move {
            assert_eq!(event.recipient(), "frank");
            counter.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    let mut producers = EventProducers::default();
    producers.status_changed_producer.push(handler.subscribe());

    let api = OrderStatusApi::new(db.clone(), producers);
    api.transition(order_id, OrderStatusType::Collecting, &admin()).await.unwrap();
    api.transition(order_id, OrderStatusType::Collected, &admin()).await.unwrap();
    drop(api);

    // completes once the producers are dropped and both events are handled
    handler.start_handler().await;
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}
