use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderLine, OrderStatusType, PricedLine},
    traits::{OrderManagementError, OrderQueryFilter},
};

const ORDER_COLUMNS: &str = "id, user_id, service_type_id, address_id, status, subtotal, total_amount, \
                             affiliate_code, payment_method, is_recurring, recurrence_type, collection_date, \
                             delivery_date, created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, order_id, article_id, service_type_id, quantity, unit_price, is_premium, weight, line_total";

/// Inserts a new order in `PENDING` status and returns its id. This is not atomic on its own: embed
/// it in a transaction together with the order's lines.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<i64, OrderManagementError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (user_id, service_type_id, address_id, status, subtotal, total_amount, affiliate_code, \
         payment_method, is_recurring, recurrence_type, collection_date, delivery_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING id",
    )
    .bind(&order.user_id)
    .bind(order.service_type_id)
    .bind(order.address_id)
    .bind(OrderStatusType::Pending)
    .bind(order.subtotal)
    .bind(order.total_amount)
    .bind(&order.affiliate_code)
    .bind(&order.payment_method)
    .bind(order.is_recurring)
    .bind(&order.recurrence_type)
    .bind(order.collection_date)
    .bind(order.delivery_date)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{id} has been saved in the DB for user [{}]", order.user_id);
    Ok(id)
}

pub async fn insert_lines(
    order_id: i64,
    lines: &[PricedLine],
    conn: &mut SqliteConnection,
) -> Result<(), OrderManagementError> {
    for line in lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, article_id, service_type_id, quantity, unit_price, is_premium, \
             weight, line_total) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(order_id)
        .bind(line.article_id)
        .bind(line.service_type_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.is_premium)
        .bind(line.weight)
        .bind(line.line_total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderManagementError> {
    let q = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&q).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, OrderManagementError> {
    let q = format!("SELECT {LINE_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC");
    let lines = sqlx::query_as::<_, OrderLine>(&q).bind(order_id).fetch_all(conn).await?;
    Ok(lines)
}

/// Records a status change: the order row, the status-log entry, and — on entering `DELIVERED` —
/// the delivery-history statistics row. Embed this in a transaction.
pub async fn update_order_status(
    order_id: i64,
    new_status: OrderStatusType,
    changed_by: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    let order =
        fetch_order(order_id, &mut *conn).await?.ok_or(OrderManagementError::OrderNotFound(order_id))?;
    sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(new_status)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO order_status_log (order_id, previous_status, new_status, changed_by) VALUES ($1, $2, $3, $4)",
    )
    .bind(order_id)
    .bind(order.status)
    .bind(new_status)
    .bind(changed_by)
    .execute(&mut *conn)
    .await?;

    if new_status == OrderStatusType::Delivered && order.status != OrderStatusType::Delivered {
        sqlx::query("INSERT INTO delivery_history (order_id, user_id, total_amount) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(&order.user_id)
            .bind(order.total_amount)
            .execute(&mut *conn)
            .await?;
        trace!("🗃️ Delivery of order #{order_id} recorded in the statistics history");
    }

    fetch_order(order_id, conn).await?.ok_or(OrderManagementError::OrderNotFound(order_id))
}

/// Fetches orders according to the criteria in the filter, oldest first.
pub async fn search_orders(
    filter: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderManagementError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(code) = filter.affiliate_code {
        where_clause.push("affiliate_code = ");
        where_clause.push_bind_unseparated(code);
    }
    if let Some(since) = filter.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    if !filter.statuses.is_empty() {
        let statuses =
            filter.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}
