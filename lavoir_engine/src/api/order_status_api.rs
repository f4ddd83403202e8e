use log::*;

use crate::{
    api::errors::OrderStatusError,
    db_types::{Actor, Order, OrderStatusType},
    events::{EventProducers, OrderStatusChangedEvent},
    traits::OrderManagement,
};

/// `OrderStatusApi` governs the fulfilment lifecycle of orders.
///
/// Transitions are validated against the table on [`OrderStatusType`] and gated on the actor's role.
/// Persisting a transition also writes the status audit log, and entering `DELIVERED` records the
/// delivery statistics — all inside the backend's transaction. The status-changed event is emitted
/// afterwards, best-effort: notification trouble never rolls a transition back.
pub struct OrderStatusApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> OrderStatusApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderStatusApi<B>
where B: OrderManagement
{
    /// Advances an order along the fulfilment chain.
    pub async fn transition(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        actor: &Actor,
    ) -> Result<Order, OrderStatusError> {
        let order = self.authorize_and_fetch(order_id, actor).await?;
        if !order.status.can_transition_to(new_status) {
            warn!(
                "📦️ Rejected transition of order #{order_id} from {} to {new_status} by [{}]",
                order.status, actor.id
            );
            return Err(OrderStatusError::InvalidTransition { from: order.status, to: new_status });
        }
        self.persist_and_notify(order, new_status, actor).await
    }

    /// Cancels an order. Cancellation is deliberately *not* part of the transition table: it is the
    /// one out-of-band exception, reachable from every non-terminal status through this method only.
    pub async fn cancel(&self, order_id: i64, actor: &Actor) -> Result<Order, OrderStatusError> {
        let order = self.authorize_and_fetch(order_id, actor).await?;
        if order.status.is_terminal() {
            return Err(OrderStatusError::AlreadyTerminal(order.status));
        }
        self.persist_and_notify(order, OrderStatusType::Cancelled, actor).await
    }

    async fn authorize_and_fetch(&self, order_id: i64, actor: &Actor) -> Result<Order, OrderStatusError> {
        if !actor.role.may_update_orders() {
            warn!("📦️ [{}] with role {} tried to update order #{order_id}", actor.id, actor.role);
            return Err(OrderStatusError::Unauthorized { role: actor.role });
        }
        self.db.fetch_order(order_id).await?.ok_or(OrderStatusError::OrderNotFound(order_id))
    }

    async fn persist_and_notify(
        &self,
        order: Order,
        new_status: OrderStatusType,
        actor: &Actor,
    ) -> Result<Order, OrderStatusError> {
        let previous = order.status;
        let updated = self.db.update_order_status(order.id, new_status, &actor.id).await?;
        info!("📦️ Order #{} moved from {previous} to {new_status} by [{}]", order.id, actor.id);
        for emitter in &self.producers.status_changed_producer {
            emitter.publish_event(OrderStatusChangedEvent::new(updated.clone(), previous)).await;
        }
        Ok(updated)
    }
}
