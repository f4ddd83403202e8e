use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    CommissionEarnedEvent,
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    WithdrawalEvent,
};

/// The producer ends of the event channels. Engine APIs hold a clone of this and publish into
/// whichever channels have subscribers; an empty producer list means nobody cares about that event.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub commission_earned_producer: Vec<EventProducer<CommissionEarnedEvent>>,
    pub withdrawal_producer: Vec<EventProducer<WithdrawalEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_commission_earned: Option<EventHandler<CommissionEarnedEvent>>,
    pub on_withdrawal: Option<EventHandler<WithdrawalEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_created: hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f)),
            on_status_changed: hooks.on_status_changed.map(|f| EventHandler::new(buffer_size, f)),
            on_commission_earned: hooks.on_commission_earned.map(|f| EventHandler::new(buffer_size, f)),
            on_withdrawal: hooks.on_withdrawal.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_commission_earned {
            result.commission_earned_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_withdrawal {
            result.withdrawal_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move { handler.start_handler().await });
        }
        if let Some(handler) = self.on_status_changed {
            tokio::spawn(async move { handler.start_handler().await });
        }
        if let Some(handler) = self.on_commission_earned {
            tokio::spawn(async move { handler.start_handler().await });
        }
        if let Some(handler) = self.on_withdrawal {
            tokio::spawn(async move { handler.start_handler().await });
        }
    }
}

/// The callbacks the embedding application wants to run on engine events. Typically these forward
/// to the notification service (`send(user_id, type, payload)` over push/email).
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_commission_earned: Option<Handler<CommissionEarnedEvent>>,
    pub on_withdrawal: Option<Handler<WithdrawalEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_commission_earned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(CommissionEarnedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_commission_earned = Some(Arc::new(f));
        self
    }

    pub fn on_withdrawal<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WithdrawalEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_withdrawal = Some(Arc::new(f));
        self
    }
}
