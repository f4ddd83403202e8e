//! Simple stateless pub-sub event handler
//!
//! Components of the engine announce what happened — an order was created, a status changed, a
//! commission landed, a withdrawal moved — through this module, and notification/delivery code on
//! the outside subscribes to react. Publishing is fire-and-forget: a full channel or a crashed
//! handler is logged and never fails the flow that raised the event, so ledger state can never be
//! rolled back by a notification problem.
//!
//! Handlers are stateless (they receive only the event itself) but may be async.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
