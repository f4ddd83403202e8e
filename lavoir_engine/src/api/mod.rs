//! # Lavoir engine public API
//!
//! The `api` module exposes the programmatic API of the order engine. The API is modular: clients
//! pick the pieces they need, and different parts can run against different backends if a
//! deployment calls for it.
//!
//! * [`pricing_api`] resolves price records (strict or bootstrap mode) and computes line prices.
//! * [`discount_api`] stacks offers and loyalty-point redemption on top of an order subtotal.
//! * [`commission_api`] distributes affiliate commissions and manages withdrawals.
//! * [`order_status_api`] governs the order fulfilment state machine.
//! * [`order_flow_api`] is the checkout orchestrator composing the above.
//!
//! # API usage
//!
//! The pattern for all the APIs is the same: an API instance is created by supplying a database
//! backend that implements the storage traits the API needs.
//!
//! ```rust,ignore
//! use lavoir_engine::{OrderFlowApi, SqliteDatabase};
//! use lavoir_engine::events::EventProducers;
//! let db = SqliteDatabase::new_with_url("sqlite://data/lavoir.db", 25).await?;
//! // SqliteDatabase implements CheckoutDatabase
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let result = api.checkout(order_request).await?;
//! ```

pub mod commission_api;
pub mod discount_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_status_api;
pub mod pricing_api;
