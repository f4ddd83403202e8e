//! Lavoir Order Engine
//!
//! Lavoir is a laundry/delivery marketplace. This library contains the core order economics of the
//! platform: per-line price resolution, offer and loyalty-point discount stacking, multi-level
//! affiliate commission distribution, and the order fulfilment state machine. It is
//! provider-agnostic: HTTP controllers, authentication, catalogue CRUD and notification delivery
//! live elsewhere and talk to this engine through its public API.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`], [`mod@traits`]). SQLite is the supported backend.
//!    You should never need to access the database directly; instead, use the public APIs. The
//!    exception is the data types used in the database, which are defined in the [`db_types`]
//!    module and are public.
//! 2. The engine public API ([`mod@api`]): pricing, discounts, commissions, order status, and the
//!    checkout orchestrator. Each API is generic over the storage traits it needs.
//! 3. The event layer ([`mod@events`]): a fire-and-forget hook system the embedding application
//!    uses to send notifications when orders are created, statuses change, commissions land or
//!    withdrawals move. Event delivery can never fail or roll back an engine operation.
mod api;
mod db;

pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, new_pool, run_migrations, SqliteDatabase};

pub use api::{
    commission_api::{
        CommissionApi,
        DEFAULT_COMMISSION_RATE,
        MAX_PARENT_LEVELS,
        PARENT_COMMISSION_RATE,
    },
    discount_api::DiscountApi,
    errors::{CheckoutError, CommissionError, DiscountError, ErrorKind, OrderStatusError, PricingError},
    order_flow_api::OrderFlowApi,
    order_objects,
    order_status_api::OrderStatusApi,
    pricing_api::{line_total, PriceResolution, PricingApi, DEFAULT_PRICE_CACHE_TTL},
};
