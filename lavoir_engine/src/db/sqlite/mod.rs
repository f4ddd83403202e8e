mod affiliates;
mod db;
mod loyalty;
mod offers;
mod orders;
mod prices;
mod sqlite_impl;

pub use db::{db_url, new_pool, run_migrations};
pub use sqlite_impl::SqliteDatabase;
