//! Database backends for the Lavoir order engine.
//!
//! You should never need to reach into this module directly: use the public APIs, which drive the
//! backends through the traits in [`crate::traits`]. The one public piece per backend is its
//! database type (e.g. [`sqlite::SqliteDatabase`]) plus the pool/migration helpers.
#[cfg(feature = "sqlite")]
pub mod sqlite;
