use sqlx::{migrate::Migrator, sqlite::SqlitePoolOptions, SqlitePool};

static MIGRATOR: Migrator = sqlx::migrate!("./src/db/sqlite/migrations");

/// The database URL, from `LAVOIR_DATABASE_URL` or a local default.
pub fn db_url() -> String {
    std::env::var("LAVOIR_DATABASE_URL").unwrap_or_else(|_| "sqlite://data/lavoir.db".to_string())
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new().max_connections(max_connections).connect(url).await
}

/// Applies the embedded schema migrations to the given pool.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
