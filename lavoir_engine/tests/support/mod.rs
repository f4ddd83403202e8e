// not every test binary uses every helper
#![allow(dead_code)]

use chrono::{Duration, Utc};
use lavoir_engine::{run_migrations, SqliteDatabase};
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Creates a throwaway SQLite database with the full schema applied.
pub async fn new_test_db() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/lavoir_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    let _ = Sqlite::drop_database(&url).await;
    Sqlite::create_database(&url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    run_migrations(db.pool()).await.expect("Error running DB migrations");
    db
}

pub async fn seed_service_type(db: &SqliteDatabase, name: &str, default_mode: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO service_types (name, default_pricing_mode) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(default_mode)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding service type")
}

pub async fn seed_price(
    db: &SqliteDatabase,
    article_id: i64,
    service_type_id: i64,
    base_price: i64,
    premium_price: i64,
    price_per_kg: Option<i64>,
    mode: &str,
) {
    sqlx::query(
        "INSERT INTO article_service_prices (article_id, service_type_id, base_price, premium_price, price_per_kg, \
         pricing_mode) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(article_id)
    .bind(service_type_id)
    .bind(base_price)
    .bind(premium_price)
    .bind(price_per_kg)
    .bind(mode)
    .execute(db.pool())
    .await
    .expect("Error seeding price record");
}

pub struct OfferFixture {
    pub name: &'static str,
    pub discount_type: &'static str,
    pub discount_value: i64,
    pub min_purchase_amount: Option<i64>,
    pub max_discount_amount: Option<i64>,
    pub points_required: Option<i64>,
    pub is_cumulative: bool,
    pub article_ids: Vec<i64>,
}

impl Default for OfferFixture {
    fn default() -> Self {
        Self {
            name: "test offer",
            discount_type: "PERCENTAGE",
            discount_value: 10,
            min_purchase_amount: None,
            max_discount_amount: None,
            points_required: None,
            is_cumulative: false,
            article_ids: vec![1],
        }
    }
}

pub async fn seed_offer(db: &SqliteDatabase, fixture: OfferFixture) -> i64 {
    let offer_id: i64 = sqlx::query_scalar(
        "INSERT INTO offers (name, discount_type, discount_value, min_purchase_amount, max_discount_amount, \
         points_required, is_cumulative, start_date, end_date, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 1) RETURNING id",
    )
    .bind(fixture.name)
    .bind(fixture.discount_type)
    .bind(fixture.discount_value)
    .bind(fixture.min_purchase_amount)
    .bind(fixture.max_discount_amount)
    .bind(fixture.points_required)
    .bind(fixture.is_cumulative)
    .bind(Utc::now() - Duration::days(1))
    .bind(Utc::now() + Duration::days(1))
    .fetch_one(db.pool())
    .await
    .expect("Error seeding offer");
    for article_id in fixture.article_ids {
        sqlx::query("INSERT INTO offer_articles (offer_id, article_id) VALUES ($1, $2)")
            .bind(offer_id)
            .bind(article_id)
            .execute(db.pool())
            .await
            .expect("Error seeding offer article");
    }
    offer_id
}

pub struct AffiliateFixture {
    pub code: &'static str,
    pub parent: Option<i64>,
    pub is_active: bool,
    pub status: &'static str,
    pub balance: i64,
    pub commission_rate: Option<f64>,
    pub level_rate: Option<f64>,
}

impl Default for AffiliateFixture {
    fn default() -> Self {
        Self {
            code: "CODE",
            parent: None,
            is_active: true,
            status: "ACTIVE",
            balance: 0,
            commission_rate: None,
            level_rate: None,
        }
    }
}

pub async fn seed_affiliate(db: &SqliteDatabase, fixture: AffiliateFixture) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO affiliate_profiles (user_id, affiliate_code, parent_affiliate_id, commission_rate, level_rate, \
         commission_balance, is_active, status) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(format!("user-{}", fixture.code))
    .bind(fixture.code)
    .bind(fixture.parent)
    .bind(fixture.commission_rate)
    .bind(fixture.level_rate)
    .bind(fixture.balance)
    .bind(fixture.is_active)
    .bind(fixture.status)
    .fetch_one(db.pool())
    .await
    .expect("Error seeding affiliate profile")
}

/// Inserts a minimal PENDING order directly, bypassing the checkout flow.
pub async fn seed_order(db: &SqliteDatabase, user_id: &str, total_amount: i64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO orders (user_id, service_type_id, address_id, status, subtotal, total_amount, payment_method) \
         VALUES ($1, 1, 1, 'PENDING', $2, $2, 'CASH') RETURNING id",
    )
    .bind(user_id)
    .bind(total_amount)
    .fetch_one(db.pool())
    .await
    .expect("Error seeding order")
}

pub async fn count(db: &SqliteDatabase, query: &str) -> i64 {
    sqlx::query_scalar(query).fetch_one(db.pool()).await.expect("Error counting rows")
}

pub async fn affiliate_balance(db: &SqliteDatabase, affiliate_id: i64) -> i64 {
    sqlx::query_scalar("SELECT commission_balance FROM affiliate_profiles WHERE id = $1")
        .bind(affiliate_id)
        .fetch_one(db.pool())
        .await
        .expect("Error fetching affiliate balance")
}
