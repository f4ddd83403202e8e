use chrono::{DateTime, Utc};
use lavoir_common::Fcfa;
use log::trace;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{DiscountType, Offer},
    traits::OfferStoreError,
};

/// The `offers` row without its article list; assembled into an [`Offer`] after the join table is
/// read.
#[derive(Debug, Clone, FromRow)]
struct OfferRow {
    id: i64,
    name: String,
    discount_type: DiscountType,
    discount_value: i64,
    min_purchase_amount: Option<Fcfa>,
    max_discount_amount: Option<Fcfa>,
    points_required: Option<i64>,
    is_cumulative: bool,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    is_active: bool,
}

impl OfferRow {
    fn into_offer(self, article_ids: Vec<i64>) -> Offer {
        Offer {
            id: self.id,
            name: self.name,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_purchase_amount: self.min_purchase_amount,
            max_discount_amount: self.max_discount_amount,
            points_required: self.points_required,
            is_cumulative: self.is_cumulative,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
            article_ids,
        }
    }
}

/// Fetches the requested offers that are live at `now`, with their article lists.
pub async fn fetch_offers_for_checkout(
    offer_ids: &[i64],
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Offer>, OfferStoreError> {
    if offer_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new(
        "SELECT id, name, discount_type, discount_value, min_purchase_amount, max_discount_amount, \
         points_required, is_cumulative, start_date, end_date, is_active \
         FROM offers WHERE is_active = 1 AND start_date <= ",
    );
    builder.push_bind(now);
    builder.push(" AND end_date >= ");
    builder.push_bind(now);
    builder.push(" AND id IN (");
    let mut ids = builder.separated(", ");
    for id in offer_ids {
        ids.push_bind(*id);
    }
    builder.push(")");

    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OfferRow>().fetch_all(&mut *conn).await?;

    let mut offers = Vec::with_capacity(rows.len());
    for row in rows {
        let article_ids: Vec<i64> =
            sqlx::query_scalar("SELECT article_id FROM offer_articles WHERE offer_id = $1")
                .bind(row.id)
                .fetch_all(&mut *conn)
                .await?;
        offers.push(row.into_offer(article_ids));
    }
    trace!("🗃️ {} live offer(s) fetched of {} requested", offers.len(), offer_ids.len());
    Ok(offers)
}
