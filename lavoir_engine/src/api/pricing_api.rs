use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use lavoir_common::{parse_boolean_flag, Fcfa};
use log::*;

use crate::{
    api::errors::PricingError,
    db_types::{PriceRecord, PriceUpdate, PricingMode},
    traits::PricingStore,
};

pub const DEFAULT_PRICE_CACHE_TTL: Duration = Duration::from_secs(60);

/// What a price resolution does when no record is configured for the requested pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceResolution {
    /// Fail with [`PricingError::PriceNotConfigured`]. The default for checkout paths, so missing
    /// price setup surfaces loudly instead of silently billing 1 franc.
    #[default]
    Strict,
    /// Materialise a 1-franc default record and carry on. Meant for admin tooling and catalogue
    /// imports; every bootstrap is logged at warn level.
    Bootstrap,
}

impl PriceResolution {
    /// Reads the `LAVOIR_STRICT_PRICES` flag. Unset or unparseable means strict.
    pub fn from_env() -> Self {
        if parse_boolean_flag(std::env::var("LAVOIR_STRICT_PRICES").ok(), true) {
            PriceResolution::Strict
        } else {
            PriceResolution::Bootstrap
        }
    }
}

/// A time-boxed, process-local cache in front of price lookups.
///
/// Writes through the owning [`PricingApi`] invalidate the touched pair synchronously. The cache is
/// *not* coherent across multiple server instances: a price write on one instance leaves stale
/// entries on the others until their TTL lapses. Deployments that cannot tolerate that window need a
/// shared invalidation channel in front of this engine.
struct PriceCache {
    ttl: Duration,
    entries: Mutex<HashMap<(i64, i64), (PriceRecord, Instant)>>,
}

impl PriceCache {
    fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    fn get(&self, article_id: i64, service_type_id: i64) -> Option<PriceRecord> {
        let entries = self.entries.lock().unwrap();
        entries.get(&(article_id, service_type_id)).and_then(|(record, stored_at)| {
            if stored_at.elapsed() < self.ttl {
                Some(record.clone())
            } else {
                None
            }
        })
    }

    fn put(&self, record: PriceRecord) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert((record.article_id, record.service_type_id), (record, Instant::now()));
    }

    fn invalidate(&self, article_id: i64, service_type_id: i64) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(&(article_id, service_type_id));
    }
}

/// `PricingApi` resolves price records and computes line prices.
pub struct PricingApi<B> {
    db: B,
    resolution: PriceResolution,
    cache: PriceCache,
}

impl<B> PricingApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, resolution: PriceResolution::default(), cache: PriceCache::new(DEFAULT_PRICE_CACHE_TTL) }
    }

    pub fn with_resolution(mut self, resolution: PriceResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = PriceCache::new(ttl);
        self
    }

    pub fn resolution(&self) -> PriceResolution {
        self.resolution
    }
}

impl<B> PricingApi<B>
where B: PricingStore
{
    /// Resolves the price record for the pair using the configured resolution mode.
    pub async fn resolve(&self, article_id: i64, service_type_id: i64) -> Result<PriceRecord, PricingError> {
        match self.resolution {
            PriceResolution::Strict => self.resolve_or_fail(article_id, service_type_id).await,
            PriceResolution::Bootstrap => self.resolve_or_bootstrap(article_id, service_type_id).await,
        }
    }

    /// Strict resolution: a missing record is a configuration error.
    pub async fn resolve_or_fail(&self, article_id: i64, service_type_id: i64) -> Result<PriceRecord, PricingError> {
        if let Some(record) = self.cache.get(article_id, service_type_id) {
            trace!("🏷️ Price cache hit for article #{article_id}/service #{service_type_id}");
            return Ok(record);
        }
        let record = self
            .db
            .fetch_price(article_id, service_type_id)
            .await?
            .ok_or(PricingError::PriceNotConfigured { article_id, service_type_id })?;
        self.cache.put(record.clone());
        Ok(record)
    }

    /// Bootstrap resolution: a missing record is materialised with 1-franc defaults.
    pub async fn resolve_or_bootstrap(
        &self,
        article_id: i64,
        service_type_id: i64,
    ) -> Result<PriceRecord, PricingError> {
        if let Some(record) = self.cache.get(article_id, service_type_id) {
            return Ok(record);
        }
        let record = match self.db.fetch_price(article_id, service_type_id).await? {
            Some(record) => record,
            None => {
                warn!(
                    "🏷️ No price configured for article #{article_id} on service type #{service_type_id}. \
                     Bootstrapping a default record. If this pair should be purchasable, set its real prices."
                );
                self.db.bootstrap_price(article_id, service_type_id).await?
            },
        };
        self.cache.put(record.clone());
        Ok(record)
    }

    /// Admin write path. Upserts the record and synchronously invalidates the cached pair.
    pub async fn update_price(&self, update: &PriceUpdate) -> Result<PriceRecord, PricingError> {
        let record = self.db.upsert_price(update).await?;
        self.cache.invalidate(update.article_id, update.service_type_id);
        debug!("🏷️ Price for article #{}/service #{} updated", update.article_id, update.service_type_id);
        Ok(record)
    }
}

/// Computes the price of one order line from its resolved price record.
///
/// Any computed amount ≤ 0 is floored to 1 franc. The floor is deliberate policy (a line is never
/// free or negative on the invoice), which also means subscription-covered lines are billed the
/// symbolic 1 franc.
pub fn line_total(
    record: &PriceRecord,
    quantity: u32,
    weight: Option<f64>,
    is_premium: bool,
) -> Result<Fcfa, PricingError> {
    if !record.is_available {
        return Err(PricingError::ArticleUnavailable {
            article_id: record.article_id,
            service_type_id: record.service_type_id,
        });
    }
    let raw = match record.pricing_mode {
        PricingMode::PerItem => {
            let unit = if is_premium { record.premium_price } else { record.base_price };
            unit * i64::from(quantity)
        },
        PricingMode::PerWeight => {
            let weight = weight.ok_or(PricingError::MissingWeight { article_id: record.article_id })?;
            let rate = record.price_per_kg.ok_or(PricingError::MissingRateConfig {
                article_id: record.article_id,
                service_type_id: record.service_type_id,
            })?;
            #[allow(clippy::cast_possible_truncation)]
            let amount = (rate.value() as f64 * weight).floor() as i64;
            Fcfa::from(amount)
        },
        PricingMode::Subscription => Fcfa::zero(),
    };
    if raw.value() <= 0 {
        debug!(
            "🏷️ Computed line total {raw} for article #{} floored to 1 franc",
            record.article_id
        );
        Ok(Fcfa::from(1))
    } else {
        Ok(raw)
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn record(mode: PricingMode) -> PriceRecord {
        PriceRecord {
            id: 1,
            article_id: 10,
            service_type_id: 20,
            base_price: Fcfa::from(2_500),
            premium_price: Fcfa::from(4_000),
            price_per_kg: Some(Fcfa::from(1_500)),
            pricing_mode: mode,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn per_item_uses_base_or_premium_price() {
        let r = record(PricingMode::PerItem);
        assert_eq!(line_total(&r, 2, None, false).unwrap(), Fcfa::from(5_000));
        assert_eq!(line_total(&r, 2, None, true).unwrap(), Fcfa::from(8_000));
    }

    #[test]
    fn per_weight_requires_a_weight() {
        let r = record(PricingMode::PerWeight);
        assert!(matches!(line_total(&r, 1, None, false), Err(PricingError::MissingWeight { article_id: 10 })));
        assert_eq!(line_total(&r, 1, Some(2.5), false).unwrap(), Fcfa::from(3_750));
    }

    #[test]
    fn per_weight_requires_a_configured_rate() {
        let mut r = record(PricingMode::PerWeight);
        r.price_per_kg = None;
        assert!(matches!(line_total(&r, 1, Some(2.0), false), Err(PricingError::MissingRateConfig { .. })));
    }

    #[test]
    fn totals_are_floored_to_one_franc() {
        let mut r = record(PricingMode::PerItem);
        r.base_price = Fcfa::zero();
        assert_eq!(line_total(&r, 3, None, false).unwrap(), Fcfa::from(1));
        // subscription lines cost the symbolic franc too
        let r = record(PricingMode::Subscription);
        assert_eq!(line_total(&r, 5, None, false).unwrap(), Fcfa::from(1));
        // tiny weighed loads round down to zero, then hit the floor
        let r = record(PricingMode::PerWeight);
        assert_eq!(line_total(&r, 1, Some(0.0001), false).unwrap(), Fcfa::from(1));
    }

    #[test]
    fn unavailable_articles_are_rejected() {
        let mut r = record(PricingMode::PerItem);
        r.is_available = false;
        assert!(matches!(line_total(&r, 1, None, false), Err(PricingError::ArticleUnavailable { .. })));
    }
}
