use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use lavoir_common::Fcfa;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------    PricingMode      ---------------------------------------------------------
/// How the price of an order line is derived from its price record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingMode {
    /// Unit price (base or premium) multiplied by the quantity.
    #[sqlx(rename = "PER_ITEM")]
    PerItem,
    /// Per-kilogram rate multiplied by the weighed load.
    #[sqlx(rename = "PER_WEIGHT")]
    PerWeight,
    /// Zero marginal cost. The customer's subscription plan covers the line.
    #[sqlx(rename = "SUBSCRIPTION")]
    Subscription,
}

impl Display for PricingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingMode::PerItem => write!(f, "PER_ITEM"),
            PricingMode::PerWeight => write!(f, "PER_WEIGHT"),
            PricingMode::Subscription => write!(f, "SUBSCRIPTION"),
        }
    }
}

impl FromStr for PricingMode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PER_ITEM" => Ok(Self::PerItem),
            "PER_WEIGHT" => Ok(Self::PerWeight),
            "SUBSCRIPTION" => Ok(Self::Subscription),
            s => Err(ConversionError(format!("Invalid pricing mode: {s}"))),
        }
    }
}

//--------------------------------------    PriceRecord      ---------------------------------------------------------
/// The stored price for an (article, service type) pair. Unique per pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: i64,
    pub article_id: i64,
    pub service_type_id: i64,
    pub base_price: Fcfa,
    pub premium_price: Fcfa,
    pub price_per_kg: Option<Fcfa>,
    pub pricing_mode: PricingMode,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    PriceUpdate      ---------------------------------------------------------
/// An admin write against a price record. Only the populated fields are changed; a missing record is
/// created with 1-franc defaults for the unset prices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub article_id: i64,
    pub service_type_id: i64,
    pub base_price: Option<Fcfa>,
    pub premium_price: Option<Fcfa>,
    pub price_per_kg: Option<Fcfa>,
    pub pricing_mode: Option<PricingMode>,
    pub is_available: Option<bool>,
}

impl PriceUpdate {
    pub fn new(article_id: i64, service_type_id: i64) -> Self {
        Self { article_id, service_type_id, ..Default::default() }
    }

    pub fn with_base_price(mut self, price: Fcfa) -> Self {
        self.base_price = Some(price);
        self
    }

    pub fn with_premium_price(mut self, price: Fcfa) -> Self {
        self.premium_price = Some(price);
        self
    }

    pub fn with_price_per_kg(mut self, price: Fcfa) -> Self {
        self.price_per_kg = Some(price);
        self
    }

    pub fn with_pricing_mode(mut self, mode: PricingMode) -> Self {
        self.pricing_mode = Some(mode);
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.is_available = Some(available);
        self
    }
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
/// The fulfilment lifecycle of an order. Orders advance monotonically along the chain below;
/// `Delivered` and `Cancelled` are terminal. No status transitions *into* `Cancelled` through the
/// normal table: cancellation is an explicit side channel on the status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// Created but not yet submitted (flash orders).
    Draft,
    /// Submitted, waiting for a collection round.
    Pending,
    /// A courier is on the way to pick the laundry up.
    Collecting,
    /// The laundry has been picked up.
    Collected,
    /// The laundry is being washed/ironed.
    Processing,
    /// Ready for delivery.
    Ready,
    /// Out for delivery.
    Delivering,
    /// Delivered to the customer. Terminal.
    Delivered,
    /// Cancelled by an admin. Terminal.
    Cancelled,
}

impl OrderStatusType {
    /// The statuses this one may advance to.
    pub fn next_statuses(self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            Draft => &[Pending],
            Pending => &[Collecting],
            Collecting => &[Collected],
            Collected => &[Processing],
            Processing => &[Ready],
            Ready => &[Delivering],
            Delivering => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, new_status: OrderStatusType) -> bool {
        self.next_statuses().contains(&new_status)
    }

    pub fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Draft => "DRAFT",
            OrderStatusType::Pending => "PENDING",
            OrderStatusType::Collecting => "COLLECTING",
            OrderStatusType::Collected => "COLLECTED",
            OrderStatusType::Processing => "PROCESSING",
            OrderStatusType::Ready => "READY",
            OrderStatusType::Delivering => "DELIVERING",
            OrderStatusType::Delivered => "DELIVERED",
            OrderStatusType::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PENDING" => Ok(Self::Pending),
            "COLLECTING" => Ok(Self::Collecting),
            "COLLECTED" => Ok(Self::Collected),
            "PROCESSING" => Ok(Self::Processing),
            "READY" => Ok(Self::Ready),
            "DELIVERING" => Ok(Self::Delivering),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    pub service_type_id: i64,
    pub address_id: i64,
    pub status: OrderStatusType,
    pub subtotal: Fcfa,
    pub total_amount: Fcfa,
    pub affiliate_code: Option<AffiliateCode>,
    pub payment_method: String,
    pub is_recurring: bool,
    pub recurrence_type: Option<String>,
    pub collection_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// The insert payload for an order. Totals are computed by the pricing flow before this is built.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub service_type_id: i64,
    pub address_id: i64,
    pub subtotal: Fcfa,
    pub total_amount: Fcfa,
    pub affiliate_code: Option<AffiliateCode>,
    pub payment_method: String,
    pub is_recurring: bool,
    pub recurrence_type: Option<String>,
    pub collection_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
}

//--------------------------------------     OrderLine       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub article_id: i64,
    pub service_type_id: i64,
    pub quantity: i64,
    pub unit_price: Fcfa,
    pub is_premium: bool,
    pub weight: Option<f64>,
    pub line_total: Fcfa,
}

/// A priced order line that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub article_id: i64,
    pub service_type_id: i64,
    pub quantity: i64,
    pub unit_price: Fcfa,
    pub is_premium: bool,
    pub weight: Option<f64>,
    pub line_total: Fcfa,
}

//--------------------------------------    DiscountType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the order subtotal.
    #[sqlx(rename = "PERCENTAGE")]
    Percentage,
    /// `discount_value` is a fixed franc amount.
    #[sqlx(rename = "FIXED_AMOUNT")]
    FixedAmount,
    /// `discount_value` francs off in exchange for `points_required` loyalty points.
    #[sqlx(rename = "POINTS_EXCHANGE")]
    PointsExchange,
}

impl Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "PERCENTAGE"),
            DiscountType::FixedAmount => write!(f, "FIXED_AMOUNT"),
            DiscountType::PointsExchange => write!(f, "POINTS_EXCHANGE"),
        }
    }
}

//--------------------------------------        Offer        ---------------------------------------------------------
/// A time-boxed promotional offer. `article_ids` is the set of articles the offer applies to, loaded
/// from the join table alongside the offer row. Treated as immutable during a discount computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub name: String,
    pub discount_type: DiscountType,
    /// Percent for [`DiscountType::Percentage`], whole francs otherwise.
    pub discount_value: i64,
    pub min_purchase_amount: Option<Fcfa>,
    pub max_discount_amount: Option<Fcfa>,
    pub points_required: Option<i64>,
    pub is_cumulative: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub article_ids: Vec<i64>,
}

impl Offer {
    pub fn applies_to_any(&self, article_ids: &[i64]) -> bool {
        article_ids.iter().any(|id| self.article_ids.contains(id))
    }
}

//--------------------------------------   LoyaltyAccount    ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub user_id: String,
    pub points_balance: i64,
    pub total_earned: i64,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    pub fn tier(&self) -> LoyaltyTier {
        LoyaltyTier::for_lifetime_points(self.total_earned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    pub fn for_lifetime_points(points: i64) -> Self {
        if points >= 10_001 {
            Self::Platinum
        } else if points >= 5_001 {
            Self::Gold
        } else if points >= 1_001 {
            Self::Silver
        } else {
            Self::Bronze
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LoyaltyEntryKind {
    Earned,
    Spent,
}

impl Display for LoyaltyEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoyaltyEntryKind::Earned => write!(f, "EARNED"),
            LoyaltyEntryKind::Spent => write!(f, "SPENT"),
        }
    }
}

/// A journal entry for a loyalty point credit or debit.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LoyaltyEntry {
    pub id: i64,
    pub user_id: String,
    pub points: i64,
    pub kind: LoyaltyEntryKind,
    pub source: String,
    pub reference_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   AffiliateCode     ---------------------------------------------------------
/// A lightweight wrapper around the referral code printed on an affiliate's marketing material.
#[derive(Debug, Clone, Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AffiliateCode(pub String);

impl Display for AffiliateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for AffiliateCode {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl AffiliateCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  AffiliateStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AffiliateStatus {
    /// Signed up, not yet vetted by an admin.
    Pending,
    /// Earning commission.
    Active,
    /// Temporarily barred from earning.
    Suspended,
}

impl Display for AffiliateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AffiliateStatus::Pending => write!(f, "PENDING"),
            AffiliateStatus::Active => write!(f, "ACTIVE"),
            AffiliateStatus::Suspended => write!(f, "SUSPENDED"),
        }
    }
}

//--------------------------------------  AffiliateProfile   ---------------------------------------------------------
/// An affiliate's ledger row. Profiles form a referral tree via `parent_affiliate_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AffiliateProfile {
    pub id: i64,
    pub user_id: String,
    pub affiliate_code: AffiliateCode,
    pub parent_affiliate_id: Option<i64>,
    /// Per-profile commission percentage, when an admin has set one.
    pub commission_rate: Option<f64>,
    /// Commission percentage granted by the affiliate's level, when one applies. Takes precedence
    /// over `commission_rate`.
    pub level_rate: Option<f64>,
    pub commission_balance: Fcfa,
    pub total_earned: Fcfa,
    pub monthly_earnings: Fcfa,
    pub total_referrals: i64,
    pub is_active: bool,
    pub status: AffiliateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AffiliateProfile {
    /// Commission is only ever paid to affiliates that are both active and vetted.
    pub fn is_payable(&self) -> bool {
        self.is_active && self.status == AffiliateStatus::Active
    }
}

//-------------------------------------- CommissionStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionStatus::Pending => write!(f, "PENDING"),
            CommissionStatus::Approved => write!(f, "APPROVED"),
            CommissionStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

//------------------------------------ CommissionTransaction -------------------------------------------------------
/// One ledger movement on an affiliate's commission balance. Order commissions carry the order id and
/// the referral level that earned them (0 = direct). Withdrawals carry a null order id and a negative
/// amount.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CommissionTransaction {
    pub id: i64,
    pub affiliate_id: i64,
    pub order_id: Option<i64>,
    pub amount: Fcfa,
    pub level: i64,
    pub status: CommissionStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionTransaction {
    pub fn is_withdrawal(&self) -> bool {
        self.order_id.is_none()
    }
}

//--------------------------------------       Actor         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Admin,
    SuperAdmin,
    Delivery,
}

impl Role {
    /// Only staff and couriers may move orders along the fulfilment chain.
    pub fn may_update_orders(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin | Role::Delivery)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "CLIENT"),
            Role::Admin => write!(f, "ADMIN"),
            Role::SuperAdmin => write!(f, "SUPER_ADMIN"),
            Role::Delivery => write!(f, "DELIVERY"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Self::Client),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "DELIVERY" => Ok(Self::Delivery),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

/// The authenticated principal requesting an operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fulfilment_chain_is_linear() {
        use OrderStatusType::*;
        let chain = [Draft, Pending, Collecting, Collected, Processing, Ready, Delivering, Delivered];
        for pair in chain.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {} should be allowed", pair[0], pair[1]);
        }
    }

    #[test]
    fn no_skipping_ahead() {
        use OrderStatusType::*;
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Draft.can_transition_to(Collecting));
        assert!(!Collected.can_transition_to(Ready));
        // no backward edges either
        assert!(!Collecting.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use OrderStatusType::*;
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(Delivered.next_statuses().is_empty());
        assert!(Cancelled.next_statuses().is_empty());
    }

    #[test]
    fn cancellation_is_not_in_the_table() {
        use OrderStatusType::*;
        for status in [Draft, Pending, Collecting, Collected, Processing, Ready, Delivering] {
            assert!(!status.can_transition_to(Cancelled), "{status} must not reach CANCELLED via the table");
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        use OrderStatusType::*;
        for status in [Draft, Pending, Collecting, Collected, Processing, Ready, Delivering, Delivered, Cancelled] {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
    }

    #[test]
    fn loyalty_tiers() {
        assert_eq!(LoyaltyTier::for_lifetime_points(0), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_lifetime_points(1_000), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_lifetime_points(1_001), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_lifetime_points(5_001), LoyaltyTier::Gold);
        assert_eq!(LoyaltyTier::for_lifetime_points(10_001), LoyaltyTier::Platinum);
    }

    #[test]
    fn roles_allowed_to_move_orders() {
        assert!(Role::Admin.may_update_orders());
        assert!(Role::SuperAdmin.may_update_orders());
        assert!(Role::Delivery.may_update_orders());
        assert!(!Role::Client.may_update_orders());
    }
}
