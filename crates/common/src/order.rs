//! Persisted order records and their value objects.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Money, OrderId, ProductId, UserId};

/// Human-readable order number: `YYMMDD` followed by a 5-digit sequence.
///
/// `25041700007` is the seventh order number issued on 2025-04-17.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(u64);

impl OrderNumber {
    /// Largest sequence that fits in the 5-digit suffix.
    pub const MAX_SEQUENCE: u32 = 99_999;

    const SEQUENCE_SPAN: u64 = 100_000;

    /// Composes an order number from a calendar date and a daily sequence.
    pub fn compose(date: NaiveDate, sequence: u32) -> Self {
        let yy = (date.year().rem_euclid(100)) as u64;
        let prefix = yy * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day());
        Self(prefix * Self::SEQUENCE_SPAN + u64::from(sequence))
    }

    /// Wraps a raw stored value.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The trailing five digits.
    pub fn sequence(&self) -> u32 {
        (self.0 % Self::SEQUENCE_SPAN) as u32
    }

    /// The leading `YYMMDD` digits as an integer.
    pub fn date_prefix(&self) -> u32 {
        (self.0 / Self::SEQUENCE_SPAN) as u32
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06}{:05}", self.date_prefix(), self.sequence())
    }
}

/// Shipping speed chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Express => "express",
            ShippingMethod::Overnight => "overnight",
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown shipping method name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shipping method: {0}")]
pub struct UnknownShippingMethod(pub String);

impl std::str::FromStr for ShippingMethod {
    type Err = UnknownShippingMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ShippingMethod::Standard),
            "express" => Ok(ShippingMethod::Express),
            "overnight" => Ok(ShippingMethod::Overnight),
            other => Err(UnknownShippingMethod(other.to_string())),
        }
    }
}

/// The state of an order in its lifecycle.
///
/// New orders start as `Pending`; later transitions belong to the
/// payment and fulfilment flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Reasons a shipping address is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("shipping address is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid postal code format: {0:?}")]
    InvalidPostalCode(String),
}

/// Destination an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Checks that every field is present and the postal code is 4 to 10 characters.
    pub fn validate(&self) -> Result<(), AddressError> {
        let fields = [
            ("name", &self.name),
            ("street", &self.street),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(field));
            }
        }

        let len = self.postal_code.chars().count();
        if !(4..=10).contains(&len) {
            return Err(AddressError::InvalidPostalCode(self.postal_code.clone()));
        }

        Ok(())
    }
}

/// A purchased line, with its price frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLineItem {
    /// Returns the total price for this line (quantity * unit_price), or
    /// `None` if it does not fit in cents.
    pub fn total_price(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub owner: UserId,
    pub line_items: Vec<OrderLineItem>,
    pub shipping_address: ShippingAddress,
    pub shipping_method: ShippingMethod,
    pub contact_phone: Option<String>,
    pub items_price: Money,
    pub shipping_price: Money,
    pub total_price: Money,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
