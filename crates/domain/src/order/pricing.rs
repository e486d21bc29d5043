//! Order pricing.
//!
//! All amounts are integer cents, so `items_price` is exact and no rounding
//! step exists between line totals and the order total.

use std::collections::HashMap;

use common::{Money, OrderLineItem, ShippingMethod};

use crate::error::OrderError;

/// Fixed shipping price per method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingRates {
    rates: HashMap<ShippingMethod, Money>,
}

impl ShippingRates {
    /// Creates a table covering every method.
    pub fn new(standard: Money, express: Money, overnight: Money) -> Self {
        Self::from_rates([
            (ShippingMethod::Standard, standard),
            (ShippingMethod::Express, express),
            (ShippingMethod::Overnight, overnight),
        ])
    }

    /// Creates a table from explicit entries. Methods left out cannot be ordered.
    pub fn from_rates(rates: impl IntoIterator<Item = (ShippingMethod, Money)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    /// Looks up the price for a method.
    pub fn price_for(&self, method: ShippingMethod) -> Result<Money, OrderError> {
        self.rates
            .get(&method)
            .copied()
            .ok_or_else(|| OrderError::InvalidShippingMethod(method.to_string()))
    }
}

impl Default for ShippingRates {
    /// Standard 5.00, express 15.00, overnight 25.00.
    fn default() -> Self {
        Self::new(
            Money::from_dollars(5),
            Money::from_dollars(15),
            Money::from_dollars(25),
        )
    }
}

/// Sum of `unit_price * quantity` over all lines.
///
/// Fails with a validation error when the sum does not fit in cents.
pub fn items_price(items: &[OrderLineItem]) -> Result<Money, OrderError> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        item.total_price()
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(price_overflow)
    })
}

/// Adds the shipping price to the items price.
pub fn total_price(items_price: Money, shipping_price: Money) -> Result<Money, OrderError> {
    items_price
        .checked_add(shipping_price)
        .ok_or_else(price_overflow)
}

fn price_overflow() -> OrderError {
    OrderError::Validation("order total is too large".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn line(price_cents: i64, quantity: u32) -> OrderLineItem {
        OrderLineItem {
            product_id: ProductId::new("p"),
            product_name: "p".to_string(),
            quantity,
            unit_price: Money::from_cents(price_cents),
        }
    }

    #[test]
    fn test_default_rates() {
        let rates = ShippingRates::default();
        assert_eq!(rates.price_for(ShippingMethod::Standard).unwrap().cents(), 500);
        assert_eq!(rates.price_for(ShippingMethod::Express).unwrap().cents(), 1500);
        assert_eq!(rates.price_for(ShippingMethod::Overnight).unwrap().cents(), 2500);
    }

    #[test]
    fn test_unmapped_method_is_invalid() {
        let rates = ShippingRates::from_rates([(ShippingMethod::Standard, Money::from_cents(500))]);
        let err = rates.price_for(ShippingMethod::Overnight).unwrap_err();
        assert!(matches!(err, OrderError::InvalidShippingMethod(m) if m == "overnight"));
    }

    #[test]
    fn test_items_price_is_exact() {
        assert_eq!(items_price(&[line(350, 2)]).unwrap().cents(), 700);
        assert_eq!(items_price(&[line(333, 3), line(1, 1)]).unwrap().cents(), 1000);
        assert_eq!(items_price(&[]).unwrap().cents(), 0);
    }

    #[test]
    fn test_overflowing_prices_are_rejected() {
        let err = items_price(&[line(i64::MAX / 2, 3)]).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let err = items_price(&[line(i64::MAX / 2, 1), line(i64::MAX / 2, 1), line(2, 1)]).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let err = total_price(Money::from_cents(i64::MAX), Money::from_cents(500)).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(
            total_price(Money::from_cents(700), Money::from_cents(1500)).unwrap().cents(),
            2200
        );
    }
}
