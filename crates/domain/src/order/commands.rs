//! Order commands.

use common::{ProductId, ShippingAddress, ShippingMethod, UserId};

use crate::error::OrderError;

/// One requested line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The user placing the order.
    pub owner: UserId,

    /// Requested lines, processed in this order.
    pub items: Vec<LineRequest>,

    pub shipping_address: ShippingAddress,

    pub shipping_method: ShippingMethod,

    pub contact_phone: Option<String>,
}

impl PlaceOrder {
    /// Creates a PlaceOrder command with no items yet.
    pub fn new(
        owner: UserId,
        shipping_address: ShippingAddress,
        shipping_method: ShippingMethod,
    ) -> Self {
        Self {
            owner,
            items: Vec::new(),
            shipping_address,
            shipping_method,
            contact_phone: None,
        }
    }

    /// Appends a requested line.
    pub fn with_item(mut self, product_id: impl Into<ProductId>, quantity: u32) -> Self {
        self.items.push(LineRequest::new(product_id, quantity));
        self
    }

    pub fn with_contact_phone(mut self, phone: impl Into<String>) -> Self {
        self.contact_phone = Some(phone.into());
        self
    }

    /// Checks the shape of the request.
    ///
    /// Callers are expected to have done this already; the service repeats
    /// it before touching storage.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }

        if let Some(line) = self.items.iter().find(|l| l.quantity == 0) {
            return Err(OrderError::Validation(format!(
                "quantity for product {} must be greater than 0",
                line.product_id
            )));
        }

        self.shipping_address.validate()?;
        Ok(())
    }
}
