//! Order placement endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use common::{Order, ShippingAddress, ShippingMethod, UserId};
use domain::{LineRequest, OrderService, PlaceOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::Storage;

use crate::error::ApiError;

/// Header carrying the authenticated user, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state accessible from all handlers.
pub struct AppState<S: Storage> {
    pub order_service: OrderService<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<AddressRequest>,
    pub shipping_method: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

impl From<AddressRequest> for ShippingAddress {
    fn from(req: AddressRequest) -> Self {
        ShippingAddress {
            name: req.name,
            street: req.street,
            city: req.city,
            postal_code: req.postal_code,
            country: req.country,
        }
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: u64,
    pub owner: String,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: ShippingAddress,
    pub shipping_method: ShippingMethod,
    pub contact_phone: Option<String>,
    pub items_price_cents: i64,
    pub shipping_price_cents: i64,
    pub total_price_cents: i64,
    pub status: String,
    pub is_paid: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .line_items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect();

        OrderResponse {
            id: order.id.to_string(),
            order_number: order.order_number.as_u64(),
            owner: order.owner.to_string(),
            items,
            shipping_address: order.shipping_address,
            shipping_method: order.shipping_method,
            contact_phone: order.contact_phone,
            items_price_cents: order.items_price.cents(),
            shipping_price_cents: order.shipping_price.cents(),
            total_price_cents: order.total_price.cents(),
            status: order.status.to_string(),
            is_paid: order.is_paid,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders: place an order for the authenticated user.
#[tracing::instrument(skip_all)]
pub async fn create<S: Storage + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let owner = authenticated_user(&headers)?;
    let Json(req) = payload?;

    let shipping_address = req
        .shipping_address
        .ok_or_else(|| ApiError::BadRequest("shipping_address is required".to_string()))?;
    let shipping_method: ShippingMethod = req
        .shipping_method
        .ok_or_else(|| ApiError::BadRequest("shipping_method is required".to_string()))?
        .parse()
        .map_err(domain::OrderError::from)?;

    let mut cmd = PlaceOrder::new(owner, shipping_address.into(), shipping_method);
    cmd.items = req
        .items
        .into_iter()
        .map(|item| LineRequest::new(item.product_id, item.quantity))
        .collect();
    cmd.contact_phone = req.contact_phone;

    let order = state.order_service.create_order(cmd).await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

fn authenticated_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authorized".to_string()))
}
