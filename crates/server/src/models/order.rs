//! Order, line-item, shipping and payment domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tamarind_core::{OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus, ProductId, UserId};

/// An order header row. Totals are computed once at placement and never
/// re-priced afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items_subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// One product-and-quantity entry within an order.
///
/// Name, image and unit price are snapshots taken at order time so later
/// product edits don't alter historical orders.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Recipient address, one-to-one with an order.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingInfo {
    pub order_id: OrderId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
    pub phone: String,
}

/// Payment record, one-to-one with an order.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// External payment-intent id, or the literal `"COD"` for cash on delivery.
    pub intent_id: String,
    pub created_at: DateTime<Utc>,
}

/// A fully hydrated order for detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping_info: Option<ShippingInfo>,
    pub payment: Option<Payment>,
}

// =============================================================================
// Checkout inputs
// =============================================================================

/// Shipping fields submitted at checkout. All fields are required; blank
/// strings are rejected the same as absent fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub phone: String,
}

/// One cart line in a checkout request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderedItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `POST /order/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    pub shipping_info: ShippingFields,
    #[serde(default)]
    pub ordered_items: Vec<OrderedItem>,
    pub payment_method: PaymentMethod,
}
