//! Order model - priced, identified marketplace orders.
//!
//! Pricing fields are set exactly once, at construction, from the output
//! of `pricing::price_order`. Edits to unrelated fields (shipping
//! address, notes, status transitions) never recompute them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::pricing::PricedOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

/// One product-quantity pair within an order.
///
/// `unit_price` is snapshotted at order-creation time and never re-read
/// from the product afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_title: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub vendor_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Order document as stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    /// Generated once at creation; unique index enforced by the store.
    pub order_number: String,
    pub customer_id: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub platform_fee: Decimal,
    pub vendor_earnings: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub is_digital: bool,
    pub shipping_address: Option<ShippingAddress>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build the persistent order from a priced cart.
    pub fn new(
        priced: PricedOrder,
        customer_id: String,
        customer_email: String,
        is_digital: bool,
        shipping_address: Option<ShippingAddress>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            order_number: priced.order_number,
            customer_id,
            customer_email,
            items: priced.items,
            subtotal: priced.subtotal,
            tax: priced.tax,
            shipping: priced.shipping,
            total: priced.total,
            platform_fee: priced.platform_fee,
            vendor_earnings: priced.vendor_earnings,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            is_digital,
            shipping_address,
            created_at: now,
            updated_at: now,
        }
    }
}
