use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    product::slugify, Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductKind,
    ProductStatus, ShippingAddress,
};
use crate::services::pricing;

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub category: Option<String>,
}

/// Public view of a product. `current_price` is resolved through the
/// pricing window so sale pricing shows up without the client having to
/// interpret the sale fields itself.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub vendor_id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub kind: ProductKind,
    pub status: ProductStatus,
    pub price: Decimal,
    pub current_price: Decimal,
    pub is_on_sale: bool,
}

impl ProductResponse {
    pub fn from_product(product: &Product, as_of: DateTime<Utc>) -> Self {
        let current_price = pricing::current_unit_price(product, as_of);
        Self {
            id: product.id.clone(),
            vendor_id: product.vendor_id.clone(),
            title: product.title.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            kind: product.kind,
            status: product.status,
            price: product.price,
            current_price,
            is_on_sale: current_price != product.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub kind: ProductKind,
    pub price: Decimal,
}

/// Partial vendor edit. Absent fields are left untouched; publishing is
/// just `status: "published"`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub kind: Option<ProductKind>,
    pub status: Option<ProductStatus>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub is_on_sale: Option<bool>,
    pub sale_start: Option<DateTime<Utc>>,
    pub sale_end: Option<DateTime<Utc>>,
}

impl UpdateProductRequest {
    /// Fold the provided fields into the product. A new title re-derives
    /// the slug; pricing fields on existing orders are never touched
    /// because orders snapshot their prices at checkout.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.slug = slugify(title);
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(kind) = self.kind {
            product.kind = kind;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(sale_price) = self.sale_price {
            product.sale_price = Some(sale_price);
        }
        if let Some(is_on_sale) = self.is_on_sale {
            product.is_on_sale = is_on_sale;
        }
        if let Some(sale_start) = self.sale_start {
            product.sale_start = Some(mongodb::bson::DateTime::from_chrono(sale_start));
        }
        if let Some(sale_end) = self.sale_end {
            product.sale_end = Some(mongodb::bson::DateTime::from_chrono(sale_end));
        }
        product.updated_at = Utc::now();
    }
}

#[derive(Debug, Deserialize)]
pub struct VendorProductListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<CartItem>,
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
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
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            items: order.items,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping: order.shipping,
            total: order.total,
            platform_fee: order.platform_fee,
            vendor_earnings: order.vendor_earnings,
            status: order.status,
            payment_status: order.payment_status,
            is_digital: order.is_digital,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn draft_product() -> Product {
        Product::new(
            "vendor-1".to_string(),
            "Starter Kit".to_string(),
            "A kit".to_string(),
            "templates".to_string(),
            ProductKind::Digital,
            Decimal::from_str("20.00").unwrap(),
        )
    }

    #[test]
    fn update_renames_and_reslugs() {
        let mut product = draft_product();
        let update = UpdateProductRequest {
            title: Some("Creator Pro Kit!".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut product);
        assert_eq!(product.title, "Creator Pro Kit!");
        assert_eq!(product.slug, "creator-pro-kit");
    }

    #[test]
    fn update_publishes_a_draft() {
        let mut product = draft_product();
        assert_eq!(product.status, ProductStatus::Draft);

        let update = UpdateProductRequest {
            status: Some(ProductStatus::Published),
            ..Default::default()
        };
        update.apply_to(&mut product);
        assert_eq!(product.status, ProductStatus::Published);
    }

    #[test]
    fn empty_update_only_bumps_updated_at() {
        let mut product = draft_product();
        let before = product.clone();
        UpdateProductRequest::default().apply_to(&mut product);
        assert_eq!(product.title, before.title);
        assert_eq!(product.slug, before.slug);
        assert_eq!(product.price, before.price);
        assert_eq!(product.status, before.status);
        assert!(product.updated_at >= before.updated_at);
    }

    #[test]
    fn update_can_arm_a_sale_window() {
        let mut product = draft_product();
        let start = Utc::now();
        let end = start + chrono::Duration::days(3);
        let update = UpdateProductRequest {
            sale_price: Some(Decimal::from_str("15.00").unwrap()),
            is_on_sale: Some(true),
            sale_start: Some(start),
            sale_end: Some(end),
            ..Default::default()
        };
        update.apply_to(&mut product);
        assert!(product.is_on_sale);
        assert!(product.sale_window().is_some());
    }
}
