//! Order pricing: turns a validated cart into a priced, identified order.
//!
//! Pure computation over `Decimal` amounts. Callers resolve unit prices
//! (via [`current_unit_price`]) and persist the result; this module never
//! touches the database and never re-reads product state.

use chrono::{DateTime, Utc};
use platform_core::error::AppError;
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::models::{Order, OrderItem, Product};

/// The platform's cut of subtotal: 10%.
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Largest quantity accepted on a single line item.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid line item for product {product_id}: {reason}")]
    InvalidLineItem { product_id: String, reason: String },
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::BadRequest(anyhow::anyhow!(err.to_string()))
    }
}

/// A priced cart, ready to be embedded into an [`Order`].
#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub vendor_earnings: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Price a cart of line items.
///
/// Invariants:
/// - `subtotal = Σ(unit_price × quantity)`, unrounded;
/// - `platform_fee = subtotal × 0.10`, rounded half-up to 2 decimals;
/// - `vendor_earnings = subtotal − platform_fee`, so the fee/earnings
///   split is exact and any rounding remainder lands on the vendor side;
/// - `total = subtotal + tax + shipping` (the fee is a split of
///   subtotal, never an add-on to total).
///
/// Fails with [`PricingError::InvalidLineItem`] when any item has a
/// non-positive quantity, a quantity above [`MAX_LINE_QUANTITY`], a
/// negative unit price, or a line total too large to represent.
pub fn price_order(
    items: Vec<OrderItem>,
    tax: Decimal,
    shipping: Decimal,
) -> Result<PricedOrder, PricingError> {
    let mut subtotal = Decimal::ZERO;
    for item in &items {
        if item.quantity < 1 {
            return Err(PricingError::InvalidLineItem {
                product_id: item.product_id.clone(),
                reason: format!("quantity must be at least 1, got {}", item.quantity),
            });
        }
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(PricingError::InvalidLineItem {
                product_id: item.product_id.clone(),
                reason: format!(
                    "quantity must be at most {}, got {}",
                    MAX_LINE_QUANTITY, item.quantity
                ),
            });
        }
        if item.unit_price < Decimal::ZERO {
            return Err(PricingError::InvalidLineItem {
                product_id: item.product_id.clone(),
                reason: format!("unit price must not be negative, got {}", item.unit_price),
            });
        }

        // Checked arithmetic: a pathological price or cart must surface
        // as a rejected line item, never a panic.
        let line_total = item
            .unit_price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| subtotal.checked_add(line))
            .ok_or_else(|| PricingError::InvalidLineItem {
                product_id: item.product_id.clone(),
                reason: "line total exceeds the representable amount".to_string(),
            })?;
        subtotal = line_total;
    }

    let platform_fee = (subtotal * PLATFORM_FEE_RATE)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let vendor_earnings = subtotal - platform_fee;
    let total = subtotal + tax + shipping;

    Ok(PricedOrder {
        order_number: generate_order_number(Utc::now()),
        items,
        subtotal,
        platform_fee,
        vendor_earnings,
        tax,
        shipping,
        total,
    })
}

/// Resolve the unit price a product sells for at `as_of`.
///
/// The sale price applies only while the sale window is active,
/// inclusive at both bounds. A sale flag without a sale price or
/// without a complete window falls back to the regular price; this
/// never errors.
pub fn current_unit_price(product: &Product, as_of: DateTime<Utc>) -> Decimal {
    if product.is_on_sale {
        if let (Some(sale_price), Some((start, end))) =
            (product.sale_price, product.sale_window())
        {
            if as_of >= start && as_of <= end {
                return sale_price;
            }
        }
    }
    product.price
}

/// Generate a short, sortable, collision-resistant order number.
///
/// Base-36 millisecond timestamp plus a 5-character random suffix,
/// uppercased. Uniqueness is guaranteed by the store's unique index;
/// this is only collision-resistant, not collision-proof.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let time_part = base36(now.timestamp_millis().max(0) as u64);
    let random_part: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();
    format!("ORD-{}-{}", time_part, random_part).to_uppercase()
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.iter().rev().collect()
}

/// Convenience used by the checkout handler: price the cart and wrap it
/// into a persistent [`Order`] in one step.
pub fn build_order(
    items: Vec<OrderItem>,
    tax: Decimal,
    shipping: Decimal,
    customer_id: String,
    customer_email: String,
    is_digital: bool,
    shipping_address: Option<crate::models::ShippingAddress>,
) -> Result<Order, PricingError> {
    let priced = price_order(items, tax, shipping)?;
    Ok(Order::new(
        priced,
        customer_id,
        customer_email,
        is_digital,
        shipping_address,
    ))
}
