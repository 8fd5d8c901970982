//! Marketplace handlers: catalog browsing and checkout.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use platform_core::error::AppError;
use rust_decimal::Decimal;
use validator::Validate;

use crate::dtos::marketplace::{
    CreateOrderRequest, CreateProductRequest, OrderListParams, OrderListResponse, OrderResponse,
    ProductListParams, ProductListResponse, ProductResponse, UpdateProductRequest,
    VendorProductListParams,
};
use crate::middleware::{AuthUser, MaybeUser};
use crate::models::{OrderItem, Product, ProductKind, ProductStatus};
use crate::services::pricing;
use crate::startup::AppState;

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let (products, total) = state
        .db
        .list_published_products(params.category.as_deref(), page, page_size)
        .await?;

    let as_of = Utc::now();
    let products: Vec<ProductResponse> = products
        .iter()
        .map(|p| ProductResponse::from_product(p, as_of))
        .collect();
    let total_pages = total.div_ceil(page_size);

    Ok(Json(ProductListResponse {
        products,
        total,
        page,
        page_size,
        total_pages,
    }))
}

/// Public product view. Vendors may preview their own unpublished
/// listings, which is why this route carries the optional-auth layer.
pub async fn get_product(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .db
        .find_product_by_id(&product_id)
        .await?
        .filter(|p| {
            p.status == ProductStatus::Published
                || caller
                    .as_ref()
                    .is_some_and(|identity| identity.id == p.vendor_id)
        })
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(ProductResponse::from_product(&product, Utc::now())))
}

/// List a new product. Creating a first listing also turns the account
/// into a vendor; products start as drafts and go live through
/// `update_product`.
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if payload.price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Price must not be negative"
        )));
    }

    state.db.mark_vendor(&identity.id).await?;

    let product = Product::new(
        identity.id,
        payload.title,
        payload.description,
        payload.category,
        payload.kind,
        payload.price,
    );
    state.db.insert_product(&product).await?;

    tracing::info!(product_id = %product.id, vendor_id = %product.vendor_id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::from_product(&product, Utc::now())),
    ))
}

/// Partial edit of a vendor's own product, including publishing.
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(product_id): Path<String>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if payload.price.is_some_and(|p| p < Decimal::ZERO)
        || payload.sale_price.is_some_and(|p| p < Decimal::ZERO)
    {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Price must not be negative"
        )));
    }

    let mut product = state
        .db
        .find_vendor_product(&product_id, &identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    payload.apply_to(&mut product);
    state.db.replace_product(&product).await?;

    Ok(Json(ProductResponse::from_product(&product, Utc::now())))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .db
        .delete_vendor_product(&product_id, &identity.id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
    }

    tracing::info!(product_id = %product_id, vendor_id = %identity.id, "Product deleted");

    Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}

/// A vendor's own listings, drafts included.
pub async fn list_vendor_products(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<VendorProductListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(10).clamp(1, 100);

    let (products, total) = state
        .db
        .list_vendor_products(&identity.id, params.status, page, page_size)
        .await?;

    let as_of = Utc::now();
    let products: Vec<ProductResponse> = products
        .iter()
        .map(|p| ProductResponse::from_product(p, as_of))
        .collect();
    let total_pages = total.div_ceil(page_size);

    Ok(Json(ProductListResponse {
        products,
        total,
        page,
        page_size,
        total_pages,
    }))
}

/// Checkout: build line items from current product state, price the cart
/// once, and persist the resulting order.
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Unit prices are snapshotted here, against one instant for the
    // whole cart. The pricing core never re-reads product state.
    let as_of = Utc::now();
    let mut items = Vec::with_capacity(payload.items.len());
    let mut all_digital = true;

    for cart_item in &payload.items {
        let product = state
            .db
            .find_product_by_id(&cart_item.product_id)
            .await?
            .filter(|p| p.status == ProductStatus::Published)
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Product {} is not available",
                    cart_item.product_id
                ))
            })?;

        if product.kind != ProductKind::Digital {
            all_digital = false;
        }

        items.push(OrderItem {
            product_id: product.id.clone(),
            product_title: product.title.clone(),
            quantity: cart_item.quantity,
            unit_price: pricing::current_unit_price(&product, as_of),
            vendor_id: product.vendor_id,
        });
    }

    let order = pricing::build_order(
        items,
        Decimal::ZERO,
        Decimal::ZERO,
        identity.id,
        identity.email,
        all_digital,
        payload.shipping_address,
    )?;
    state.db.insert_order(&order).await?;

    tracing::info!(
        order_number = %order.order_number,
        total = %order.total,
        "Order created"
    );

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<OrderListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(10).clamp(1, 100);

    let (orders, total) = state
        .db
        .list_orders_for_customer(&identity.id, page, page_size)
        .await?;

    Ok(Json(OrderListResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}
