pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use platform_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{admin_middleware, auth_middleware, optional_auth_middleware};
use crate::startup::AppState;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    // Catalog routes personalize when a credential is present (vendor
    // draft preview) but never require one.
    let catalog = Router::new()
        .route("/marketplace/products", get(handlers::marketplace::list_products))
        .route(
            "/marketplace/products/:product_id",
            get(handlers::marketplace::get_product),
        )
        .layer(from_fn_with_state(
            state.access.clone(),
            optional_auth_middleware,
        ));

    let authenticated = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/marketplace/orders",
            post(handlers::marketplace::create_order).get(handlers::marketplace::list_orders),
        )
        .route(
            "/marketplace/vendor/products",
            get(handlers::marketplace::list_vendor_products)
                .post(handlers::marketplace::create_product),
        )
        .route(
            "/marketplace/vendor/products/:product_id",
            put(handlers::marketplace::update_product)
                .delete(handlers::marketplace::delete_product),
        )
        .route("/admin/access", get(handlers::admin::access_introspection))
        .route(
            "/admin/users/:user_id/role",
            put(handlers::admin::update_user_role),
        )
        .layer(from_fn_with_state(state.access.clone(), auth_middleware));

    // Admin-tier routes: identity resolution runs first, then the role
    // gate (layers execute outermost-last-added).
    let admin = Router::new()
        .route("/admin/stats", get(handlers::admin::stats))
        .route("/admin/users", get(handlers::admin::list_users))
        .route(
            "/admin/users/:user_id/status",
            put(handlers::admin::update_user_status),
        )
        .layer(from_fn_with_state(state.access.clone(), admin_middleware))
        .layer(from_fn_with_state(state.access.clone(), auth_middleware));

    let cors = cors_layer(&state.config.security.allowed_origins);

    Router::new()
        .merge(public)
        .merge(catalog)
        .merge(authenticated)
        .merge(admin)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
