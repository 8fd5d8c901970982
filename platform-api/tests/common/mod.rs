//! Test helpers: an in-memory identity store and router builders that
//! exercise the real middleware stack without MongoDB.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use chrono::{Duration, Utc};
use platform_api::middleware::{
    admin_middleware, auth_middleware, optional_auth_middleware, AuthUser, MaybeUser,
};
use platform_api::models::{Permission, Role, User};
use platform_api::services::access_control::IdentityStore;
use platform_api::services::{AccessControl, TokenService};
use serde_json::json;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789ab";

pub struct MemoryStore {
    users: HashMap<String, User>,
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_identity_by_id(&self, id: &str) -> Result<Option<User>, anyhow::Error> {
        Ok(self.users.get(id).cloned())
    }
}

pub fn test_user(id: &str, role: Role, permissions: Vec<Permission>, is_active: bool) -> User {
    let mut user = User::new(
        format!("{}@example.com", id),
        "irrelevant-hash".to_string(),
        "Test".to_string(),
        "User".to_string(),
    );
    user.id = id.to_string();
    user.role = role;
    user.permissions = permissions;
    user.is_active = is_active;
    user
}

pub fn access_control(users: Vec<User>) -> (AccessControl, TokenService) {
    let tokens = TokenService::new(TEST_SECRET, 7).expect("test token service");
    let store = MemoryStore {
        users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
    };
    (AccessControl::new(tokens.clone(), Arc::new(store)), tokens)
}

/// A router with one route behind the auth middleware.
pub fn protected_app(access: AccessControl) -> Router {
    Router::new()
        .route(
            "/protected",
            get(|AuthUser(identity): AuthUser| async move {
                Json(json!({ "id": identity.id, "role": identity.role }))
            }),
        )
        .layer(from_fn_with_state(access, auth_middleware))
}

/// A router with one route behind auth + admin-tier middleware.
pub fn admin_app(access: AccessControl) -> Router {
    Router::new()
        .route(
            "/admin",
            get(|AuthUser(identity): AuthUser| async move {
                Json(json!({ "id": identity.id }))
            }),
        )
        .layer(from_fn_with_state(access.clone(), admin_middleware))
        .layer(from_fn_with_state(access, auth_middleware))
}

/// A router with one route behind the optional-auth middleware.
pub fn optional_app(access: AccessControl) -> Router {
    Router::new()
        .route(
            "/feed",
            get(|MaybeUser(identity): MaybeUser| async move {
                match identity {
                    Some(identity) => Json(json!({ "personalized_for": identity.id })),
                    None => Json(json!({ "personalized_for": null })),
                }
            }),
        )
        .layer(from_fn_with_state(access, optional_auth_middleware))
}

/// Sign a token that expired an hour ago, with the test secret.
pub fn expired_token(user_id: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    let now = Utc::now();
    let claims = platform_api::services::SessionClaims {
        sub: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        exp: (now - Duration::hours(1)).timestamp(),
        iat: (now - Duration::days(8)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("sign expired test token")
}
