//! Admin handlers. Routes here sit behind the admin-tier middleware,
//! except `access_introspection`, which any authenticated caller may use
//! to learn their own standing.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use platform_core::error::AppError;
use serde_json::json;

use crate::dtos::admin::{
    AccessResponse, StatsResponse, UpdateRoleRequest, UpdateStatusRequest, UserListParams,
    UserListResponse, UserSummary,
};
use crate::middleware::AuthUser;
use crate::models::Role;
use crate::startup::AppState;

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let response = StatsResponse {
        total_users: state.db.count_users().await?,
        active_users: state.db.count_active_users().await?,
        admin_tier_users: state.db.count_admin_tier_users().await?,
        total_orders: state.db.count_orders().await?,
        published_products: state.db.count_published_products().await?,
    };
    Ok(Json(response))
}

pub async fn access_introspection(AuthUser(identity): AuthUser) -> impl IntoResponse {
    Json(AccessResponse {
        is_owner: identity.role == Role::Owner,
        is_admin_tier: identity.role.is_admin_tier(),
        role: identity.role,
        permissions: identity.permissions,
    })
}

/// Paginated account listing with moderation filters.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);

    let is_active = match params.status.as_deref() {
        Some("active") => Some(true),
        Some("inactive") => Some(false),
        Some(other) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown status filter: {}",
                other
            )))
        }
        None => None,
    };

    let (users, total) = state
        .db
        .list_users(
            params.search.as_deref(),
            is_active,
            params.subscription,
            page,
            page_size,
        )
        .await?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserSummary::from).collect(),
        total,
        page,
        page_size,
    }))
}

/// Activate or deactivate an account. Deactivation locks the account
/// out at the next identity resolution; issued tokens stop working
/// immediately.
pub async fn update_user_status(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if user_id == identity.id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Cannot change your own account status"
        )));
    }

    let updated = state.db.set_user_status(&user_id, payload.is_active).await?;
    if !updated {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }

    tracing::info!(
        target_user = %user_id,
        is_active = payload.is_active,
        changed_by = %identity.id,
        "User status updated"
    );

    Ok(Json(json!({
        "message": if payload.is_active { "User activated" } else { "User deactivated" },
        "user_id": user_id,
        "is_active": payload.is_active,
    })))
}

/// Change another account's role. Owner only.
pub async fn update_user_role(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.access.require_role(&identity, &[Role::Owner])?;

    if user_id == identity.id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Cannot change your own role"
        )));
    }

    let updated = state.db.update_user_role(&user_id, payload.role).await?;
    if !updated {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }

    tracing::info!(
        target_user = %user_id,
        new_role = payload.role.as_str(),
        changed_by = %identity.id,
        "User role updated"
    );

    Ok(Json(json!({
        "message": "Role updated",
        "user_id": user_id,
        "role": payload.role,
    })))
}
