use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Permission, Role, SubscriptionPlan, User};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_users: u64,
    pub active_users: u64,
    pub admin_tier_users: u64,
    pub total_orders: u64,
    pub published_products: u64,
}

/// Role/permission introspection for the calling identity.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub is_owner: bool,
    pub is_admin_tier: bool,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Case-insensitive match against name and email.
    pub search: Option<String>,
    /// "active" or "inactive".
    pub status: Option<String>,
    pub subscription: Option<SubscriptionPlan>,
}

/// Admin view of an account. Carries moderation-relevant fields the
/// public `Identity` omits, and never the password hash.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub subscription_plan: SubscriptionPlan,
    pub is_vendor: bool,
    pub login_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            role: user.role,
            is_active: user.is_active,
            email_verified: user.email_verified,
            subscription_plan: user.subscription_plan,
            is_vendor: user.is_vendor,
            login_count: user.login_count,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}
