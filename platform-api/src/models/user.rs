//! User model - platform accounts with role-based access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role.
///
/// Deserialization rejects anything outside the closed set, so an
/// unexpected role string in a stored document fails at the boundary
/// instead of silently comparing unequal deep in a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Moderator,
    Owner,
}

impl Role {
    /// The elevated roles treated as one group for coarse checks.
    pub const ADMIN_TIER: [Role; 3] = [Role::Admin, Role::Moderator, Role::Owner];

    pub fn is_admin_tier(&self) -> bool {
        Self::ADMIN_TIER.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Owner => "owner",
        }
    }
}

/// Fine-grained permission catalog.
///
/// Independent of role, except that `Role::Owner` implicitly satisfies
/// every permission check (see `AccessControl::require_permission`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    PlatformAdmin,
    UserManagement,
    ContentModeration,
    AnalyticsAccess,
    BillingManagement,
    SystemSettings,
    FullAccess,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::PlatformAdmin => "platform_admin",
            Permission::UserManagement => "user_management",
            Permission::ContentModeration => "content_moderation",
            Permission::AnalyticsAccess => "analytics_access",
            Permission::BillingManagement => "billing_management",
            Permission::SystemSettings => "system_settings",
            Permission::FullAccess => "full_access",
        }
    }
}

/// Subscription tier, used by the AI-generation collaborator for quota
/// checks. Authorization logic never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }
}

/// User document as stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    /// Argon2 hash; `None` for OAuth-only accounts.
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    pub email_verified: bool,
    pub subscription_plan: SubscriptionPlan,
    pub is_vendor: bool,
    pub last_login: Option<mongodb::bson::DateTime>,
    pub login_count: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) -> Self {
        let username = email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            password_hash: Some(password_hash),
            first_name,
            last_name,
            username,
            role: Role::User,
            permissions: Vec::new(),
            is_active: true,
            email_verified: false,
            subscription_plan: SubscriptionPlan::Free,
            is_vendor: false,
            last_login: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Strip secrets, producing the principal handed to handlers.
    pub fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            role: self.role,
            permissions: self.permissions,
            is_active: self.is_active,
            subscription_plan: self.subscription_plan,
            is_vendor: self.is_vendor,
        }
    }
}

/// Authenticated principal: the user record minus secret fields.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    pub subscription_plan: SubscriptionPlan,
    pub is_vendor: bool,
}

impl Identity {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
