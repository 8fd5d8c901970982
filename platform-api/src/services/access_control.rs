//! Access control: identity resolution and role/permission checks.
//!
//! The single place where authorization decisions are made. Handlers and
//! middleware ask questions here instead of comparing role strings
//! themselves, so rules like the owner bypass are expressed exactly once.
//!
//! Both collaborators are injected: the token verifier carries the
//! signing secret from configuration, and identity lookup goes through
//! the [`IdentityStore`] seam so the component is testable without a
//! running database.

use std::sync::Arc;

use async_trait::async_trait;
use platform_core::error::AppError;
use thiserror::Error;

use crate::models::{Identity, Permission, Role, User};
use crate::services::jwt::{TokenError, TokenService};

/// Internal classification of an authentication failure. Never exposed
/// to unauthenticated callers; the HTTP layer collapses all of these
/// into one generic 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    MissingCredential,
    Expired,
    Invalid,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("unauthenticated ({reason:?})")]
    Unauthenticated { reason: UnauthenticatedReason },

    #[error("identity {id} no longer exists")]
    IdentityNotFound { id: String },

    #[error("account {id} is deactivated")]
    AccountDisabled { id: String },

    #[error("role '{}' is not in the required set {required:?}", actual.as_str())]
    Forbidden { required: Vec<Role>, actual: Role },

    #[error("permission '{}' not granted", permission.as_str())]
    PermissionDenied {
        permission: Permission,
        held: Vec<Permission>,
    },

    #[error("identity lookup failed")]
    Backend(#[source] anyhow::Error),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            // Authentication failures all map to a generic 401; the
            // specific variant stays server-side (see AppError's
            // IntoResponse), so a caller cannot distinguish an expired
            // token from a deleted account.
            AccessError::Unauthenticated { .. }
            | AccessError::IdentityNotFound { .. }
            | AccessError::AccountDisabled { .. } => {
                AppError::Unauthorized(anyhow::anyhow!(err.to_string()))
            }
            AccessError::Forbidden { .. } | AccessError::PermissionDenied { .. } => {
                AppError::Forbidden(anyhow::anyhow!(err.to_string()))
            }
            AccessError::Backend(e) => AppError::InternalError(e),
        }
    }
}

/// Identity lookup seam. `MongoDb` implements this in production; tests
/// use an in-memory map.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_identity_by_id(&self, id: &str) -> Result<Option<User>, anyhow::Error>;
}

#[derive(Clone)]
pub struct AccessControl {
    tokens: TokenService,
    store: Arc<dyn IdentityStore>,
}

impl AccessControl {
    pub fn new(tokens: TokenService, store: Arc<dyn IdentityStore>) -> Self {
        Self { tokens, store }
    }

    /// Resolve the caller's identity from a raw bearer credential.
    ///
    /// A token is only as good as the account behind it: the signature
    /// and expiry must verify, the referenced identity must still exist,
    /// and the account must be active. Secrets are stripped from the
    /// returned identity.
    pub async fn resolve_identity(
        &self,
        credential: Option<&str>,
    ) -> Result<Identity, AccessError> {
        let token = credential.ok_or(AccessError::Unauthenticated {
            reason: UnauthenticatedReason::MissingCredential,
        })?;

        let claims = self.tokens.verify(token).map_err(|e| match e {
            TokenError::Expired => AccessError::Unauthenticated {
                reason: UnauthenticatedReason::Expired,
            },
            TokenError::Invalid(_) => AccessError::Unauthenticated {
                reason: UnauthenticatedReason::Invalid,
            },
        })?;

        let user = self
            .store
            .find_identity_by_id(&claims.sub)
            .await
            .map_err(AccessError::Backend)?
            .ok_or(AccessError::IdentityNotFound { id: claims.sub })?;

        if !user.is_active {
            return Err(AccessError::AccountDisabled { id: user.id });
        }

        Ok(user.into_identity())
    }

    /// Resolve the caller if possible; anonymous access is fine.
    ///
    /// Any resolution failure, including backend errors, degrades to
    /// `None` so personalization-only endpoints still work.
    pub async fn optional_identity(&self, credential: Option<&str>) -> Option<Identity> {
        self.resolve_identity(credential).await.ok()
    }

    /// Require the caller's role to be in the allowed set.
    ///
    /// Admin-tier checks pass `Role::ADMIN_TIER`; never a single
    /// hardcoded elevated role.
    pub fn require_role(&self, identity: &Identity, allowed: &[Role]) -> Result<(), AccessError> {
        if allowed.contains(&identity.role) {
            Ok(())
        } else {
            Err(AccessError::Forbidden {
                required: allowed.to_vec(),
                actual: identity.role,
            })
        }
    }

    /// Require a specific permission.
    ///
    /// Owner bypass: the owner role satisfies every permission check,
    /// regardless of the permissions list.
    pub fn require_permission(
        &self,
        identity: &Identity,
        permission: Permission,
    ) -> Result<(), AccessError> {
        if identity.role == Role::Owner {
            return Ok(());
        }
        if identity.has_permission(permission) {
            Ok(())
        } else {
            Err(AccessError::PermissionDenied {
                permission,
                held: identity.permissions.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    const SECRET: &str = "access-control-test-secret-32bytes!!";

    struct MemoryStore {
        users: HashMap<String, User>,
        fail: bool,
    }

    #[async_trait]
    impl IdentityStore for MemoryStore {
        async fn find_identity_by_id(&self, id: &str) -> Result<Option<User>, anyhow::Error> {
            if self.fail {
                anyhow::bail!("store unavailable");
            }
            Ok(self.users.get(id).cloned())
        }
    }

    fn user(id: &str, role: Role, permissions: Vec<Permission>, is_active: bool) -> User {
        let mut u = User::new(
            format!("{}@example.com", id),
            "hash".to_string(),
            "Test".to_string(),
            "User".to_string(),
        );
        u.id = id.to_string();
        u.role = role;
        u.permissions = permissions;
        u.is_active = is_active;
        u
    }

    fn access_with(users: Vec<User>) -> (AccessControl, TokenService) {
        let tokens = TokenService::new(SECRET, 7).unwrap();
        let store = MemoryStore {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            fail: false,
        };
        (
            AccessControl::new(tokens.clone(), Arc::new(store)),
            tokens,
        )
    }

    const ALL_PERMISSIONS: [Permission; 7] = [
        Permission::PlatformAdmin,
        Permission::UserManagement,
        Permission::ContentModeration,
        Permission::AnalyticsAccess,
        Permission::BillingManagement,
        Permission::SystemSettings,
        Permission::FullAccess,
    ];

    #[tokio::test]
    async fn resolves_identity_for_valid_token() {
        let (access, tokens) = access_with(vec![user("u1", Role::User, vec![], true)]);
        let token = tokens.issue_session_token("u1", "u1@example.com").unwrap();
        let identity = access.resolve_identity(Some(&token)).await.unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn missing_credential_is_unauthenticated() {
        let (access, _) = access_with(vec![]);
        let err = access.resolve_identity(None).await.unwrap_err();
        assert!(matches!(
            err,
            AccessError::Unauthenticated {
                reason: UnauthenticatedReason::MissingCredential
            }
        ));
    }

    #[tokio::test]
    async fn expired_token_is_unauthenticated_with_expired_reason() {
        let (access, _) = access_with(vec![user("u1", Role::User, vec![], true)]);
        // Token signed with the same secret but already past its window.
        let expired = issue_expired(SECRET, "u1");
        let err = access.resolve_identity(Some(&expired)).await.unwrap_err();
        assert!(matches!(
            err,
            AccessError::Unauthenticated {
                reason: UnauthenticatedReason::Expired
            }
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthenticated_with_invalid_reason() {
        let (access, _) = access_with(vec![]);
        let err = access
            .resolve_identity(Some("definitely.not.a-jwt"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::Unauthenticated {
                reason: UnauthenticatedReason::Invalid
            }
        ));
    }

    #[tokio::test]
    async fn deleted_identity_is_identity_not_found() {
        let (access, tokens) = access_with(vec![]);
        let token = tokens
            .issue_session_token("ghost", "ghost@example.com")
            .unwrap();
        let err = access.resolve_identity(Some(&token)).await.unwrap_err();
        assert!(matches!(err, AccessError::IdentityNotFound { .. }));
    }

    #[tokio::test]
    async fn disabled_account_never_resolves() {
        let (access, tokens) =
            access_with(vec![user("u1", Role::Owner, ALL_PERMISSIONS.to_vec(), false)]);
        let token = tokens.issue_session_token("u1", "u1@example.com").unwrap();
        let err = access.resolve_identity(Some(&token)).await.unwrap_err();
        // Even an owner with every permission is locked out when inactive.
        assert!(matches!(err, AccessError::AccountDisabled { .. }));
    }

    #[tokio::test]
    async fn optional_identity_swallows_every_failure() {
        let (access, tokens) = access_with(vec![user("u1", Role::User, vec![], true)]);

        assert!(access.optional_identity(None).await.is_none());
        assert!(access.optional_identity(Some("garbage")).await.is_none());
        assert!(access
            .optional_identity(Some(&issue_expired(SECRET, "u1")))
            .await
            .is_none());

        let good = tokens.issue_session_token("u1", "u1@example.com").unwrap();
        assert!(access.optional_identity(Some(&good)).await.is_some());
    }

    #[tokio::test]
    async fn optional_identity_degrades_on_backend_failure() {
        let tokens = TokenService::new(SECRET, 7).unwrap();
        let access = AccessControl::new(
            tokens.clone(),
            Arc::new(MemoryStore {
                users: HashMap::new(),
                fail: true,
            }),
        );
        let token = tokens.issue_session_token("u1", "u1@example.com").unwrap();
        assert!(access.optional_identity(Some(&token)).await.is_none());
    }

    #[tokio::test]
    async fn owner_bypasses_every_permission() {
        let (access, _) = access_with(vec![]);
        let owner = user("o", Role::Owner, vec![], true).into_identity();
        for permission in ALL_PERMISSIONS {
            assert!(access.require_permission(&owner, permission).is_ok());
        }
    }

    #[tokio::test]
    async fn non_owner_needs_the_matching_permission() {
        let (access, _) = access_with(vec![]);
        let admin = user(
            "a",
            Role::Admin,
            vec![Permission::UserManagement],
            true,
        )
        .into_identity();

        assert!(access
            .require_permission(&admin, Permission::UserManagement)
            .is_ok());
        let err = access
            .require_permission(&admin, Permission::BillingManagement)
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::PermissionDenied {
                permission: Permission::BillingManagement,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn admin_tier_accepts_the_whole_group() {
        let (access, _) = access_with(vec![]);
        for role in [Role::Admin, Role::Moderator, Role::Owner] {
            let identity = user("x", role, vec![], true).into_identity();
            assert!(access.require_role(&identity, &Role::ADMIN_TIER).is_ok());
        }
        let plain = user("u", Role::User, vec![], true).into_identity();
        let err = access
            .require_role(&plain, &Role::ADMIN_TIER)
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::Forbidden {
                actual: Role::User,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn moderator_without_permissions_scenario() {
        // Moderator with an empty permission list: admin-tier checks
        // pass, specific permission checks fail.
        let (access, _) = access_with(vec![]);
        let moderator = user("m", Role::Moderator, vec![], true).into_identity();

        assert!(access.require_role(&moderator, &Role::ADMIN_TIER).is_ok());
        assert!(matches!(
            access.require_permission(&moderator, Permission::BillingManagement),
            Err(AccessError::PermissionDenied { .. })
        ));
    }

    #[tokio::test]
    async fn auth_failures_collapse_to_generic_401() {
        use platform_core::error::AppError;
        let expired = AccessError::Unauthenticated {
            reason: UnauthenticatedReason::Expired,
        };
        let missing = AccessError::IdentityNotFound {
            id: "u1".to_string(),
        };
        assert!(matches!(AppError::from(expired), AppError::Unauthorized(_)));
        assert!(matches!(AppError::from(missing), AppError::Unauthorized(_)));

        let denied = AccessError::PermissionDenied {
            permission: Permission::BillingManagement,
            held: vec![],
        };
        assert!(matches!(AppError::from(denied), AppError::Forbidden(_)));
    }

    /// Sign an already-expired token with the given secret.
    fn issue_expired(secret: &str, user_id: &str) -> String {
        use jsonwebtoken::{encode, EncodingKey, Header};
        let now = Utc::now();
        let claims = crate::services::jwt::SessionClaims {
            sub: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::days(8)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}
