//! The scoping value threaded through every repository call.

use crate::core_types::{TenantId, UserId};

/// Carries the resolved tenant and (if the caller authenticated) the acting
/// user, for the lifetime of one request. Cheap to clone; construct it once
/// at ingress via [`super::middleware`] and pass it by value or reference
/// into every repository/service call that touches tenant-scoped data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantCtx {
    tenant_id: TenantId,
    user_id: Option<UserId>,
}

impl TenantCtx {
    /// Build a context for an unauthenticated or system operation (background
    /// expirers, migrations). Prefer [`TenantCtx::for_user`] wherever a
    /// request carries an authenticated caller.
    pub fn system(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            user_id: None,
        }
    }

    pub fn for_user(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id: Some(user_id),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The acting user, required. Returns `AccessDenied` for system
    /// contexts used where a human actor is mandatory (e.g. opening a
    /// fiscal day, which is always user-scoped).
    pub fn require_user(&self) -> crate::error::CoreResult<UserId> {
        self.user_id
            .ok_or_else(|| crate::error::CoreError::access_denied("operation requires an authenticated user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_context_has_no_user() {
        let ctx = TenantCtx::system(uuid::Uuid::new_v4());
        assert!(ctx.user_id().is_none());
        assert!(ctx.require_user().is_err());
    }

    #[test]
    fn user_context_round_trips() {
        let tenant = uuid::Uuid::new_v4();
        let user = uuid::Uuid::new_v4();
        let ctx = TenantCtx::for_user(tenant, user);
        assert_eq!(ctx.tenant_id(), tenant);
        assert_eq!(ctx.require_user().unwrap(), user);
    }
}
