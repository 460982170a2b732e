//! Tenant row storage and slug/subdomain lookups used during resolution.

use crate::core_types::TenantId;
use crate::error::CoreResult;
use sqlx::PgPool;
use sqlx::Row;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Tenant {
    pub id: TenantId,
    pub slug: String,
    pub active: bool,
}

pub struct TenantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TenantRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: TenantId) -> CoreResult<Tenant> {
        let row = sqlx::query("SELECT id, slug, active FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| crate::error::CoreError::not_found(format!("tenant {id}")))?;

        Ok(Tenant {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            active: row.try_get("active")?,
        })
    }

    pub async fn find_by_slug(&self, slug: &str) -> CoreResult<Tenant> {
        let row = sqlx::query("SELECT id, slug, active FROM tenants WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| crate::error::CoreError::not_found(format!("tenant slug {slug}")))?;

        Ok(Tenant {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            active: row.try_get("active")?,
        })
    }

    /// Every active tenant, used by background sweeps that must
    /// iterate tenant-by-tenant rather than run one cross-tenant query.
    pub async fn list_active(&self) -> CoreResult<Vec<Tenant>> {
        let rows = sqlx::query("SELECT id, slug, active FROM tenants WHERE active")
            .fetch_all(self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Tenant {
                    id: row.try_get("id")?,
                    slug: row.try_get("slug")?,
                    active: row.try_get("active")?,
                })
            })
            .collect()
    }

    /// The tenant a user belongs to, used as the last-resort resolution
    /// step.
    pub async fn find_primary_for_user(
        &self,
        user_id: crate::core_types::UserId,
    ) -> CoreResult<Tenant> {
        let row = sqlx::query(
            "SELECT t.id, t.slug, t.active FROM tenants t \
             JOIN users u ON u.tenant_id = t.id \
             WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| crate::error::CoreError::not_found(format!("user {user_id}")))?;

        Ok(Tenant {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            active: row.try_get("active")?,
        })
    }
}
