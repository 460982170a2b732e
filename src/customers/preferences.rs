//! Persistence for [`super::models::NotificationPreferences`].

use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::core_types::{CustomerId, TenantId};
use crate::error::CoreResult;

use super::models::{NotificationPreferences, PreferredLanguage};

pub struct PreferencesRepository;

impl PreferencesRepository {
    /// Inserts the default row for a newly created customer, in the same
    /// transaction as the customer insert.
    pub async fn create_defaults(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> CoreResult<NotificationPreferences> {
        let defaults = NotificationPreferences::defaults(tenant_id, customer_id);
        sqlx::query(
            "INSERT INTO notification_preferences \
                (tenant_id, customer_id, email_enabled, sms_enabled, whatsapp_enabled, phone_enabled, \
                 purchase_confirmations, payment_reminders, event_reminders, promotional_messages, \
                 system_updates, preferred_language) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'es')",
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(defaults.email_enabled)
        .bind(defaults.sms_enabled)
        .bind(defaults.whatsapp_enabled)
        .bind(defaults.phone_enabled)
        .bind(defaults.purchase_confirmations)
        .bind(defaults.payment_reminders)
        .bind(defaults.event_reminders)
        .bind(defaults.promotional_messages)
        .bind(defaults.system_updates)
        .execute(&mut **tx)
        .await?;

        Ok(defaults)
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> CoreResult<NotificationPreferences> {
        let row = sqlx::query(
            "SELECT customer_id, tenant_id, email_enabled, sms_enabled, whatsapp_enabled, phone_enabled, \
                    purchase_confirmations, payment_reminders, event_reminders, promotional_messages, \
                    system_updates, preferred_language \
             FROM notification_preferences WHERE tenant_id = $1 AND customer_id = $2",
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| crate::error::CoreError::not_found(format!("preferences for customer {customer_id}")))?;

        let language: String = row.try_get("preferred_language")?;
        Ok(NotificationPreferences {
            customer_id: row.try_get("customer_id")?,
            tenant_id: row.try_get("tenant_id")?,
            email_enabled: row.try_get("email_enabled")?,
            sms_enabled: row.try_get("sms_enabled")?,
            whatsapp_enabled: row.try_get("whatsapp_enabled")?,
            phone_enabled: row.try_get("phone_enabled")?,
            purchase_confirmations: row.try_get("purchase_confirmations")?,
            payment_reminders: row.try_get("payment_reminders")?,
            event_reminders: row.try_get("event_reminders")?,
            promotional_messages: row.try_get("promotional_messages")?,
            system_updates: row.try_get("system_updates")?,
            preferred_language: if language == "en" { PreferredLanguage::En } else { PreferredLanguage::Es },
        })
    }
}
