use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{CustomerId, TenantId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Normalized `V-12345678` / `E-12345678` form, validated by
    /// [`super::validation::validate_identification`].
    pub identification: Option<String>,
    pub active: bool,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn has_contact_info(&self) -> bool {
        self.phone.is_some() || self.email.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PreferredLanguage {
    Es,
    En,
}

impl Default for PreferredLanguage {
    fn default() -> Self {
        Self::Es
    }
}

/// Auto-materialized with defaults on customer creation: every channel
/// on, promotional messages off.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationPreferences {
    pub customer_id: CustomerId,
    pub tenant_id: TenantId,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub whatsapp_enabled: bool,
    pub phone_enabled: bool,
    pub purchase_confirmations: bool,
    pub payment_reminders: bool,
    pub event_reminders: bool,
    pub promotional_messages: bool,
    pub system_updates: bool,
    pub preferred_language: PreferredLanguage,
}

impl NotificationPreferences {
    pub fn defaults(tenant_id: TenantId, customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            tenant_id,
            email_enabled: true,
            sms_enabled: true,
            whatsapp_enabled: true,
            phone_enabled: false,
            purchase_confirmations: true,
            payment_reminders: true,
            event_reminders: true,
            promotional_messages: false,
            system_updates: true,
            preferred_language: PreferredLanguage::Es,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn defaults_enable_every_channel_except_phone() {
        let prefs = NotificationPreferences::defaults(Uuid::new_v4(), Uuid::new_v4());
        assert!(prefs.email_enabled);
        assert!(prefs.sms_enabled);
        assert!(prefs.whatsapp_enabled);
        assert!(!prefs.phone_enabled);
        assert!(!prefs.promotional_messages);
    }
}
