use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use utoipa::ToSchema;

use crate::core_types::{
    EventId, FiscalDayId, FiscalReportId, FiscalSeriesId, TaxCalculationHistoryId, TaxConfigId, TenantId,
    TransactionId, UserId,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FiscalSeries {
    pub id: FiscalSeriesId,
    pub tenant_id: TenantId,
    pub series_number: i64,
    pub transaction_id: TransactionId,
    pub issued_by: UserId,
    pub issued_at: DateTime<Utc>,
    pub is_voided: bool,
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_by: Option<UserId>,
    pub void_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FiscalDay {
    pub id: FiscalDayId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    /// Calendar date in `America/Caracas`, not UTC.
    pub fiscal_date: NaiveDate,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Set in the same transaction that sets `closed_at` - a closed day
    /// always has one, an open day never does.
    pub z_report_id: Option<FiscalReportId>,
}

impl FiscalDay {
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum ReportType {
    X,
    Z,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FiscalReport {
    pub id: FiscalReportId,
    pub tenant_id: TenantId,
    pub report_type: ReportType,
    /// Monotone per `(tenant, report_type)`.
    pub report_number: i64,
    pub fiscal_date: NaiveDate,
    pub user_id: Option<UserId>,
    pub transaction_count: i64,
    pub total_amount: Decimal,
    pub total_tax: Decimal,
    pub first_series_number: Option<i64>,
    pub last_series_number: Option<i64>,
    /// Payment-method breakdown and any extra aggregates, stored as JSON
    /// to avoid a rigid column-per-method schema.
    pub report_data: Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TaxType {
    Percentage,
    Fixed,
    Compound,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaxConfig {
    pub id: TaxConfigId,
    pub tenant_id: TenantId,
    /// Event scope overrides tenant scope by name match.
    pub event_id: Option<EventId>,
    pub name: String,
    pub tax_type: TaxType,
    /// Rate in `[0, 1]` for percentage/compound, ignored for fixed.
    pub rate: Decimal,
    /// Constant amount for `fixed`, ignored otherwise.
    pub fixed_amount: Decimal,
    pub active: bool,
    pub effective_from: DateTime<Utc>,
    /// A config is time-bounded on both ends, not just from the start.
    pub effective_until: Option<DateTime<Utc>>,
}

impl TaxConfig {
    pub fn applies_at(&self, at: DateTime<Utc>) -> bool {
        self.active
            && self.effective_from <= at
            && self.effective_until.map(|until| at <= until).unwrap_or(true)
    }
}

/// One row per config applied to a transaction - the audit trail behind a
/// transaction's `tax` total, kept even after the config itself changes or
/// is deactivated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaxCalculationHistory {
    pub id: TaxCalculationHistoryId,
    pub tenant_id: TenantId,
    pub transaction_id: TransactionId,
    pub tax_config_id: TaxConfigId,
    pub base: Decimal,
    pub amount: Decimal,
    pub calculated_at: DateTime<Utc>,
}
