//! Tax engine. Each config's formula is evaluated on its own and recorded
//! independently - when multiple compound configs apply simultaneously,
//! nothing special happens: `calculate_tax` is a per-row pure function,
//! never combined across rows before rounding. This engine sums
//! independently-computed, independently-recorded amounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Postgres, Row, Transaction};
use utoipa::ToSchema;

use crate::core_types::{TenantId, TransactionId};
use crate::error::CoreResult;
use crate::money;

use super::models::{TaxCalculationHistory, TaxConfig, TaxType};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaxLineItem {
    pub config_id: crate::core_types::TaxConfigId,
    pub config_name: String,
    pub base: Decimal,
    pub amount: Decimal,
}

pub struct TaxEngine;

impl TaxEngine {
    /// `configs` must already be resolved to this (tenant, event) scope
    /// with event-scoped configs overriding tenant-scoped ones by name
    /// match - that merge happens in the repository layer, not here.
    pub fn calculate(base: Decimal, at: DateTime<Utc>, configs: &[TaxConfig]) -> Vec<TaxLineItem> {
        configs
            .iter()
            .filter(|c| c.applies_at(at))
            .map(|c| TaxLineItem {
                config_id: c.id,
                config_name: c.name.clone(),
                base,
                amount: Self::amount_for(base, c),
            })
            .collect()
    }

    pub fn total(line_items: &[TaxLineItem]) -> Decimal {
        line_items.iter().map(|i| i.amount).sum()
    }

    /// Records one `TaxCalculationHistory` row per applied config, tying
    /// the transaction to the config, base and amount it was charged -
    /// called inside the caller's checkout transaction so the history
    /// commits atomically with the totals it explains.
    pub async fn persist_history(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: TenantId,
        transaction_id: TransactionId,
        line_items: &[TaxLineItem],
    ) -> CoreResult<Vec<TaxCalculationHistory>> {
        let mut recorded = Vec::with_capacity(line_items.len());
        for item in line_items {
            let row = sqlx::query(
                "INSERT INTO tax_calculation_history \
                    (tenant_id, transaction_id, tax_config_id, base, amount, calculated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id, tenant_id, transaction_id, tax_config_id, base, amount, calculated_at",
            )
            .bind(tenant_id)
            .bind(transaction_id)
            .bind(item.config_id)
            .bind(item.base)
            .bind(item.amount)
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await?;

            recorded.push(TaxCalculationHistory {
                id: row.try_get("id")?,
                tenant_id: row.try_get("tenant_id")?,
                transaction_id: row.try_get("transaction_id")?,
                tax_config_id: row.try_get("tax_config_id")?,
                base: row.try_get("base")?,
                amount: row.try_get("amount")?,
                calculated_at: row.try_get("calculated_at")?,
            });
        }
        Ok(recorded)
    }

    fn amount_for(base: Decimal, config: &TaxConfig) -> Decimal {
        match config.tax_type {
            TaxType::Fixed => config.fixed_amount,
            TaxType::Percentage => money::round_up(base * config.rate),
            TaxType::Compound => {
                let simple = base * config.rate;
                money::round_up(simple + simple * config.rate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn config(tax_type: TaxType, rate: Decimal, fixed: Decimal) -> TaxConfig {
        TaxConfig {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            event_id: None,
            name: "test".to_string(),
            tax_type,
            rate,
            fixed_amount: fixed,
            active: true,
            effective_from: Utc::now() - chrono::Duration::days(1),
            effective_until: None,
        }
    }

    #[test]
    fn percentage_rounds_up() {
        let c = config(TaxType::Percentage, dec!(0.16), dec!(0.00));
        let items = TaxEngine::calculate(dec!(100.001), Utc::now(), &[c]);
        // 100.001 * 0.16 = 16.00016 -> round up to 16.01
        assert_eq!(items[0].amount, dec!(16.01));
    }

    #[test]
    fn fixed_ignores_base() {
        let c = config(TaxType::Fixed, dec!(0.00), dec!(5.00));
        let items = TaxEngine::calculate(dec!(1000.00), Utc::now(), &[c]);
        assert_eq!(items[0].amount, dec!(5.00));
    }

    #[test]
    fn compound_is_base_rate_plus_rate_squared_term() {
        let c = config(TaxType::Compound, dec!(0.10), dec!(0.00));
        let items = TaxEngine::calculate(dec!(100.00), Utc::now(), &[c]);
        // 100*0.10 + (100*0.10)*0.10 = 10 + 1 = 11.00
        assert_eq!(items[0].amount, dec!(11.00));
    }

    #[test]
    fn inactive_window_excludes_config() {
        let mut c = config(TaxType::Fixed, dec!(0.00), dec!(5.00));
        c.effective_until = Some(Utc::now() - chrono::Duration::days(1));
        let items = TaxEngine::calculate(dec!(100.00), Utc::now(), &[c]);
        assert!(items.is_empty());
    }
}
