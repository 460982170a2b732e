//! The price resolution algorithm: pure, deterministic, and independent
//! of persistence so it can be unit tested without a database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::money;

use super::models::{ModifierType, PriceStage, RowPricing};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AppliedModifier {
    pub stage_ordinal: i32,
    pub modifier_type: ModifierType,
    pub modifier_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriceQuote {
    pub unit_price: Decimal,
    pub applied: Vec<AppliedModifier>,
    /// Set when the raw computation went negative and was clamped to zero.
    pub clamped: bool,
}

/// Resolve the unit price for `(zone base price, optional row, instant,
/// stages, row_pricing)`.
///
/// `stages` must already be filtered to this zone/event scope by the
/// caller's repository query; this function only orders and applies them.
/// Ordering: zone-scoped stages first, then event-wide, each group sorted
/// by ordinal, with id as a stable tiebreaker for equal ordinals.
pub fn resolve_price(
    base_price: Decimal,
    row: Option<&str>,
    at: DateTime<Utc>,
    row_pricing: Option<&RowPricing>,
    mut stages: Vec<PriceStage>,
) -> PriceQuote {
    let mut price = base_price;

    if let (Some(_), Some(rp)) = (row, row_pricing) {
        price += rp.offset;
    }

    stages.retain(|s| s.matches_instant(at));
    stages.sort_by(|a, b| {
        let a_zone_scoped = a.zone_id.is_some();
        let b_zone_scoped = b.zone_id.is_some();
        // zone-scoped (true) sorts before event-wide (false)
        b_zone_scoped
            .cmp(&a_zone_scoped)
            .then(a.ordinal.cmp(&b.ordinal))
            .then(a.id.cmp(&b.id))
    });

    let mut applied = Vec::with_capacity(stages.len());
    for stage in &stages {
        price = stage.apply(price);
        applied.push(AppliedModifier {
            stage_ordinal: stage.ordinal,
            modifier_type: stage.modifier_type,
            modifier_value: stage.modifier_value,
        });
    }

    let rounded = money::round_price(price);
    let clamped = rounded.is_sign_negative();
    let unit_price = money::clamp_non_negative(rounded);

    PriceQuote {
        unit_price,
        applied,
        clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn stage(zone_scoped: bool, ordinal: i32, modifier_type: ModifierType, value: Decimal) -> PriceStage {
        PriceStage {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            zone_id: zone_scoped.then(Uuid::new_v4),
            ordinal,
            starts_at: Utc::now() - chrono::Duration::days(1),
            ends_at: Utc::now() + chrono::Duration::days(1),
            modifier_type,
            modifier_value: value,
            active: true,
        }
    }

    #[test]
    fn no_matching_stages_returns_base_price() {
        let quote = resolve_price(dec!(100.00), None, Utc::now(), None, vec![]);
        assert_eq!(quote.unit_price, dec!(100.00));
        assert!(quote.applied.is_empty());
    }

    #[test]
    fn zone_scoped_stage_applies_before_event_wide() {
        let zone_stage = stage(true, 1, ModifierType::Percentage, dec!(0.10));
        let event_stage = stage(false, 1, ModifierType::FixedAdd, dec!(5.00));
        let quote = resolve_price(
            dec!(100.00),
            None,
            Utc::now(),
            None,
            vec![event_stage, zone_stage],
        );
        // (100 * 1.10) + 5 = 115.00, not (100 + 5) * 1.10 = 115.50
        assert_eq!(quote.unit_price, dec!(115.00));
    }

    #[test]
    fn negative_result_clamps_to_zero() {
        let stage = stage(true, 1, ModifierType::FixedAdd, dec!(-500.00));
        let quote = resolve_price(dec!(100.00), None, Utc::now(), None, vec![stage]);
        assert_eq!(quote.unit_price, dec!(0.00));
        assert!(quote.clamped);
    }

    #[test]
    fn inactive_stage_is_ignored() {
        let mut s = stage(true, 1, ModifierType::FixedAdd, dec!(50.00));
        s.active = false;
        let quote = resolve_price(dec!(100.00), None, Utc::now(), None, vec![s]);
        assert_eq!(quote.unit_price, dec!(100.00));
    }
}
