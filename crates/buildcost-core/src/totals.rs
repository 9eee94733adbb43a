//! Estimate totals
//!
//! Pure aggregation over estimate lines: per-category sums, VAT, the
//! contingency reserve, and per-section subtotals. Nothing here is cached;
//! callers recompute on every render.
//!
//! All arithmetic is exact [`Decimal`]. Rounding happens only in
//! [`format_amount`], at presentation time.
//!
//! # Example
//!
//! ```rust
//! use buildcost_core::totals::estimate_totals;
//! use rust_decimal_macros::dec;
//!
//! let totals = estimate_totals(&[]);
//! assert_eq!(totals.total_with_vat, dec!(0));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{CostType, EstimateItem, Project};

/// VAT rate applied to the pre-tax total
pub const VAT_RATE: Decimal = dec!(0.20);

/// Contingency reserve rate; informational, never added into the VAT total
pub const CONTINGENCY_RATE: Decimal = dec!(0.05);

// ============================================================================
// Estimate Totals
// ============================================================================

/// Financial totals for an estimate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateTotals {
    pub materials: Decimal,
    pub rent: Decimal,
    pub labor: Decimal,
    pub services: Decimal,
    /// Sum of the four category sums
    pub total_without_vat: Decimal,
    pub vat: Decimal,
    pub total_with_vat: Decimal,
    pub contingency: Decimal,
}

impl EstimateTotals {
    /// Sum for one cost category
    pub fn sum(&self, cost_type: CostType) -> Decimal {
        match cost_type {
            CostType::Materials => self.materials,
            CostType::Rent => self.rent,
            CostType::Labor => self.labor,
            CostType::Services => self.services,
        }
    }

    fn category_mut(&mut self, cost_type: CostType) -> &mut Decimal {
        match cost_type {
            CostType::Materials => &mut self.materials,
            CostType::Rent => &mut self.rent,
            CostType::Labor => &mut self.labor,
            CostType::Services => &mut self.services,
        }
    }
}

/// Compute category sums, VAT and contingency for a list of items
pub fn estimate_totals(items: &[EstimateItem]) -> EstimateTotals {
    let mut totals = EstimateTotals::default();
    for item in items {
        let slot = totals.category_mut(item.cost_type);
        *slot = slot.saturating_add(item.planned_sum());
    }

    totals.total_without_vat = saturating_sum(CostType::ALL.iter().map(|c| totals.sum(*c)));
    totals.vat = totals.total_without_vat.saturating_mul(VAT_RATE);
    totals.total_with_vat = totals.total_without_vat.saturating_add(totals.vat);
    totals.contingency = totals.total_without_vat.saturating_mul(CONTINGENCY_RATE);
    totals
}

/// Sum that clamps at the `Decimal` range instead of overflowing.
///
/// Totals are recomputed on every render and must not panic, whatever
/// magnitudes a loaded store carries.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

// ============================================================================
// Section Totals
// ============================================================================

/// Planned amount of one estimate section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTotal {
    pub section: String,
    pub item_count: usize,
    pub amount: Decimal,
}

/// Subtotals per section, in order of first appearance
pub fn section_totals(items: &[EstimateItem]) -> Vec<SectionTotal> {
    let mut sections: Vec<SectionTotal> = Vec::new();
    for item in items {
        match sections.iter_mut().find(|s| s.section == item.section) {
            Some(total) => {
                total.item_count += 1;
                total.amount = total.amount.saturating_add(item.planned_sum());
            }
            None => sections.push(SectionTotal {
                section: item.section.clone(),
                item_count: 1,
                amount: item.planned_sum(),
            }),
        }
    }
    sections
}

// ============================================================================
// Warehouse Value
// ============================================================================

/// Value of recorded consumption: actual quantity × unit cost.
///
/// Entries whose item is missing or not a material contribute nothing.
pub fn warehouse_value(project: &Project) -> Decimal {
    saturating_sum(project.warehouse().iter().filter_map(|entry| {
        project
            .get_material(&entry.item_id)
            .map(|item| entry.actual_quantity.saturating_mul(item.unit_cost))
    }))
}

// ============================================================================
// Presentation
// ============================================================================

/// Round to two places for display
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Format an amount with two decimals and space-grouped thousands
///
/// `1234567.891` becomes `1 234 567.89`.
pub fn format_amount(value: Decimal) -> String {
    let text = round_money(value).abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && !round_money(value).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

// ============================================================================
// Tests
// ============================================================================
