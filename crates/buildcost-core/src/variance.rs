//! Plan-vs-actual variance
//!
//! Joins estimate items to warehouse consumption and reports the difference
//! between planned and used quantities and amounts. A read-only projection:
//! inputs are never modified and results are recomputed on each request.
//!
//! Differences are `planned - actual`, so a negative value means
//! over-consumption.
//!
//! # Example
//!
//! ```rust
//! use buildcost_core::{EntryDraft, ItemDraft, Project, Unit};
//! use buildcost_core::variance::variance_report;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
//! let mut project = Project::new("Stand", "Site office", date);
//! let id = project
//!     .add_estimate_item(
//!         ItemDraft::new("Finishing", "Wallpaper")
//!             .unit(Unit::Piece)
//!             .planned_quantity(dec!(10))
//!             .unit_cost(dec!(1500)),
//!     )
//!     .unwrap()
//!     .id
//!     .clone();
//! project
//!     .add_warehouse_entry(EntryDraft::new(date, id).actual_quantity(dec!(8)))
//!     .unwrap();
//!
//! let report = variance_report(&project);
//! assert_eq!(report.items[0].total_used, dec!(8));
//! assert_eq!(report.items[0].difference_qty, dec!(2));
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::totals::saturating_sum;
use crate::{CostType, EntryId, EstimateItem, ItemId, Project, Unit, WarehouseEntry};

/// Direction of a plan-vs-actual difference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarianceStatus {
    /// Less used than planned
    Under,
    /// Exactly as planned
    OnPlan,
    /// More used than planned
    Over,
}

impl VarianceStatus {
    /// Classify a `planned - actual` difference
    pub fn of(difference: Decimal) -> Self {
        if difference.is_zero() {
            VarianceStatus::OnPlan
        } else if difference.is_sign_positive() {
            VarianceStatus::Under
        } else {
            VarianceStatus::Over
        }
    }

    pub fn is_over(&self) -> bool {
        *self == VarianceStatus::Over
    }
}

// ============================================================================
// Per-item Variance
// ============================================================================

/// Plan-vs-actual for one estimate item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVariance {
    pub item_id: ItemId,
    pub section: String,
    pub name: String,
    pub cost_type: CostType,
    pub unit: Unit,
    pub planned_quantity: Decimal,
    /// Total consumed across all warehouse entries for this item
    pub total_used: Decimal,
    pub difference_qty: Decimal,
    pub planned_sum: Decimal,
    pub actual_sum: Decimal,
    pub difference_sum: Decimal,
}

impl ItemVariance {
    pub fn quantity_status(&self) -> VarianceStatus {
        VarianceStatus::of(self.difference_qty)
    }

    pub fn sum_status(&self) -> VarianceStatus {
        VarianceStatus::of(self.difference_sum)
    }
}

/// Sum of actual quantities booked against an item; zero if none
pub fn total_used(item_id: &str, warehouse: &[WarehouseEntry]) -> Decimal {
    saturating_sum(
        warehouse
            .iter()
            .filter(|e| e.item_id == item_id)
            .map(|e| e.actual_quantity),
    )
}

/// Variance for a single item
pub fn item_variance(item: &EstimateItem, warehouse: &[WarehouseEntry]) -> ItemVariance {
    let used = total_used(&item.id, warehouse);
    let planned_sum = item.planned_sum();
    let actual_sum = used.saturating_mul(item.unit_cost);

    ItemVariance {
        item_id: item.id.clone(),
        section: item.section.clone(),
        name: item.name.clone(),
        cost_type: item.cost_type,
        unit: item.unit,
        planned_quantity: item.planned_quantity,
        total_used: used,
        difference_qty: item.planned_quantity.saturating_sub(used),
        planned_sum,
        actual_sum,
        difference_sum: planned_sum.saturating_sub(actual_sum),
    }
}

/// Variance for every estimate item, in estimate order
pub fn item_variances(estimate: &[EstimateItem], warehouse: &[WarehouseEntry]) -> Vec<ItemVariance> {
    estimate
        .iter()
        .map(|item| item_variance(item, warehouse))
        .collect()
}

// ============================================================================
// Material Aggregate
// ============================================================================

/// Aggregate quantities over material items only
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub total_planned_quantity: Decimal,
    /// Consumption whose item resolves to a material; orphans are excluded
    pub total_actual_quantity: Decimal,
    pub difference: Decimal,
}

impl MaterialSummary {
    pub fn status(&self) -> VarianceStatus {
        VarianceStatus::of(self.difference)
    }
}

pub fn material_summary(estimate: &[EstimateItem], warehouse: &[WarehouseEntry]) -> MaterialSummary {
    let total_planned_quantity = saturating_sum(
        estimate
            .iter()
            .filter(|i| i.is_material())
            .map(|i| i.planned_quantity),
    );

    let total_actual_quantity = saturating_sum(
        warehouse
            .iter()
            .filter(|e| {
                estimate
                    .iter()
                    .any(|i| i.id == e.item_id && i.is_material())
            })
            .map(|e| e.actual_quantity),
    );

    MaterialSummary {
        total_planned_quantity,
        total_actual_quantity,
        difference: total_planned_quantity.saturating_sub(total_actual_quantity),
    }
}

// ============================================================================
// Report
// ============================================================================

/// Full variance report for a project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub items: Vec<ItemVariance>,
    pub materials: MaterialSummary,
}

impl VarianceReport {
    /// Items consumed beyond plan
    pub fn overruns(&self) -> impl Iterator<Item = &ItemVariance> {
        self.items.iter().filter(|v| v.quantity_status().is_over())
    }
}

pub fn variance_report(project: &Project) -> VarianceReport {
    VarianceReport {
        items: item_variances(project.estimate(), project.warehouse()),
        materials: material_summary(project.estimate(), project.warehouse()),
    }
}

// ============================================================================
// Warehouse Lines
// ============================================================================

/// Display row for one warehouse entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseLine {
    pub entry_id: EntryId,
    pub date: NaiveDate,
    pub item_id: ItemId,
    /// Material name; `None` when the item is missing or not a material
    pub material: Option<String>,
    pub actual_quantity: Decimal,
    /// Planned quantity of the referenced material, zero for orphans
    pub planned_quantity: Decimal,
    /// Planned quantity minus this entry's quantity
    pub difference: Decimal,
    /// Actual quantity × unit cost, zero for orphans
    pub value: Decimal,
    pub comment: String,
}

impl WarehouseLine {
    pub fn is_orphaned(&self) -> bool {
        self.material.is_none()
    }
}

/// One display row per warehouse entry, tolerating dangling references
pub fn warehouse_lines(project: &Project) -> Vec<WarehouseLine> {
    project
        .warehouse()
        .iter()
        .map(|entry| {
            let material = project.get_material(&entry.item_id);
            let planned_quantity = material.map_or(Decimal::ZERO, |m| m.planned_quantity);
            WarehouseLine {
                entry_id: entry.id.clone(),
                date: entry.date,
                item_id: entry.item_id.clone(),
                material: material.map(|m| m.name.clone()),
                actual_quantity: entry.actual_quantity,
                planned_quantity,
                difference: planned_quantity.saturating_sub(entry.actual_quantity),
                value: material.map_or(Decimal::ZERO, |m| {
                    entry.actual_quantity.saturating_mul(m.unit_cost)
                }),
                comment: entry.comment.clone(),
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
