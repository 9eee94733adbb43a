//! # buildcost-core
//!
//! Core domain model and calculation engine for construction estimates.
//!
//! This crate provides:
//! - Domain types: `Project`, `EstimateItem`, `WarehouseEntry`, `CostType`, `Unit`
//! - The totals engine (`totals`) and plan-vs-actual variance (`variance`)
//! - Lifecycle-guarded mutations on `Project` (`manager`)
//! - Input boundary types for form data (`input`)
//! - Core traits: `Renderer`, `ProjectStore`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use buildcost_core::{CostType, ItemDraft, Project, Unit};
//! use buildcost_core::totals::estimate_totals;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
//! let mut project = Project::new("Office fit-out", "Site office", date);
//! project
//!     .add_estimate_item(
//!         ItemDraft::new("Finishing", "Wallpaper")
//!             .cost_type(CostType::Materials)
//!             .unit(Unit::Piece)
//!             .planned_quantity(dec!(10))
//!             .unit_cost(dec!(1500)),
//!     )
//!     .unwrap();
//!
//! let totals = estimate_totals(project.estimate());
//! assert_eq!(totals.total_with_vat, dec!(18000));
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod input;
pub mod manager;
pub mod portfolio;
pub mod sample;
pub mod store;
pub mod totals;
pub mod variance;

pub use input::{EntryDraft, ItemDraft, NumericField};
pub use portfolio::Portfolio;
pub use store::{MemoryStore, ProjectStore};
pub use totals::EstimateTotals;
pub use variance::{ItemVariance, MaterialSummary, VarianceReport, VarianceStatus};

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a project
pub type ProjectId = String;

/// Unique identifier for an estimate line item
pub type ItemId = String;

/// Unique identifier for a warehouse entry
pub type EntryId = String;

/// Generate a fresh, time-ordered identifier
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

// ============================================================================
// Cost Types and Units
// ============================================================================

/// Category of expenditure for an estimate line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostType {
    Materials,
    Rent,
    Labor,
    Services,
}

impl CostType {
    /// All categories, in report order
    pub const ALL: [CostType; 4] = [
        CostType::Materials,
        CostType::Rent,
        CostType::Labor,
        CostType::Services,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostType::Materials => "Materials",
            CostType::Rent => "Rent",
            CostType::Labor => "Labor",
            CostType::Services => "Services",
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostType {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "materials" | "material" => Ok(CostType::Materials),
            "rent" => Ok(CostType::Rent),
            "labor" | "labour" => Ok(CostType::Labor),
            "services" | "service" => Ok(CostType::Services),
            other => Err(EstimateError::Validation {
                field: "cost type",
                message: format!("unknown cost type '{other}'"),
            }),
        }
    }
}

/// Unit of measurement for planned and actual quantities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    SquareMeter,
    LinearMeter,
    Piece,
    Set,
    ManHour,
}

impl Unit {
    pub const ALL: [Unit; 5] = [
        Unit::SquareMeter,
        Unit::LinearMeter,
        Unit::Piece,
        Unit::Set,
        Unit::ManHour,
    ];

    /// Short label used in tables and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::SquareMeter => "m²",
            Unit::LinearMeter => "lm",
            Unit::Piece => "pcs",
            Unit::Set => "set",
            Unit::ManHour => "man-h",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m2" | "m²" | "sqm" | "square_meter" => Ok(Unit::SquareMeter),
            "lm" | "m" | "linear_meter" => Ok(Unit::LinearMeter),
            "pcs" | "pc" | "piece" => Ok(Unit::Piece),
            "set" => Ok(Unit::Set),
            "man-h" | "manhour" | "man_hour" => Ok(Unit::ManHour),
            other => Err(EstimateError::Validation {
                field: "unit",
                message: format!("unknown unit '{other}'"),
            }),
        }
    }
}

// ============================================================================
// Estimate Item
// ============================================================================

/// One budget line of a project estimate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimateItem {
    /// Unique identifier, immutable once assigned
    pub id: ItemId,
    /// Free-text grouping key
    pub section: String,
    pub name: String,
    pub cost_type: CostType,
    pub unit: Unit,
    #[serde(deserialize_with = "input::lenient_decimal")]
    pub planned_quantity: Decimal,
    #[serde(deserialize_with = "input::lenient_decimal")]
    pub unit_cost: Decimal,
}

impl EstimateItem {
    /// Planned amount: quantity × unit cost, clamped at `Decimal::MAX`
    pub fn planned_sum(&self) -> Decimal {
        self.planned_quantity.saturating_mul(self.unit_cost)
    }

    pub fn is_material(&self) -> bool {
        self.cost_type == CostType::Materials
    }
}

// ============================================================================
// Warehouse Entry
// ============================================================================

/// A record of actual material consumption against a planned item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WarehouseEntry {
    pub id: EntryId,
    pub project_id: ProjectId,
    pub date: NaiveDate,
    /// Estimate item this consumption is booked against
    pub item_id: ItemId,
    #[serde(deserialize_with = "input::lenient_decimal")]
    pub actual_quantity: Decimal,
    #[serde(default)]
    pub comment: String,
}

// ============================================================================
// Project
// ============================================================================

/// Lifecycle state of a project
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectState {
    /// Estimate is editable
    Draft,
    /// Estimate is locked and approved; terminal
    Approved,
}

impl ProjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::Draft => "draft",
            ProjectState::Approved => "approved",
        }
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: a project with its estimate and warehouse log
///
/// Collections and lifecycle flags are only reachable through the
/// operations in [`manager`], which enforce the lock invariant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredProject")]
pub struct Project {
    id: ProjectId,
    name: String,
    prepared_by: String,
    preparation_date: NaiveDate,
    created_at: DateTime<Utc>,
    locked: bool,
    approved: bool,
    estimate: Vec<EstimateItem>,
    warehouse: Vec<WarehouseEntry>,
}

/// Project as found on disk, before the lifecycle flags are reconciled
#[derive(Deserialize)]
struct StoredProject {
    id: ProjectId,
    name: String,
    #[serde(default)]
    prepared_by: String,
    preparation_date: NaiveDate,
    created_at: DateTime<Utc>,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    approved: bool,
    #[serde(default)]
    estimate: Vec<EstimateItem>,
    #[serde(default)]
    warehouse: Vec<WarehouseEntry>,
}

impl From<StoredProject> for Project {
    /// Either flag set means the estimate was approved; both end up set.
    fn from(stored: StoredProject) -> Self {
        let approved = stored.locked || stored.approved;
        if stored.locked != stored.approved {
            tracing::warn!(
                project = %stored.id,
                locked = stored.locked,
                approved = stored.approved,
                "inconsistent lifecycle flags, loading as approved"
            );
        }

        Self {
            id: stored.id,
            name: stored.name,
            prepared_by: stored.prepared_by,
            preparation_date: stored.preparation_date,
            created_at: stored.created_at,
            locked: approved,
            approved,
            estimate: stored.estimate,
            warehouse: stored.warehouse,
        }
    }
}

impl Project {
    /// Create a new draft project with empty estimate and warehouse
    pub fn new(
        name: impl Into<String>,
        prepared_by: impl Into<String>,
        preparation_date: NaiveDate,
    ) -> Self {
        Self::with_id(new_id(), name, prepared_by, preparation_date)
    }

    /// Create a new draft project with a caller-chosen id
    pub fn with_id(
        id: impl Into<ProjectId>,
        name: impl Into<String>,
        prepared_by: impl Into<String>,
        preparation_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prepared_by: prepared_by.into(),
            preparation_date,
            created_at: Utc::now(),
            locked: false,
            approved: false,
            estimate: Vec::new(),
            warehouse: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prepared_by(&self) -> &str {
        &self.prepared_by
    }

    pub fn preparation_date(&self) -> NaiveDate {
        self.preparation_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    pub fn state(&self) -> ProjectState {
        if self.locked {
            ProjectState::Approved
        } else {
            ProjectState::Draft
        }
    }

    pub fn estimate(&self) -> &[EstimateItem] {
        &self.estimate
    }

    pub fn warehouse(&self) -> &[WarehouseEntry] {
        &self.warehouse
    }

    /// Get an estimate item by ID
    pub fn get_item(&self, id: &str) -> Option<&EstimateItem> {
        self.estimate.iter().find(|i| i.id == id)
    }

    /// Get an estimate item by ID if it is a material
    pub fn get_material(&self, id: &str) -> Option<&EstimateItem> {
        self.get_item(id).filter(|i| i.is_material())
    }

    /// Get a warehouse entry by ID
    pub fn get_entry(&self, id: &str) -> Option<&WarehouseEntry> {
        self.warehouse.iter().find(|e| e.id == id)
    }

    /// Distinct section names, in order of first appearance
    pub fn sections(&self) -> Vec<&str> {
        let mut sections: Vec<&str> = Vec::new();
        for item in &self.estimate {
            if !sections.contains(&item.section.as_str()) {
                sections.push(&item.section);
            }
        }
        sections
    }

    /// Items belonging to a section, in estimate order
    pub fn items_in_section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a EstimateItem> {
        self.estimate.iter().filter(move |i| i.section == section)
    }

    /// Listing label, marking approved projects
    pub fn display_name(&self) -> String {
        if self.locked {
            format!("{} (approved)", self.name)
        } else {
            self.name.clone()
        }
    }
}

// ============================================================================
// Core Traits
// ============================================================================

/// Output renderer for a project snapshot
pub trait Renderer {
    type Output;

    fn render(&self, project: &Project) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Kind of record referenced by a `NotFound` error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Project,
    EstimateItem,
    WarehouseEntry,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Project => "Project",
            RecordKind::EstimateItem => "Estimate item",
            RecordKind::WarehouseEntry => "Warehouse entry",
        })
    }
}

/// Why a warehouse entry's item reference was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceProblem {
    /// No estimate item with that id
    Missing,
    /// The item exists but is not a material
    NotMaterial(CostType),
}

impl fmt::Display for ReferenceProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceProblem::Missing => f.write_str("no such item in the estimate"),
            ReferenceProblem::NotMaterial(cost_type) => {
                write!(f, "item is {cost_type}, not Materials")
            }
        }
    }
}

/// Estimate mutation error
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("Project {0} is approved; its estimate is locked")]
    LockedProject(ProjectId),

    #[error("Project {0} is already approved")]
    AlreadyLocked(ProjectId),

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("Invalid item reference {item_id}: {reason}")]
    InvalidReference {
        item_id: ItemId,
        reason: ReferenceProblem,
    },

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl EstimateError {
    pub(crate) fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        EstimateError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EstimateError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Persistence error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
