//! Input boundary for user-entered numbers and line drafts
//!
//! Form fields arrive as text that may be empty mid-edit. They are held as a
//! [`NumericField`] and converted to a strict non-negative [`Decimal`] before
//! anything reaches the totals, variance or mutation code.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::{self, Deserializer, Visitor};

use crate::{CostType, EstimateError, EstimateItem, ItemId, Unit};

// ============================================================================
// Numeric Field
// ============================================================================

/// Largest quantity or unit cost accepted from user input (10^12).
///
/// The product of two bounded values stays far inside the `Decimal` range,
/// so line amounts and their sums cannot overflow for entered data.
pub const MAX_INPUT: Decimal = dec!(1000000000000);

/// A numeric form field: either blank or a non-negative decimal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NumericField {
    #[default]
    Empty,
    Numeric(Decimal),
}

impl NumericField {
    /// Strictly parse user input.
    ///
    /// Accepts digits with at most one decimal separator (`.` or `,`).
    /// Blank input yields `Empty`; anything else is a validation error
    /// attributed to `field`.
    pub fn parse(field: &'static str, text: &str) -> Result<Self, EstimateError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(NumericField::Empty);
        }
        parse_plain_decimal(trimmed)
            .map(NumericField::Numeric)
            .ok_or_else(|| EstimateError::validation(field, "enter a number"))
    }

    /// Leniently coerce text; unparsable input becomes `Empty`
    pub fn coerce(text: &str) -> Self {
        parse_plain_decimal(text.trim())
            .map(NumericField::Numeric)
            .unwrap_or(NumericField::Empty)
    }

    /// Numeric value, with `Empty` counting as zero
    pub fn value(&self) -> Decimal {
        match self {
            NumericField::Empty => Decimal::ZERO,
            NumericField::Numeric(v) => *v,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NumericField::Empty)
    }

    /// Require a strictly positive value no larger than [`MAX_INPUT`]
    pub fn positive(&self, field: &'static str) -> Result<Decimal, EstimateError> {
        match self {
            NumericField::Numeric(v) if *v > MAX_INPUT => Err(too_large(field)),
            NumericField::Numeric(v) if *v > Decimal::ZERO => Ok(*v),
            _ => Err(EstimateError::validation(field, "must be greater than zero")),
        }
    }
}

impl From<Decimal> for NumericField {
    fn from(value: Decimal) -> Self {
        NumericField::Numeric(value)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericField::Empty => Ok(()),
            NumericField::Numeric(v) => write!(f, "{v}"),
        }
    }
}

pub(crate) fn too_large(field: &'static str) -> EstimateError {
    EstimateError::validation(field, format!("must not exceed {MAX_INPUT}"))
}

/// Parse `123`, `12.5`, `12,5`, `.5` or `5.`; no signs, no exponents.
fn parse_plain_decimal(text: &str) -> Option<Decimal> {
    let normalized = text.replace(',', ".");
    let has_digit = normalized.chars().any(|c| c.is_ascii_digit());
    let valid_chars = normalized.chars().all(|c| c.is_ascii_digit() || c == '.');
    if !has_digit || !valid_chars || normalized.matches('.').count() > 1 {
        return None;
    }

    let (int_part, frac_part) = match normalized.split_once('.') {
        Some((i, f)) => (i, f),
        None => (normalized.as_str(), ""),
    };
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let canonical = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    };
    Decimal::from_str(&canonical).ok()
}

/// Deserialize a quantity or price stored as a number or as text.
///
/// Non-numeric, blank, null or negative values coerce to zero.
pub(crate) fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientDecimal;

    impl<'de> Visitor<'de> for LenientDecimal {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or numeric text")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(v).max(Decimal::ZERO))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
            Ok(Decimal::from_f64(v)
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
            Ok(NumericField::coerce(v).value())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_none<E: de::Error>(self) -> Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }
    }

    deserializer.deserialize_any(LenientDecimal)
}

// ============================================================================
// Drafts
// ============================================================================

/// Unvalidated estimate line, as collected from a form
#[derive(Clone, Debug, PartialEq)]
pub struct ItemDraft {
    pub section: String,
    pub name: String,
    pub cost_type: CostType,
    pub unit: Unit,
    pub planned_quantity: NumericField,
    pub unit_cost: NumericField,
}

impl ItemDraft {
    /// Start a draft; cost type defaults to materials, unit to m²
    pub fn new(section: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            name: name.into(),
            cost_type: CostType::Materials,
            unit: Unit::SquareMeter,
            planned_quantity: NumericField::Empty,
            unit_cost: NumericField::Empty,
        }
    }

    /// Prefill a draft from an existing item, for editing
    pub fn from_item(item: &EstimateItem) -> Self {
        Self {
            section: item.section.clone(),
            name: item.name.clone(),
            cost_type: item.cost_type,
            unit: item.unit,
            planned_quantity: item.planned_quantity.into(),
            unit_cost: item.unit_cost.into(),
        }
    }

    pub fn cost_type(mut self, cost_type: CostType) -> Self {
        self.cost_type = cost_type;
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn planned_quantity(mut self, quantity: impl Into<NumericField>) -> Self {
        self.planned_quantity = quantity.into();
        self
    }

    pub fn unit_cost(mut self, cost: impl Into<NumericField>) -> Self {
        self.unit_cost = cost.into();
        self
    }

    /// Validate and build an item carrying the given id
    pub fn into_item(self, id: ItemId) -> Result<EstimateItem, EstimateError> {
        let section = self.section.trim();
        if section.is_empty() {
            return Err(EstimateError::validation("section", "specify a section"));
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(EstimateError::validation("name", "specify a name"));
        }
        let planned_quantity = self.planned_quantity.positive("planned quantity")?;
        let unit_cost = self.unit_cost.positive("unit cost")?;

        Ok(EstimateItem {
            id,
            section: section.to_string(),
            name: name.to_string(),
            cost_type: self.cost_type,
            unit: self.unit,
            planned_quantity,
            unit_cost,
        })
    }
}

/// Unvalidated warehouse consumption record
#[derive(Clone, Debug, PartialEq)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub item_id: ItemId,
    pub actual_quantity: NumericField,
    pub comment: String,
}

impl EntryDraft {
    pub fn new(date: NaiveDate, item_id: impl Into<ItemId>) -> Self {
        Self {
            date,
            item_id: item_id.into(),
            actual_quantity: NumericField::Empty,
            comment: String::new(),
        }
    }

    pub fn actual_quantity(mut self, quantity: impl Into<NumericField>) -> Self {
        self.actual_quantity = quantity.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
