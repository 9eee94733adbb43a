//! Lifecycle-guarded mutations on a project
//!
//! Every change to a project's estimate, warehouse log, header or
//! lock/approve flags goes through the operations here. Each operation
//! checks all of its preconditions before touching the project, so a
//! failed call leaves the project exactly as it was.
//!
//! ## Lifecycle
//!
//! ```text
//! Draft (locked = false) --approve--> Approved (locked = approved = true)
//! ```
//!
//! `Approved` is terminal. Locking freezes the estimate and the project
//! header; warehouse entries can still be recorded and corrected.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::input::{too_large, MAX_INPUT};
use crate::{
    new_id, EntryDraft, EstimateError, EstimateItem, ItemDraft, Project, RecordKind,
    ReferenceProblem, WarehouseEntry,
};

impl Project {
    fn ensure_unlocked(&self) -> Result<(), EstimateError> {
        if self.locked {
            Err(EstimateError::LockedProject(self.id.clone()))
        } else {
            Ok(())
        }
    }

    fn item_index(&self, id: &str) -> Result<usize, EstimateError> {
        self.estimate
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| EstimateError::not_found(RecordKind::EstimateItem, id))
    }

    fn entry_index(&self, id: &str) -> Result<usize, EstimateError> {
        self.warehouse
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EstimateError::not_found(RecordKind::WarehouseEntry, id))
    }

    /// Append a new estimate line with a freshly generated id
    pub fn add_estimate_item(&mut self, draft: ItemDraft) -> Result<&EstimateItem, EstimateError> {
        self.ensure_unlocked()?;
        let item = draft.into_item(new_id())?;

        tracing::debug!(project = %self.id, item = %item.id, "estimate item added");
        self.estimate.push(item);
        let last = self.estimate.len() - 1;
        Ok(&self.estimate[last])
    }

    /// Replace an estimate line in place, keeping its id and position
    pub fn update_estimate_item(
        &mut self,
        id: &str,
        draft: ItemDraft,
    ) -> Result<&EstimateItem, EstimateError> {
        self.ensure_unlocked()?;
        let index = self.item_index(id)?;
        let item = draft.into_item(id.to_string())?;

        tracing::debug!(project = %self.id, item = %id, "estimate item updated");
        self.estimate[index] = item;
        Ok(&self.estimate[index])
    }

    /// Remove an estimate line.
    ///
    /// Warehouse entries that reference it are kept; they become orphaned
    /// and drop out of material aggregates.
    pub fn remove_estimate_item(&mut self, id: &str) -> Result<EstimateItem, EstimateError> {
        self.ensure_unlocked()?;
        let index = self.item_index(id)?;

        let orphaned = self.warehouse.iter().filter(|e| e.item_id == id).count();
        tracing::debug!(project = %self.id, item = %id, orphaned, "estimate item removed");
        Ok(self.estimate.remove(index))
    }

    /// Record material consumption against a material line of this project
    pub fn add_warehouse_entry(&mut self, draft: EntryDraft) -> Result<&WarehouseEntry, EstimateError> {
        match self.get_item(&draft.item_id) {
            None => {
                return Err(EstimateError::InvalidReference {
                    item_id: draft.item_id,
                    reason: ReferenceProblem::Missing,
                })
            }
            Some(item) if !item.is_material() => {
                return Err(EstimateError::InvalidReference {
                    item_id: draft.item_id,
                    reason: ReferenceProblem::NotMaterial(item.cost_type),
                })
            }
            Some(_) => {}
        }
        let actual_quantity = draft.actual_quantity.positive("actual quantity")?;

        let entry = WarehouseEntry {
            id: new_id(),
            project_id: self.id.clone(),
            date: draft.date,
            item_id: draft.item_id,
            actual_quantity,
            comment: draft.comment.trim().to_string(),
        };
        tracing::debug!(project = %self.id, entry = %entry.id, item = %entry.item_id, "warehouse entry added");
        self.warehouse.push(entry);
        let last = self.warehouse.len() - 1;
        Ok(&self.warehouse[last])
    }

    /// Correct the consumed quantity of an entry; the item reference is fixed
    pub fn update_warehouse_entry(
        &mut self,
        id: &str,
        actual_quantity: Decimal,
    ) -> Result<&WarehouseEntry, EstimateError> {
        let index = self.entry_index(id)?;
        if actual_quantity < Decimal::ZERO {
            return Err(EstimateError::validation(
                "actual quantity",
                "must not be negative",
            ));
        }
        if actual_quantity > MAX_INPUT {
            return Err(too_large("actual quantity"));
        }

        tracing::debug!(project = %self.id, entry = %id, %actual_quantity, "warehouse entry updated");
        self.warehouse[index].actual_quantity = actual_quantity;
        Ok(&self.warehouse[index])
    }

    /// Change who prepared the estimate and when
    pub fn update_details(
        &mut self,
        prepared_by: impl Into<String>,
        preparation_date: NaiveDate,
    ) -> Result<(), EstimateError> {
        self.ensure_unlocked()?;
        self.prepared_by = prepared_by.into().trim().to_string();
        self.preparation_date = preparation_date;
        Ok(())
    }

    /// Approve the estimate, locking it for good
    pub fn approve(&mut self) -> Result<(), EstimateError> {
        if self.locked {
            return Err(EstimateError::AlreadyLocked(self.id.clone()));
        }
        self.locked = true;
        self.approved = true;

        tracing::info!(project = %self.id, items = self.estimate.len(), "estimate approved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CostType, ProjectState, Unit};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn wallpaper() -> ItemDraft {
        ItemDraft::new("Finishing", "Wallpaper")
            .cost_type(CostType::Materials)
            .unit(Unit::Piece)
            .planned_quantity(dec!(10))
            .unit_cost(dec!(1500))
    }

    fn painting() -> ItemDraft {
        ItemDraft::new("Finishing", "Wall painting")
            .cost_type(CostType::Labor)
            .unit(Unit::SquareMeter)
            .planned_quantity(dec!(45))
            .unit_cost(dec!(300))
    }

    fn project() -> Project {
        Project::with_id("1", "Stand 10796", "Site office", date(10))
    }

    #[test]
    fn add_item_assigns_unique_ids() {
        let mut p = project();
        let a = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        let b = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        assert_ne!(a, b);
        assert_eq!(p.estimate().len(), 2);
    }

    #[test]
    fn invalid_draft_leaves_estimate_unchanged() {
        let mut p = project();
        let err = p
            .add_estimate_item(wallpaper().unit_cost(Decimal::ZERO))
            .unwrap_err();
        assert!(matches!(err, EstimateError::Validation { .. }));
        assert!(p.estimate().is_empty());
    }

    #[test]
    fn oversized_draft_leaves_estimate_unchanged() {
        let mut p = project();
        let huge = dec!(1000000000000000);
        let err = p
            .add_estimate_item(wallpaper().planned_quantity(huge).unit_cost(huge))
            .unwrap_err();
        assert!(matches!(err, EstimateError::Validation { field: "planned quantity", .. }));
        assert!(p.estimate().is_empty());

        let id = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        let err = p
            .update_estimate_item(&id, wallpaper().unit_cost(huge))
            .unwrap_err();
        assert!(matches!(err, EstimateError::Validation { field: "unit cost", .. }));
        assert_eq!(p.estimate()[0].unit_cost, dec!(1500));

        let limit = p
            .add_estimate_item(wallpaper().planned_quantity(MAX_INPUT).unit_cost(MAX_INPUT))
            .unwrap();
        assert_eq!(limit.planned_sum(), MAX_INPUT * MAX_INPUT);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut p = project();
        let first = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        let second = p.add_estimate_item(painting()).unwrap().id.clone();

        let updated = p
            .update_estimate_item(&first, wallpaper().planned_quantity(dec!(12)))
            .unwrap();
        assert_eq!(updated.id, first);
        assert_eq!(updated.planned_quantity, dec!(12));

        let ids: Vec<&str> = p.estimate().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str()]);
    }

    #[test]
    fn update_unknown_item_is_not_found() {
        let mut p = project();
        let err = p.update_estimate_item("nope", wallpaper()).unwrap_err();
        assert_eq!(
            err,
            EstimateError::NotFound {
                kind: RecordKind::EstimateItem,
                id: "nope".into()
            }
        );
    }

    #[test]
    fn remove_keeps_orphaned_entries() {
        let mut p = project();
        let id = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        p.add_warehouse_entry(EntryDraft::new(date(15), id.clone()).actual_quantity(dec!(8)))
            .unwrap();

        let removed = p.remove_estimate_item(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(p.estimate().is_empty());
        assert_eq!(p.warehouse().len(), 1);
        assert_eq!(p.warehouse()[0].item_id, id);
    }

    #[test]
    fn warehouse_entry_must_reference_a_material() {
        let mut p = project();
        let labor = p.add_estimate_item(painting()).unwrap().id.clone();

        let err = p
            .add_warehouse_entry(EntryDraft::new(date(15), labor.clone()).actual_quantity(dec!(1)))
            .unwrap_err();
        assert_eq!(
            err,
            EstimateError::InvalidReference {
                item_id: labor,
                reason: ReferenceProblem::NotMaterial(CostType::Labor),
            }
        );

        let err = p
            .add_warehouse_entry(EntryDraft::new(date(15), "ghost").actual_quantity(dec!(1)))
            .unwrap_err();
        assert!(matches!(
            err,
            EstimateError::InvalidReference {
                reason: ReferenceProblem::Missing,
                ..
            }
        ));
        assert!(p.warehouse().is_empty());
    }

    #[test]
    fn warehouse_entry_requires_positive_quantity() {
        let mut p = project();
        let id = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        let err = p.add_warehouse_entry(EntryDraft::new(date(15), id)).unwrap_err();
        assert!(matches!(err, EstimateError::Validation { field: "actual quantity", .. }));
        assert!(p.warehouse().is_empty());
    }

    #[test]
    fn warehouse_entry_carries_project_id() {
        let mut p = project();
        let id = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        let entry = p
            .add_warehouse_entry(
                EntryDraft::new(date(15), id)
                    .actual_quantity(dec!(8))
                    .comment("  left in stock "),
            )
            .unwrap();
        assert_eq!(entry.project_id, "1");
        assert_eq!(entry.comment, "left in stock");
    }

    #[test]
    fn update_entry_changes_quantity_only() {
        let mut p = project();
        let item = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        let entry = p
            .add_warehouse_entry(EntryDraft::new(date(15), item.clone()).actual_quantity(dec!(8)))
            .unwrap()
            .id
            .clone();

        let updated = p.update_warehouse_entry(&entry, dec!(0)).unwrap();
        assert_eq!(updated.actual_quantity, dec!(0));
        assert_eq!(updated.item_id, item);

        assert!(p.update_warehouse_entry(&entry, dec!(-1)).is_err());
        assert_eq!(p.warehouse()[0].actual_quantity, dec!(0));

        let err = p.update_warehouse_entry("missing", dec!(1)).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::NotFound {
                kind: RecordKind::WarehouseEntry,
                ..
            }
        ));
    }

    #[test]
    fn approve_locks_estimate() {
        let mut p = project();
        let id = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        p.approve().unwrap();
        assert_eq!(p.state(), ProjectState::Approved);
        assert!(p.is_locked() && p.is_approved());

        let before = p.estimate().to_vec();
        let locked = EstimateError::LockedProject("1".into());
        assert_eq!(p.add_estimate_item(painting()).unwrap_err(), locked);
        assert_eq!(p.update_estimate_item(&id, painting()).unwrap_err(), locked);
        assert_eq!(p.remove_estimate_item(&id).unwrap_err(), locked);
        assert_eq!(p.update_details("Someone", date(20)).unwrap_err(), locked);
        assert_eq!(p.estimate(), before.as_slice());
    }

    #[test]
    fn approve_is_one_way() {
        let mut p = project();
        p.approve().unwrap();
        assert_eq!(p.approve().unwrap_err(), EstimateError::AlreadyLocked("1".into()));
        assert!(p.is_locked() && p.is_approved());
    }

    #[test]
    fn warehouse_stays_open_after_approval() {
        let mut p = project();
        let id = p.add_estimate_item(wallpaper()).unwrap().id.clone();
        p.approve().unwrap();

        let entry = p
            .add_warehouse_entry(EntryDraft::new(date(15), id).actual_quantity(dec!(3)))
            .unwrap()
            .id
            .clone();
        p.update_warehouse_entry(&entry, dec!(4)).unwrap();
        assert_eq!(p.warehouse()[0].actual_quantity, dec!(4));
    }

    #[test]
    fn entry_quantities_are_bounded() {
        let mut p = project();
        let id = p.add_estimate_item(wallpaper()).unwrap().id.clone();

        let err = p
            .add_warehouse_entry(
                EntryDraft::new(date(15), id.clone()).actual_quantity(MAX_INPUT + dec!(1)),
            )
            .unwrap_err();
        assert!(matches!(err, EstimateError::Validation { field: "actual quantity", .. }));
        assert!(p.warehouse().is_empty());

        let entry = p
            .add_warehouse_entry(EntryDraft::new(date(15), id).actual_quantity(dec!(3)))
            .unwrap()
            .id
            .clone();
        let err = p
            .update_warehouse_entry(&entry, dec!(1000000000000000))
            .unwrap_err();
        assert!(matches!(err, EstimateError::Validation { field: "actual quantity", .. }));
        assert_eq!(p.warehouse()[0].actual_quantity, dec!(3));
    }

    #[test]
    fn update_details_while_draft() {
        let mut p = project();
        p.update_details(" New estimator ", date(12)).unwrap();
        assert_eq!(p.prepared_by(), "New estimator");
        assert_eq!(p.preparation_date(), date(12));
    }
}
