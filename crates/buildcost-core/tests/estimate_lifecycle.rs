//! Integration tests for the estimate lifecycle
//!
//! These drive a project from draft through approval while checking that
//! totals and variance stay consistent with the estimate and warehouse log.

use buildcost_core::totals::{estimate_totals, warehouse_value};
use buildcost_core::variance::{variance_report, warehouse_lines};
use buildcost_core::{
    CostType, EntryDraft, EstimateError, ItemDraft, Portfolio, Project, ProjectState, Unit,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn material(section: &str, name: &str, qty: Decimal, cost: Decimal) -> ItemDraft {
    ItemDraft::new(section, name)
        .cost_type(CostType::Materials)
        .unit(Unit::Piece)
        .planned_quantity(qty)
        .unit_cost(cost)
}

/// Exhibition stand with two materials, one labor line and one rental
fn stand() -> (Project, Vec<String>) {
    let mut project = Project::new("Exhibition stand", "Site office", date(6, 10));
    let ids = vec![
        project
            .add_estimate_item(material("Structure", "Chipboard 18mm", dec!(5), dec!(3200)))
            .unwrap()
            .id
            .clone(),
        project
            .add_estimate_item(material("Lighting", "LED strip", dec!(12), dec!(450)))
            .unwrap()
            .id
            .clone(),
        project
            .add_estimate_item(
                ItemDraft::new("Structure", "Assembly")
                    .cost_type(CostType::Labor)
                    .unit(Unit::ManHour)
                    .planned_quantity(dec!(16))
                    .unit_cost(dec!(500)),
            )
            .unwrap()
            .id
            .clone(),
        project
            .add_estimate_item(
                ItemDraft::new("Logistics", "Truck")
                    .cost_type(CostType::Rent)
                    .unit(Unit::Set)
                    .planned_quantity(dec!(1))
                    .unit_cost(dec!(7000)),
            )
            .unwrap()
            .id
            .clone(),
    ];
    (project, ids)
}

#[test]
fn totals_follow_estimate_edits() {
    let (mut project, ids) = stand();

    let totals = estimate_totals(project.estimate());
    assert_eq!(totals.materials, dec!(21400));
    assert_eq!(totals.labor, dec!(8000));
    assert_eq!(totals.rent, dec!(7000));
    assert_eq!(totals.services, dec!(0));
    assert_eq!(totals.total_without_vat, dec!(36400));
    assert_eq!(totals.vat, dec!(7280));
    assert_eq!(totals.total_with_vat, dec!(43680));
    assert_eq!(totals.contingency, dec!(1820));

    project.remove_estimate_item(&ids[3]).unwrap();
    let totals = estimate_totals(project.estimate());
    assert_eq!(totals.rent, dec!(0));
    assert_eq!(totals.total_without_vat, dec!(29400));
}

#[test]
fn consumption_drives_variance() {
    let (mut project, ids) = stand();
    project
        .add_warehouse_entry(EntryDraft::new(date(7, 5), ids[0].clone()).actual_quantity(dec!(5)))
        .unwrap();
    project
        .add_warehouse_entry(EntryDraft::new(date(7, 6), ids[1].clone()).actual_quantity(dec!(10)))
        .unwrap();
    project
        .add_warehouse_entry(EntryDraft::new(date(7, 8), ids[1].clone()).actual_quantity(dec!(4)))
        .unwrap();

    let report = variance_report(&project);
    assert_eq!(report.items.len(), 4);

    let board = &report.items[0];
    assert_eq!(board.total_used, dec!(5));
    assert_eq!(board.difference_qty, dec!(0));

    let strip = &report.items[1];
    assert_eq!(strip.total_used, dec!(14));
    assert_eq!(strip.difference_qty, dec!(-2));
    assert_eq!(strip.difference_sum, dec!(-900));

    let assembly = &report.items[2];
    assert_eq!(assembly.total_used, dec!(0));
    assert_eq!(assembly.difference_qty, assembly.planned_quantity);

    let overruns: Vec<&str> = report.overruns().map(|v| v.name.as_str()).collect();
    assert_eq!(overruns, vec!["LED strip"]);

    assert_eq!(report.materials.total_planned_quantity, dec!(17));
    assert_eq!(report.materials.total_actual_quantity, dec!(19));
    assert_eq!(report.materials.difference, dec!(-2));

    assert_eq!(warehouse_value(&project), dec!(5) * dec!(3200) + dec!(14) * dec!(450));
}

#[test]
fn orphaned_entries_are_tolerated() {
    let (mut project, ids) = stand();
    project
        .add_warehouse_entry(
            EntryDraft::new(date(7, 5), ids[1].clone())
                .actual_quantity(dec!(6))
                .comment("first delivery"),
        )
        .unwrap();
    project.remove_estimate_item(&ids[1]).unwrap();

    let lines = warehouse_lines(&project);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].is_orphaned());
    assert_eq!(lines[0].value, Decimal::ZERO);
    assert_eq!(lines[0].comment, "first delivery");

    let report = variance_report(&project);
    assert_eq!(report.materials.total_actual_quantity, Decimal::ZERO);
    assert_eq!(report.materials.total_planned_quantity, dec!(5));
    assert_eq!(warehouse_value(&project), Decimal::ZERO);
}

#[test]
fn approval_freezes_estimate_but_not_warehouse() {
    let (mut project, ids) = stand();
    project.approve().unwrap();
    assert_eq!(project.state(), ProjectState::Approved);

    let snapshot = project.estimate().to_vec();
    assert!(matches!(
        project.add_estimate_item(material("X", "Y", dec!(1), dec!(1))),
        Err(EstimateError::LockedProject(_))
    ));
    assert!(matches!(
        project.update_estimate_item(&ids[0], material("X", "Y", dec!(1), dec!(1))),
        Err(EstimateError::LockedProject(_))
    ));
    assert!(matches!(
        project.remove_estimate_item(&ids[0]),
        Err(EstimateError::LockedProject(_))
    ));
    assert_eq!(project.estimate(), snapshot.as_slice());

    project
        .add_warehouse_entry(EntryDraft::new(date(7, 5), ids[0].clone()).actual_quantity(dec!(2)))
        .unwrap();
    assert_eq!(project.warehouse().len(), 1);
    assert!(matches!(project.approve(), Err(EstimateError::AlreadyLocked(_))));
}

#[test]
fn rejected_entry_leaves_warehouse_unchanged() {
    let (mut project, ids) = stand();
    project
        .add_warehouse_entry(EntryDraft::new(date(7, 5), ids[0].clone()).actual_quantity(dec!(1)))
        .unwrap();
    let before = project.warehouse().to_vec();

    for item_id in [ids[2].clone(), ids[3].clone(), "missing".to_string()] {
        let result = project.add_warehouse_entry(
            EntryDraft::new(date(7, 6), item_id).actual_quantity(dec!(1)),
        );
        assert!(matches!(result, Err(EstimateError::InvalidReference { .. })));
    }
    assert_eq!(project.warehouse(), before.as_slice());
}

#[test]
fn portfolio_round_trip_through_json() {
    let (mut project, ids) = stand();
    project
        .add_warehouse_entry(EntryDraft::new(date(7, 5), ids[0].clone()).actual_quantity(dec!(3)))
        .unwrap();
    project.approve().unwrap();

    let mut portfolio = Portfolio::new();
    portfolio.create(project.clone());

    let json = serde_json::to_string(portfolio.projects()).unwrap();
    let loaded: Vec<Project> = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, vec![project]);
    assert!(loaded[0].is_locked());
}
