//! Demo projects used to seed an empty store

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::{CostType, EstimateItem, Project, Unit, WarehouseEntry};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn line(
    id: &str,
    section: &str,
    name: &str,
    cost_type: CostType,
    unit: Unit,
    quantity: rust_decimal::Decimal,
    cost: rust_decimal::Decimal,
) -> EstimateItem {
    EstimateItem {
        id: id.into(),
        section: section.into(),
        name: name.into(),
        cost_type,
        unit,
        planned_quantity: quantity,
        unit_cost: cost,
    }
}

fn consumption(
    id: &str,
    project_id: &str,
    date: NaiveDate,
    item_id: &str,
    quantity: rust_decimal::Decimal,
    comment: &str,
) -> WarehouseEntry {
    WarehouseEntry {
        id: id.into(),
        project_id: project_id.into(),
        date,
        item_id: item_id.into(),
        actual_quantity: quantity,
        comment: comment.into(),
    }
}

/// Two draft projects with estimates and partial consumption
pub fn sample_projects(today: NaiveDate) -> Vec<Project> {
    let mut stand = Project::with_id("1", "Project 10796_T2", "Site office", today);
    stand.estimate = vec![
        line(
            "1-1",
            "Finishing works",
            "Non-woven wallpaper",
            CostType::Materials,
            Unit::Piece,
            dec!(10),
            dec!(1500),
        ),
        line(
            "1-2",
            "Finishing works",
            "Wall painting",
            CostType::Labor,
            Unit::SquareMeter,
            dec!(45),
            dec!(300),
        ),
    ];
    stand.warehouse = vec![consumption(
        "w1-1",
        "1",
        date(2025, 6, 15),
        "1-1",
        dec!(8),
        "Remainder in stock",
    )];

    let mut kiosk = Project::with_id("2", "Project 10700_MTC", "Site office", today);
    kiosk.estimate = vec![
        line(
            "2-1",
            "Structure",
            "Chipboard 18mm",
            CostType::Materials,
            Unit::Piece,
            dec!(5),
            dec!(3200),
        ),
        line(
            "2-2",
            "Lighting",
            "LED strip",
            CostType::Materials,
            Unit::Piece,
            dec!(12),
            dec!(450),
        ),
    ];
    kiosk.warehouse = vec![
        consumption("w2-1", "2", date(2025, 7, 5), "2-1", dec!(5), "Fully used"),
        consumption("w2-2", "2", date(2025, 7, 6), "2-2", dec!(10), "Partially used"),
    ];

    vec![stand, kiosk]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totals::estimate_totals;
    use crate::variance::material_summary;

    #[test]
    fn sample_data_is_consistent() {
        let projects = sample_projects(date(2025, 6, 10));
        assert_eq!(projects.len(), 2);

        for project in &projects {
            for entry in project.warehouse() {
                assert_eq!(entry.project_id, project.id());
                assert!(project.get_material(&entry.item_id).is_some());
            }
        }

        let totals = estimate_totals(projects[0].estimate());
        assert_eq!(totals.total_with_vat, dec!(34200));

        let summary = material_summary(projects[1].estimate(), projects[1].warehouse());
        assert_eq!(summary.difference, dec!(2));
    }
}
