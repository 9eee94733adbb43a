//! Plain text views for console output

use buildcost_core::totals::{estimate_totals, format_amount, section_totals, warehouse_value, EstimateTotals};
use buildcost_core::variance::{variance_report, warehouse_lines, VarianceStatus};
use buildcost_core::{CostType, Project, RenderError, Renderer};
use rust_decimal::Decimal;

use crate::{format_date, truncate, DEFAULT_CURRENCY};

/// Which part of a project to print
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextView {
    Estimate,
    Warehouse,
    Report,
}

/// Plain text renderer for console output
#[derive(Clone, Debug)]
pub struct TextRenderer {
    pub view: TextView,
    pub currency: String,
}

impl TextRenderer {
    pub fn new(view: TextView) -> Self {
        Self {
            view,
            currency: DEFAULT_CURRENCY.into(),
        }
    }

    pub fn estimate() -> Self {
        Self::new(TextView::Estimate)
    }

    pub fn warehouse() -> Self {
        Self::new(TextView::Warehouse)
    }

    pub fn report() -> Self {
        Self::new(TextView::Report)
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    fn header(&self, project: &Project) -> String {
        format!(
            "Project: {}\nPrepared by: {} | Date: {} | Status: {}\n",
            project.display_name(),
            project.prepared_by(),
            format_date(project.preparation_date()),
            project.state(),
        )
    }

    fn render_estimate(&self, project: &Project) -> String {
        let mut out = self.header(project);

        if project.estimate().is_empty() {
            out.push_str("\nNo estimate lines.\n");
        }

        let mut number = 0usize;
        for section in section_totals(project.estimate()) {
            out.push_str(&format!("\n== {} ==\n", section.section));
            out.push_str(&format!(
                "{:>3}  {:<30} {:<10} {:<6} {:>10} {:>14} {:>16}\n",
                "#", "Name", "Type", "Unit", "Qty", "Unit cost", "Amount"
            ));
            for item in project.items_in_section(&section.section) {
                number += 1;
                out.push_str(&format!(
                    "{:>3}  {:<30} {:<10} {:<6} {:>10} {:>14} {:>16}\n",
                    number,
                    truncate(&item.name, 30),
                    item.cost_type.as_str(),
                    item.unit.as_str(),
                    quantity(item.planned_quantity),
                    format_amount(item.unit_cost),
                    format_amount(item.planned_sum()),
                ));
            }
            out.push_str(&format!(
                "{:>96}\n",
                format!("Section total: {}", format_amount(section.amount))
            ));
        }

        out.push('\n');
        out.push_str(&totals_block(&estimate_totals(project.estimate()), &self.currency));
        out.push('\n');
        out
    }

    fn render_warehouse(&self, project: &Project) -> String {
        let mut out = self.header(project);
        out.push('\n');

        let lines = warehouse_lines(project);
        if lines.is_empty() {
            out.push_str("No consumption recorded.\n");
        } else {
            out.push_str(&format!(
                "{:<10}  {:<30} {:>10} {:>10} {:>10} {:>14}  {}\n",
                "Date", "Material", "Qty", "Planned", "Diff", "Value", "Comment"
            ));
            for line in &lines {
                let material = line.material.as_deref().unwrap_or("Unknown material");
                out.push_str(&format!(
                    "{:<10}  {:<30} {:>10} {:>10} {:>10} {:>14}  {}\n",
                    format_date(line.date),
                    truncate(material, 30),
                    quantity(line.actual_quantity),
                    quantity(line.planned_quantity),
                    quantity(line.difference),
                    format_amount(line.value),
                    line.comment,
                ));
            }
        }

        out.push_str(&format!(
            "\nTotal value: {} {}\n",
            format_amount(warehouse_value(project)),
            self.currency
        ));
        out
    }

    fn render_report(&self, project: &Project) -> String {
        let mut out = self.header(project);
        out.push('\n');

        let report = variance_report(project);
        out.push_str(&format!(
            "{:<30} {:<10} {:>10} {:>10} {:>10} {:>14} {:>14} {:>14}\n",
            "Name", "Type", "Planned", "Used", "Diff", "Planned sum", "Actual sum", "Diff sum"
        ));
        for item in &report.items {
            let marker = if item.quantity_status().is_over() { " !" } else { "" };
            out.push_str(&format!(
                "{:<30} {:<10} {:>10} {:>10} {:>10} {:>14} {:>14} {:>14}{}\n",
                truncate(&item.name, 30),
                item.cost_type.as_str(),
                quantity(item.planned_quantity),
                quantity(item.total_used),
                quantity(item.difference_qty),
                format_amount(item.planned_sum),
                format_amount(item.actual_sum),
                format_amount(item.difference_sum),
                marker,
            ));
        }

        let materials = &report.materials;
        out.push_str(&format!(
            "\nMaterials: planned {}, used {}, difference {} ({})\n",
            quantity(materials.total_planned_quantity),
            quantity(materials.total_actual_quantity),
            quantity(materials.difference),
            status_label(materials.status()),
        ));

        let overruns: Vec<&str> = report.overruns().map(|v| v.name.as_str()).collect();
        if !overruns.is_empty() {
            out.push_str(&format!("Over plan: {}\n", overruns.join(", ")));
        }
        out
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, project: &Project) -> Result<String, RenderError> {
        Ok(match self.view {
            TextView::Estimate => self.render_estimate(project),
            TextView::Warehouse => self.render_warehouse(project),
            TextView::Report => self.render_report(project),
        })
    }
}

/// Category sums followed by VAT, gross total and contingency
pub fn totals_block(totals: &EstimateTotals, currency: &str) -> String {
    let mut rows: Vec<(&str, Decimal)> = CostType::ALL
        .iter()
        .map(|c| (c.as_str(), totals.sum(*c)))
        .collect();
    rows.push(("Total without VAT", totals.total_without_vat));
    rows.push(("VAT 20%", totals.vat));
    rows.push(("Total with VAT", totals.total_with_vat));
    rows.push(("Contingency 5%", totals.contingency));

    rows.iter()
        .map(|(label, amount)| format!("{label:<20}{:>16} {currency}", format_amount(*amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

fn status_label(status: VarianceStatus) -> &'static str {
    match status {
        VarianceStatus::Under => "within plan",
        VarianceStatus::OnPlan => "on plan",
        VarianceStatus::Over => "over plan",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildcost_core::{EntryDraft, ItemDraft, Unit};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn finishing() -> Project {
        let mut project = Project::with_id("1", "Office", "Site office", date(6, 10));
        project
            .add_estimate_item(
                ItemDraft::new("Finishing works", "Non-woven wallpaper")
                    .unit(Unit::Piece)
                    .planned_quantity(dec!(10))
                    .unit_cost(dec!(1500)),
            )
            .unwrap();
        project
            .add_estimate_item(
                ItemDraft::new("Finishing works", "Wall painting")
                    .cost_type(CostType::Labor)
                    .planned_quantity(dec!(45))
                    .unit_cost(dec!(300)),
            )
            .unwrap();
        project
    }

    #[test]
    fn totals_block_layout() {
        let totals = estimate_totals(finishing().estimate());
        insta::assert_snapshot!(totals_block(&totals, "₽"), @r###"
        Materials                  15 000.00 ₽
        Rent                            0.00 ₽
        Labor                      13 500.00 ₽
        Services                        0.00 ₽
        Total without VAT          28 500.00 ₽
        VAT 20%                     5 700.00 ₽
        Total with VAT             34 200.00 ₽
        Contingency 5%              1 425.00 ₽
        "###);
    }

    #[test]
    fn estimate_view_groups_by_section() {
        let text = TextRenderer::estimate().render(&finishing()).unwrap();
        assert!(text.starts_with("Project: Office\n"));
        assert_eq!(text.matches("== Finishing works ==").count(), 1);
        assert!(text.contains("Non-woven wallpaper"));
        assert!(text.contains("Section total: 28 500.00"));
        assert!(text.contains("Total with VAT             34 200.00 ₽"));
    }

    #[test]
    fn approved_project_is_labelled() {
        let mut project = finishing();
        project.approve().unwrap();
        let text = TextRenderer::estimate().currency("€").render(&project).unwrap();
        assert!(text.starts_with("Project: Office (approved)\n"));
        assert!(text.contains("Status: approved"));
        assert!(text.contains(" €"));
    }

    #[test]
    fn warehouse_view_marks_unknown_material() {
        let mut project = finishing();
        let wallpaper = project.estimate()[0].id.clone();
        project
            .add_warehouse_entry(
                EntryDraft::new(date(6, 15), wallpaper.clone())
                    .actual_quantity(dec!(8))
                    .comment("Remainder in stock"),
            )
            .unwrap();

        let text = TextRenderer::warehouse().render(&project).unwrap();
        assert!(text.contains("15.06.2025"));
        assert!(text.contains("Remainder in stock"));
        assert!(text.contains("Total value: 12 000.00 ₽"));

        project.remove_estimate_item(&wallpaper).unwrap();
        let text = TextRenderer::warehouse().render(&project).unwrap();
        assert!(text.contains("Unknown material"));
        assert!(text.contains("Total value: 0.00 ₽"));
    }

    #[test]
    fn report_flags_overruns() {
        let mut project = finishing();
        let wallpaper = project.estimate()[0].id.clone();
        project
            .add_warehouse_entry(EntryDraft::new(date(6, 15), wallpaper).actual_quantity(dec!(12)))
            .unwrap();

        let text = TextRenderer::report().render(&project).unwrap();
        assert!(text.contains("Over plan: Non-woven wallpaper"));
        assert!(text.contains("Materials: planned 10, used 12, difference -2 (over plan)"));
    }

    #[test]
    fn empty_views_render() {
        let project = Project::with_id("e", "Empty", "", date(6, 1));
        for renderer in [TextRenderer::estimate(), TextRenderer::warehouse(), TextRenderer::report()] {
            assert!(renderer.render(&project).is_ok());
        }
    }
}
