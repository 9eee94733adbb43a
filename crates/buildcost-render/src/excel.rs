//! Excel estimate workbook renderer
//!
//! Generates XLSX files with one sheet per project view:
//! - Estimate: header block, one row per line item, totals block
//! - Warehouse: one row per consumption entry and the total value
//! - Report: plan-vs-actual per item and the material aggregate
//!
//! ## Example Output Structure
//!
//! ```text
//! Sheet: Estimate
//! | # | Section   | Name      | Cost type | Unit | Qty | Unit cost | Amount    | Note |
//! |---|-----------|-----------|-----------|------|-----|-----------|-----------|------|
//! | 1 | Finishing | Wallpaper | Materials | pcs  | 10  | 1 500.00  | =F7*G7    |      |
//! | 2 | Finishing | Painting  | Labor     | m²   | 45  | 300.00    | =F8*G8    |      |
//!
//!                               Total without VAT:      28 500.00
//!                               VAT 20%:                 5 700.00
//! ```
//!
//! Line amounts may be live formulas; the totals block always carries the
//! values computed by `buildcost_core::totals`, so the workbook and the
//! application can never disagree.

use buildcost_core::totals::{estimate_totals, warehouse_value};
use buildcost_core::variance::{variance_report, warehouse_lines};
use buildcost_core::{CostType, Project, RenderError, Renderer};
use chrono::{Local, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::{format_date, DEFAULT_CURRENCY};

/// Row where the estimate item table header starts
const ESTIMATE_HEADER_ROW: u32 = 5;

/// Row where the warehouse entry table header starts
const WAREHOUSE_HEADER_ROW: u32 = 3;

fn xlsx_err(e: XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}

fn num(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Excel estimate workbook renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Currency symbol
    pub currency: String,
    /// Whether to include the Report (variance) sheet
    pub include_report: bool,
    /// Whether line amounts are formulas (vs static values)
    pub use_formulas: bool,
    /// Date printed as the export date (defaults to today)
    pub export_date: Option<NaiveDate>,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.into(),
            include_report: true,
            use_formulas: true,
            export_date: None,
        }
    }
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Leave out the Report sheet
    pub fn no_report(mut self) -> Self {
        self.include_report = false;
        self
    }

    /// Use static values instead of formulas
    pub fn static_values(mut self) -> Self {
        self.use_formulas = false;
        self
    }

    /// Fix the export date
    pub fn export_date(mut self, date: NaiveDate) -> Self {
        self.export_date = Some(date);
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, project: &Project) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();
        let export_date = self
            .export_date
            .unwrap_or_else(|| Local::now().date_naive());

        self.add_estimate_sheet(&mut workbook, project, &formats)?;
        self.add_warehouse_sheet(&mut workbook, project, &formats, export_date)?;
        if self.include_report {
            self.add_report_sheet(&mut workbook, project, &formats)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Create reusable formats
    fn create_formats(&self) -> ExcelFormats {
        let money_format = format!("#,##0.00 \"{}\"", self.currency);

        let title = Format::new().set_bold().set_font_size(13);

        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin)
            .set_text_wrap();

        let text = Format::new().set_border(FormatBorder::Thin);

        let integer = Format::new()
            .set_num_format("0")
            .set_border(FormatBorder::Thin);

        let number = Format::new()
            .set_num_format("#,##0.###")
            .set_border(FormatBorder::Thin);

        let currency = Format::new()
            .set_num_format(&money_format)
            .set_border(FormatBorder::Thin);

        let total_label = Format::new()
            .set_bold()
            .set_background_color(0xE2EFDA)
            .set_border(FormatBorder::Thin);

        let total_number = Format::new()
            .set_bold()
            .set_num_format("#,##0.###")
            .set_background_color(0xE2EFDA)
            .set_border(FormatBorder::Thin);

        let total_currency = Format::new()
            .set_bold()
            .set_num_format(&money_format)
            .set_background_color(0xE2EFDA)
            .set_border(FormatBorder::Thin);

        // Variance cells: green within plan, red over plan
        let under_number = Format::new()
            .set_bold()
            .set_num_format("#,##0.###")
            .set_font_color(0x2E7D32)
            .set_border(FormatBorder::Thin);

        let over_number = Format::new()
            .set_bold()
            .set_num_format("#,##0.###")
            .set_font_color(0xC62828)
            .set_border(FormatBorder::Thin);

        let under_currency = Format::new()
            .set_bold()
            .set_num_format(&money_format)
            .set_font_color(0x2E7D32)
            .set_border(FormatBorder::Thin);

        let over_currency = Format::new()
            .set_bold()
            .set_num_format(&money_format)
            .set_font_color(0xC62828)
            .set_border(FormatBorder::Thin);

        let muted = Format::new()
            .set_italic()
            .set_font_color(0x808080)
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            title,
            header,
            text,
            integer,
            number,
            currency,
            total_label,
            total_number,
            total_currency,
            under_number,
            over_number,
            under_currency,
            over_currency,
            muted,
        }
    }

    fn write_headers(
        sheet: &mut Worksheet,
        row: u32,
        headers: &[&str],
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(row, col as u16, *header, &formats.header)
                .map_err(xlsx_err)?;
        }
        Ok(())
    }

    /// Add Estimate sheet
    fn add_estimate_sheet(
        &self,
        workbook: &mut Workbook,
        project: &Project,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Estimate").map_err(xlsx_err)?;

        // Project info
        sheet
            .write_with_format(0, 0, format!("Project: {}", project.name()), &formats.title)
            .map_err(xlsx_err)?;
        sheet
            .write(1, 0, format!("Prepared by: {}", project.prepared_by()))
            .map_err(xlsx_err)?;
        sheet
            .write(
                2,
                0,
                format!("Preparation date: {}", format_date(project.preparation_date())),
            )
            .map_err(xlsx_err)?;
        sheet
            .write(3, 0, format!("Status: {}", project.state()))
            .map_err(xlsx_err)?;

        let currency_header = format!("Unit cost, {}", self.currency);
        let amount_header = format!("Amount, {}", self.currency);
        let headers = [
            "#",
            "Section",
            "Name",
            "Cost type",
            "Unit",
            "Quantity",
            currency_header.as_str(),
            amount_header.as_str(),
            "Note",
        ];
        Self::write_headers(sheet, ESTIMATE_HEADER_ROW, &headers, formats)?;

        for (col, width) in [5, 20, 30, 15, 8, 10, 14, 16, 20].into_iter().enumerate() {
            sheet.set_column_width(col as u16, width).ok();
        }

        let mut row = ESTIMATE_HEADER_ROW + 1;
        for (index, item) in project.estimate().iter().enumerate() {
            sheet
                .write_with_format(row, 0, (index + 1) as u32, &formats.integer)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, item.section.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, item.name.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 3, item.cost_type.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 4, item.unit.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 5, num(item.planned_quantity), &formats.number)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 6, num(item.unit_cost), &formats.currency)
                .map_err(xlsx_err)?;

            if self.use_formulas {
                let formula = format!("=F{}*G{}", row + 1, row + 1);
                sheet
                    .write_formula_with_format(row, 7, formula.as_str(), &formats.currency)
                    .map_err(xlsx_err)?;
            } else {
                sheet
                    .write_with_format(row, 7, num(item.planned_sum()), &formats.currency)
                    .map_err(xlsx_err)?;
            }
            sheet
                .write_blank(row, 8, &formats.text)
                .map_err(xlsx_err)?;

            row += 1;
        }

        // Totals block
        let totals = estimate_totals(project.estimate());
        row += 1;
        sheet
            .write_with_format(row, 6, "ESTIMATE TOTAL", &formats.total_label)
            .map_err(xlsx_err)?;
        sheet
            .write_blank(row, 7, &formats.total_label)
            .map_err(xlsx_err)?;
        row += 1;

        let mut lines: Vec<(String, Decimal)> = CostType::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), totals.sum(*c)))
            .collect();
        lines.push(("Total without VAT".into(), totals.total_without_vat));
        lines.push(("VAT 20%".into(), totals.vat));
        lines.push(("Total with VAT".into(), totals.total_with_vat));
        lines.push(("Contingency 5%".into(), totals.contingency));

        for (label, value) in lines {
            sheet
                .write_with_format(row, 6, label, &formats.total_label)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 7, num(value), &formats.total_currency)
                .map_err(xlsx_err)?;
            row += 1;
        }

        Ok(())
    }

    /// Add Warehouse sheet
    fn add_warehouse_sheet(
        &self,
        workbook: &mut Workbook,
        project: &Project,
        formats: &ExcelFormats,
        export_date: NaiveDate,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Warehouse").map_err(xlsx_err)?;

        sheet
            .write_with_format(0, 0, format!("Project: {}", project.name()), &formats.title)
            .map_err(xlsx_err)?;
        sheet
            .write(1, 0, format!("Export date: {}", format_date(export_date)))
            .map_err(xlsx_err)?;

        let value_header = format!("Value, {}", self.currency);
        let headers = [
            "Date",
            "Material",
            "Quantity",
            "Planned",
            "Difference",
            value_header.as_str(),
            "Comment",
        ];
        Self::write_headers(sheet, WAREHOUSE_HEADER_ROW, &headers, formats)?;

        for (col, width) in [12, 30, 10, 10, 11, 14, 30].into_iter().enumerate() {
            sheet.set_column_width(col as u16, width).ok();
        }

        let mut row = WAREHOUSE_HEADER_ROW + 1;
        for line in warehouse_lines(project) {
            sheet
                .write_with_format(row, 0, format_date(line.date), &formats.text)
                .map_err(xlsx_err)?;
            match &line.material {
                Some(name) => sheet.write_with_format(row, 1, name.as_str(), &formats.text),
                None => sheet.write_with_format(row, 1, "Unknown material", &formats.muted),
            }
            .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, num(line.actual_quantity), &formats.number)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 3, num(line.planned_quantity), &formats.number)
                .map_err(xlsx_err)?;

            let diff_format = if line.difference < Decimal::ZERO {
                &formats.over_number
            } else {
                &formats.under_number
            };
            sheet
                .write_with_format(row, 4, num(line.difference), diff_format)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 5, num(line.value), &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 6, line.comment.as_str(), &formats.text)
                .map_err(xlsx_err)?;

            row += 1;
        }

        row += 1;
        sheet
            .write_with_format(row, 4, "TOTAL", &formats.total_label)
            .map_err(xlsx_err)?;
        sheet
            .write_with_format(row, 5, num(warehouse_value(project)), &formats.total_currency)
            .map_err(xlsx_err)?;

        Ok(())
    }

    /// Add Report sheet: plan vs actual
    fn add_report_sheet(
        &self,
        workbook: &mut Workbook,
        project: &Project,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Report").map_err(xlsx_err)?;

        let headers = [
            "Section",
            "Name",
            "Cost type",
            "Unit",
            "Planned qty",
            "Used qty",
            "Difference",
            "Planned sum",
            "Actual sum",
            "Difference sum",
        ];
        Self::write_headers(sheet, 0, &headers, formats)?;

        for (col, width) in [18, 30, 12, 7, 12, 12, 12, 15, 15, 15].into_iter().enumerate() {
            sheet.set_column_width(col as u16, width).ok();
        }

        let report = variance_report(project);
        let mut row = 1u32;
        for item in &report.items {
            sheet
                .write_with_format(row, 0, item.section.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, item.name.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, item.cost_type.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 3, item.unit.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 4, num(item.planned_quantity), &formats.number)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 5, num(item.total_used), &formats.number)
                .map_err(xlsx_err)?;

            let qty_format = if item.quantity_status().is_over() {
                &formats.over_number
            } else {
                &formats.under_number
            };
            sheet
                .write_with_format(row, 6, num(item.difference_qty), qty_format)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 7, num(item.planned_sum), &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 8, num(item.actual_sum), &formats.currency)
                .map_err(xlsx_err)?;

            let sum_format = if item.sum_status().is_over() {
                &formats.over_currency
            } else {
                &formats.under_currency
            };
            sheet
                .write_with_format(row, 9, num(item.difference_sum), sum_format)
                .map_err(xlsx_err)?;

            row += 1;
        }

        // Material aggregate
        row += 1;
        sheet
            .merge_range(row, 0, row, 3, "MATERIALS TOTAL", &formats.total_label)
            .map_err(xlsx_err)?;
        sheet
            .write_with_format(row, 4, num(report.materials.total_planned_quantity), &formats.total_number)
            .map_err(xlsx_err)?;
        sheet
            .write_with_format(row, 5, num(report.materials.total_actual_quantity), &formats.total_number)
            .map_err(xlsx_err)?;
        let aggregate_format = if report.materials.status().is_over() {
            &formats.over_number
        } else {
            &formats.under_number
        };
        sheet
            .write_with_format(row, 6, num(report.materials.difference), aggregate_format)
            .map_err(xlsx_err)?;

        Ok(())
    }
}

/// Reusable cell formats
struct ExcelFormats {
    title: Format,
    header: Format,
    text: Format,
    integer: Format,
    number: Format,
    currency: Format,
    total_label: Format,
    total_number: Format,
    total_currency: Format,
    under_number: Format,
    over_number: Format,
    under_currency: Format,
    over_currency: Format,
    // Placeholder text for orphaned references
    muted: Format,
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, project: &Project) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildcost_core::{EntryDraft, ItemDraft, Unit};
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn create_test_project() -> Project {
        let mut project = Project::with_id("1", "Test Stand", "Site office", date(6, 10));
        let board = project
            .add_estimate_item(
                ItemDraft::new("Structure", "Chipboard 18mm")
                    .unit(Unit::Piece)
                    .planned_quantity(dec!(5))
                    .unit_cost(dec!(3200)),
            )
            .unwrap()
            .id
            .clone();
        project
            .add_estimate_item(
                ItemDraft::new("Structure", "Assembly")
                    .cost_type(CostType::Labor)
                    .unit(Unit::ManHour)
                    .planned_quantity(dec!(16))
                    .unit_cost(dec!(500)),
            )
            .unwrap();
        project
            .add_warehouse_entry(EntryDraft::new(date(7, 5), board).actual_quantity(dec!(6)))
            .unwrap();
        project
    }

    #[test]
    fn excel_renderer_creation() {
        let renderer = ExcelRenderer::new();
        assert_eq!(renderer.currency, "₽");
        assert!(renderer.include_report);
        assert!(renderer.use_formulas);
        assert!(renderer.export_date.is_none());
    }

    #[test]
    fn excel_renderer_with_options() {
        let renderer = ExcelRenderer::new()
            .currency("€")
            .no_report()
            .static_values()
            .export_date(date(7, 1));

        assert_eq!(renderer.currency, "€");
        assert!(!renderer.include_report);
        assert!(!renderer.use_formulas);
        assert_eq!(renderer.export_date, Some(date(7, 1)));
    }

    #[test]
    fn excel_produces_valid_output() {
        let renderer = ExcelRenderer::new().export_date(date(7, 10));
        let bytes = renderer.render(&create_test_project()).unwrap();

        // XLSX files start with PK (ZIP header)
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn excel_renders_empty_project() {
        let project = Project::with_id("e", "Empty", "", date(6, 1));
        let bytes = ExcelRenderer::new().render(&project).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn excel_with_static_values_and_no_report() {
        let renderer = ExcelRenderer::new().static_values().no_report();
        assert!(renderer.render(&create_test_project()).is_ok());
    }

    #[test]
    fn excel_tolerates_orphaned_entries() {
        let mut project = create_test_project();
        let board = project.estimate()[0].id.clone();
        project.remove_estimate_item(&board).unwrap();
        assert!(ExcelRenderer::new().render(&project).is_ok());
    }
}
