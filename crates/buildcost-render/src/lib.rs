//! # buildcost-render
//!
//! Export backends for buildcost projects.
//!
//! This crate provides:
//! - Excel workbooks with estimate, warehouse and variance sheets
//! - Plain-text views for console output
//!
//! Every figure is taken from `buildcost_core::totals` and
//! `buildcost_core::variance`; renderers only lay numbers out.
//!
//! ## Example
//!
//! ```rust,ignore
//! use buildcost_core::Renderer;
//! use buildcost_render::{export_file_name, ExcelRenderer, TextRenderer};
//!
//! // Console report
//! let text = TextRenderer::report().render(&project)?;
//! println!("{text}");
//!
//! // Excel workbook
//! let xlsx_bytes = ExcelRenderer::new().currency("₽").render(&project)?;
//! std::fs::write(export_file_name(&project, today), xlsx_bytes)?;
//! ```

pub mod excel;
pub mod text;

pub use excel::ExcelRenderer;
pub use text::{TextRenderer, TextView};

use buildcost_core::Project;
use chrono::NaiveDate;

/// Default currency symbol for presentation
pub const DEFAULT_CURRENCY: &str = "₽";

/// File name for a workbook export: `Project_<name>_<YYYYMMDD>.xlsx`
///
/// Characters that are unsafe in file names are replaced by `_`.
pub fn export_file_name(project: &Project, date: NaiveDate) -> String {
    let name: String = project
        .name()
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("Project_{}_{}.xlsx", name, date.format("%Y%m%d"))
}

/// Display format for dates in exports
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Truncate a string to a maximum number of characters with ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_file_name_is_dated_and_safe() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let project = Project::with_id("1", "Project 10796_T2", "", date);
        assert_eq!(
            export_file_name(&project, date),
            "Project_Project_10796_T2_20250610.xlsx"
        );

        let project = Project::with_id("2", "Stand/Hall B: v2", "", date);
        assert_eq!(
            export_file_name(&project, date),
            "Project_Stand_Hall_B__v2_20250610.xlsx"
        );
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Светодиодная лента", 10), "Светоди...");
    }

    #[test]
    fn dates_use_day_first_format() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 5).unwrap();
        assert_eq!(format_date(date), "05.07.2025");
    }
}
