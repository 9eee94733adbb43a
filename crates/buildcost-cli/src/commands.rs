//! Subcommand handlers
//!
//! Each mutating handler loads the store, applies one project operation and
//! saves the whole list back.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use buildcost_core::{CostType, EntryDraft, ItemDraft, NumericField, Portfolio, Project, Renderer, Unit};
use buildcost_render::{export_file_name, ExcelRenderer, TextRenderer};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::store::JsonFileStore;

/// Shared state for one CLI invocation
pub struct App {
    pub config: Config,
    pub store: JsonFileStore,
    pub project: Option<String>,
    pub today: NaiveDate,
}

/// Fields of an estimate line given on the command line
#[derive(Debug, Default)]
pub struct ItemArgs {
    pub section: Option<String>,
    pub name: Option<String>,
    pub cost_type: Option<CostType>,
    pub unit: Option<Unit>,
    pub quantity: Option<String>,
    pub cost: Option<String>,
}

impl ItemArgs {
    /// Overlay the given fields on `draft`
    fn apply(self, mut draft: ItemDraft) -> Result<ItemDraft> {
        if let Some(section) = self.section {
            draft.section = section;
        }
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(cost_type) = self.cost_type {
            draft.cost_type = cost_type;
        }
        if let Some(unit) = self.unit {
            draft.unit = unit;
        }
        if let Some(quantity) = self.quantity {
            draft.planned_quantity = NumericField::parse("planned quantity", &quantity)?;
        }
        if let Some(cost) = self.cost {
            draft.unit_cost = NumericField::parse("unit cost", &cost)?;
        }
        Ok(draft)
    }
}

/// Accepts `2025-06-10` or `10.06.2025`
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d.%m.%Y"))
        .map_err(|_| format!("invalid date '{text}' (expected YYYY-MM-DD or DD.MM.YYYY)"))
}

/// Quantity correction: blank means zero, sign is checked by the project
fn parse_correction(text: &str) -> Result<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&text.replace(',', "."))
        .with_context(|| format!("Invalid actual quantity: '{text}' is not a number"))
}

impl App {
    fn open(&self) -> Result<Portfolio> {
        Portfolio::open(&self.store, self.config.seed_sample, self.today)
            .with_context(|| format!("Failed to open store {}", self.store.path().display()))
    }

    fn persist(&self, portfolio: &Portfolio) -> Result<()> {
        portfolio
            .persist(&self.store)
            .with_context(|| format!("Failed to save store {}", self.store.path().display()))
    }

    /// The project named by `--project`, or the first one
    fn target<'a>(&self, portfolio: &'a mut Portfolio) -> Result<&'a mut Project> {
        if let Some(id) = &self.project {
            portfolio.select(id)?;
        }
        match portfolio.current_mut() {
            Some(project) => Ok(project),
            None => bail!("No projects yet; create one with `buildcost create <NAME>`"),
        }
    }

    fn show(&self, renderer: TextRenderer) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        let text = renderer.currency(self.config.currency.clone()).render(project)?;
        print!("{text}");
        Ok(())
    }

    pub fn list(&self) -> Result<()> {
        let portfolio = self.open()?;
        if portfolio.is_empty() {
            println!("No projects.");
            return Ok(());
        }

        let current = self.project.as_deref().or(portfolio.current_id());
        for project in portfolio.projects() {
            let marker = if Some(project.id()) == current { "*" } else { " " };
            println!(
                "{} {:<38} {:<30} {:<20} {}  items: {:<3} entries: {}",
                marker,
                project.id(),
                project.display_name(),
                project.prepared_by(),
                project.preparation_date().format("%d.%m.%Y"),
                project.estimate().len(),
                project.warehouse().len(),
            );
        }
        Ok(())
    }

    pub fn create(&self, name: &str, prepared_by: &str, date: Option<NaiveDate>) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid project name: must not be empty");
        }

        let mut portfolio = self.open()?;
        let project = Project::new(name, prepared_by.trim(), date.unwrap_or(self.today));
        let id = portfolio.create(project).id().to_string();
        self.persist(&portfolio)?;
        println!("Created project {id}");
        Ok(())
    }

    pub fn details(&self, prepared_by: Option<String>, date: Option<NaiveDate>) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        let prepared_by = prepared_by.unwrap_or_else(|| project.prepared_by().to_string());
        let date = date.unwrap_or(project.preparation_date());
        project.update_details(prepared_by, date)?;
        let id = project.id().to_string();
        self.persist(&portfolio)?;
        println!("Updated project {id}");
        Ok(())
    }

    pub fn estimate(&self) -> Result<()> {
        self.show(TextRenderer::estimate())
    }

    pub fn add_item(&self, args: ItemArgs) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        let draft = args.apply(ItemDraft::new("", ""))?;
        let id = project.add_estimate_item(draft)?.id.clone();
        self.persist(&portfolio)?;
        println!("Added item {id}");
        Ok(())
    }

    pub fn edit_item(&self, id: &str, args: ItemArgs) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        let base = match project.get_item(id) {
            Some(item) => ItemDraft::from_item(item),
            None => ItemDraft::new("", ""),
        };
        let draft = args.apply(base)?;
        project.update_estimate_item(id, draft)?;
        self.persist(&portfolio)?;
        println!("Updated item {id}");
        Ok(())
    }

    pub fn remove_item(&self, id: &str) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        let removed = project.remove_estimate_item(id)?;
        let orphaned = project.warehouse().iter().filter(|e| e.item_id == id).count();
        self.persist(&portfolio)?;
        println!("Removed item {} ({})", removed.id, removed.name);
        if orphaned > 0 {
            println!("{orphaned} warehouse entries now reference an unknown material");
        }
        Ok(())
    }

    pub fn approve(&self) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        project.approve()?;
        let label = project.display_name();
        self.persist(&portfolio)?;
        println!("Approved {label}; the estimate is now locked");
        Ok(())
    }

    pub fn warehouse(&self) -> Result<()> {
        self.show(TextRenderer::warehouse())
    }

    pub fn add_entry(
        &self,
        item: String,
        quantity: &str,
        date: Option<NaiveDate>,
        comment: String,
    ) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        let draft = EntryDraft::new(date.unwrap_or(self.today), item)
            .actual_quantity(NumericField::parse("actual quantity", quantity)?)
            .comment(comment);
        let id = project.add_warehouse_entry(draft)?.id.clone();
        self.persist(&portfolio)?;
        println!("Added entry {id}");
        Ok(())
    }

    pub fn edit_entry(&self, id: &str, quantity: &str) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;
        project.update_warehouse_entry(id, parse_correction(quantity)?)?;
        self.persist(&portfolio)?;
        println!("Updated entry {id}");
        Ok(())
    }

    pub fn report(&self) -> Result<()> {
        self.show(TextRenderer::report())
    }

    pub fn export(&self, output: Option<PathBuf>, no_report: bool, static_values: bool) -> Result<()> {
        let mut portfolio = self.open()?;
        let project = self.target(&mut portfolio)?;

        let mut renderer = ExcelRenderer::new()
            .currency(self.config.currency.clone())
            .export_date(self.today);
        if no_report {
            renderer = renderer.no_report();
        }
        if static_values {
            renderer = renderer.static_values();
        }
        let bytes = renderer.render(project)?;

        let path = output.unwrap_or_else(|| {
            self.config
                .export_dir
                .join(export_file_name(project, self.today))
        });
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(project = %project.id(), path = %path.display(), "workbook exported");
        println!("Exported {}", path.display());
        Ok(())
    }
}
