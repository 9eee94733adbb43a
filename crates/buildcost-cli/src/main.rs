//! buildcost CLI - Construction Estimating Engine
//!
//! Command-line interface for managing project estimates, recording
//! material consumption and exporting workbooks.

mod commands;
mod config;
mod store;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use buildcost_core::{CostType, Unit};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{parse_date, App, ItemArgs};
use crate::config::Config;
use crate::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "buildcost")]
#[command(author, version, about = "Construction estimating engine", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ./buildcost.toml when present)
    #[arg(long, env = "BUILDCOST_CONFIG", global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project store, overriding the config file
    #[arg(long, env = "BUILDCOST_STORE", global = true, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Project id (defaults to the first project)
    #[arg(short, long, global = true, value_name = "ID")]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects
    List,

    /// Create a new draft project
    Create {
        /// Project name
        #[arg(value_name = "NAME")]
        name: String,

        /// Who prepared the estimate
        #[arg(long, default_value = "")]
        prepared_by: String,

        /// Preparation date (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Change who prepared the estimate and when
    Details {
        #[arg(long)]
        prepared_by: Option<String>,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Show the estimate with totals
    Estimate,

    /// Add an estimate line
    AddItem {
        #[arg(long)]
        section: String,

        #[arg(long)]
        name: String,

        /// materials, rent, labor or services
        #[arg(long, default_value = "materials")]
        cost_type: CostType,

        /// m2, lm, pcs, set or man-h
        #[arg(long, default_value = "m2")]
        unit: Unit,

        /// Planned quantity
        #[arg(long)]
        quantity: String,

        /// Cost per unit
        #[arg(long)]
        cost: String,
    },

    /// Edit an estimate line; omitted fields keep their values
    EditItem {
        #[arg(value_name = "ITEM_ID")]
        id: String,

        #[arg(long)]
        section: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        cost_type: Option<CostType>,

        #[arg(long)]
        unit: Option<Unit>,

        #[arg(long)]
        quantity: Option<String>,

        #[arg(long)]
        cost: Option<String>,
    },

    /// Remove an estimate line
    RemoveItem {
        #[arg(value_name = "ITEM_ID")]
        id: String,
    },

    /// Approve the estimate and lock it
    Approve,

    /// Show recorded consumption
    Warehouse,

    /// Record consumption of a material line
    AddEntry {
        /// Estimate item id (must be a Materials line)
        #[arg(long, value_name = "ITEM_ID")]
        item: String,

        #[arg(long)]
        quantity: String,

        /// Consumption date (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Correct the quantity of a warehouse entry (blank means 0)
    EditEntry {
        #[arg(value_name = "ENTRY_ID")]
        id: String,

        #[arg(long, allow_hyphen_values = true)]
        quantity: String,
    },

    /// Plan vs actual per item
    Report,

    /// Export an Excel workbook
    Export {
        /// Output file (defaults to Project_<name>_<date>.xlsx in export_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave out the Report sheet
        #[arg(long)]
        no_report: bool,

        /// Write line amounts as values instead of formulas
        #[arg(long)]
        static_values: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store = store;
    }

    let today: NaiveDate = Local::now().date_naive();
    let app = App {
        store: JsonFileStore::new(config.store.clone()),
        config,
        project: cli.project,
        today,
    };

    match cli.command {
        Commands::List => app.list(),
        Commands::Create {
            name,
            prepared_by,
            date,
        } => app.create(&name, &prepared_by, date),
        Commands::Details { prepared_by, date } => app.details(prepared_by, date),
        Commands::Estimate => app.estimate(),
        Commands::AddItem {
            section,
            name,
            cost_type,
            unit,
            quantity,
            cost,
        } => app.add_item(ItemArgs {
            section: Some(section),
            name: Some(name),
            cost_type: Some(cost_type),
            unit: Some(unit),
            quantity: Some(quantity),
            cost: Some(cost),
        }),
        Commands::EditItem {
            id,
            section,
            name,
            cost_type,
            unit,
            quantity,
            cost,
        } => app.edit_item(
            &id,
            ItemArgs {
                section,
                name,
                cost_type,
                unit,
                quantity,
                cost,
            },
        ),
        Commands::RemoveItem { id } => app.remove_item(&id),
        Commands::Approve => app.approve(),
        Commands::Warehouse => app.warehouse(),
        Commands::AddEntry {
            item,
            quantity,
            date,
            comment,
        } => app.add_entry(item, &quantity, date, comment),
        Commands::EditEntry { id, quantity } => app.edit_entry(&id, &quantity),
        Commands::Report => app.report(),
        Commands::Export {
            output,
            no_report,
            static_values,
        } => app.export(output, no_report, static_values),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
