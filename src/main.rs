//! Manpower Contribution - command line report
//!
//! Loads a sheet export, cleans and derives the employee figures, then prints
//! the KPI summary and writes the requested exports.

use anyhow::{Context, Result};
use clap::Parser;
use manpower_contrib::data::{DataProcessor, ProcessorError, SessionCache};
use manpower_contrib::export::{self, ExportStyle, Exporter};
use manpower_contrib::stats::StatsCalculator;
use manpower_contrib::{CanonicalColumn, PipelineSettings, RecordSet};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "manpower_contrib")]
#[command(about = "Manpower cost & profit contribution report")]
#[command(version)]
struct Cli {
    /// CSV export of the first sheet
    input: PathBuf,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep employees whose name contains this text
    #[arg(long)]
    name: Option<String>,

    /// Minimum profit per employee (Rp), 0 by default
    #[arg(long, allow_negative_numbers = true)]
    min_profit: Option<f64>,

    /// Keep employees regardless of profit
    #[arg(long, conflicts_with = "min_profit")]
    any_profit: bool,

    /// Keep only employees banded as efficient
    #[arg(long)]
    efficient_only: bool,

    /// Number of top contributors to list
    #[arg(long)]
    top: Option<usize>,

    /// Show the cost breakdown of one employee
    #[arg(long)]
    employee: Option<String>,

    /// Write the filtered records as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Write plain numbers instead of formatted strings
    #[arg(long)]
    raw: bool,

    /// Write summary and records as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> Result<PipelineSettings> {
        let mut settings = match &self.config {
            Some(path) => PipelineSettings::from_json_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => PipelineSettings::default(),
        };

        if let Some(name) = &self.name {
            settings.filter.name_contains = Some(name.clone());
        }
        if let Some(min_profit) = self.min_profit {
            settings.filter.min_profit = Some(min_profit);
        }
        if self.any_profit {
            settings.filter.min_profit = None;
        }
        if self.efficient_only {
            settings.filter.efficient_only = true;
        }
        if let Some(top) = self.top {
            settings.top_n = top;
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    let mut cache = SessionCache::new();
    let grid = cache
        .load(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let records = match DataProcessor::from_settings(&settings).process(&grid) {
        Ok(records) => records,
        Err(ProcessorError::UnrecognizedLayout {
            header_row,
            columns,
            preview,
        }) => {
            error!(header_row, ?columns, "sheet layout not recognized");
            for row in &preview {
                let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                eprintln!("  {}", line.join(" | "));
            }
            anyhow::bail!(
                "no 'Nama Karyawan' column found; make sure the sheet has an employee name column"
            );
        }
    };

    let view = settings.filter.apply(&records);
    info!(records = records.len(), shown = view.len(), "filter applied");

    print_summary(&view);
    print_top_contributors(&view, settings.top_n);
    if let Some(name) = &cli.employee {
        print_breakdown(&view, name);
    }

    let style = if cli.raw {
        ExportStyle::Raw
    } else {
        ExportStyle::Formatted
    };
    if let Some(path) = &cli.export_csv {
        Exporter::write_csv_file(&view, style, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &cli.export_json {
        Exporter::write_json_file(&view, settings.top_n, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

fn print_summary(records: &RecordSet) {
    let kpi = StatsCalculator::kpi_summary(records);

    println!("=== KPI Summary ===");
    println!("Total Manpower Cost     : {}", export::currency_idr(kpi.total_cost));
    println!("Total Profit (sum MP)   : {}", export::currency_idr(kpi.total_profit));
    println!("Avg Profit per-MP       : {}", export::currency_idr(kpi.avg_profit));
    println!("Rasio Efisiensi (avg)   : {}", export::ratio(kpi.avg_efficiency));
    println!("Jumlah Karyawan         : {} orang", kpi.employee_count);
}

fn print_top_contributors(records: &RecordSet, n: usize) {
    let top = StatsCalculator::top_contributors(records, n);
    if top.is_empty() {
        return;
    }

    println!();
    println!("=== Top {} Contributors ===", n);
    for (rank, record) in top.iter().enumerate() {
        println!(
            "{:>2}. {:<30} {:>20} {:>9}",
            rank + 1,
            record.name().unwrap_or("-"),
            export::currency_idr(record.number(CanonicalColumn::ProfitPerEmployee)),
            export::percent(record.number(CanonicalColumn::ContributionToProfitPercent)),
        );
    }
}

fn print_breakdown(records: &RecordSet, name: &str) {
    println!();
    let Some(detail) = StatsCalculator::employee_breakdown(records, name) else {
        println!("No employee named '{}' in the current view", name);
        return;
    };

    println!("=== Detail: {} ===", detail.name);
    for component in &detail.components {
        println!(
            "{:<24} {:>20} ({:.1}%)",
            component.column.label(),
            export::currency_idr(Some(component.amount)),
            component.share_percent
        );
    }
    println!("Total Cost              : {}", export::currency_idr(detail.total_cost));
    println!("Profit                  : {}", export::currency_idr(detail.profit));
    println!("Rasio Efisiensi         : {}", export::ratio(detail.efficiency_ratio));
    println!("Kontribusi → Profit     : {}", export::percent(detail.contribution_percent));
}
