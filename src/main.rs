//! calgrid CLI application.
//!
//! # Usage
//! ```ignore
//! calgrid -w book.json -c clinic.ics                  // period from the home sheet
//! calgrid -w book.json -c cals/ --year 2025 --month 4 // set the period first
//! calgrid -w book.json -c cals/ --xlsx book.xlsx      // also write .xlsx
//! ```

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use calgrid::args::{Args, expand_path, get_period_override, get_utc_offset};
use calgrid::exporter::GridExporter;
use calgrid::types::ExportOptions;
use calgrid::workbook::Workbook;
use calgrid::xlsx::write_workbook;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("calgrid: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "calgrid=warn",
        1 => "calgrid=info",
        _ => "calgrid=debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn run(args: &Args) -> Result<()> {
    let options = ExportOptions::new(args).map_err(anyhow::Error::msg)?;
    let period = get_period_override(args).map_err(anyhow::Error::msg)?;

    let workbook_path = expand_path(&args.workbook);
    let mut workbook = if workbook_path.exists() {
        Workbook::load(&workbook_path)?
    } else {
        Workbook::new()
    };
    if let Some(period) = period {
        workbook.write_home_period(&options.home_sheet, period);
    }

    let source = load_source(args)?;
    let report = GridExporter::new(options).export(&mut workbook, &source)?;

    for sheet in &report.exported {
        println!(
            "{}: {} weeks, {} events",
            sheet.sheet_name,
            sheet.day_rows.len(),
            sheet.events_placed
        );
    }

    workbook
        .save(&workbook_path)
        .with_context(|| format!("saving {}", workbook_path.display()))?;
    if let Some(xlsx) = &args.xlsx {
        let xlsx_path = expand_path(xlsx);
        write_workbook(&workbook, &xlsx_path)
            .with_context(|| format!("writing {}", xlsx_path.display()))?;
    }

    if !report.is_success() {
        for failure in &report.failures {
            eprintln!("calgrid: {}: {}", failure.calendar, failure.error);
        }
        bail!("{} calendar(s) failed", report.failures.len());
    }
    Ok(())
}

#[cfg(feature = "ics")]
fn load_source(args: &Args) -> Result<calgrid::source::IcsCalendarSource> {
    let offset = get_utc_offset(args).map_err(anyhow::Error::msg)?;
    let inputs: Vec<String> = args
        .calendars
        .iter()
        .map(|c| {
            if c.starts_with("http://") || c.starts_with("https://") {
                c.clone()
            } else {
                expand_path(c).display().to_string()
            }
        })
        .collect();
    Ok(calgrid::source::IcsCalendarSource::load(&inputs, offset)?)
}

#[cfg(not(feature = "ics"))]
fn load_source(args: &Args) -> Result<calgrid::source::MemoryCalendarSource> {
    get_utc_offset(args).map_err(anyhow::Error::msg)?;
    if !args.calendars.is_empty() {
        bail!("calendar inputs need the `ics` feature");
    }
    Ok(calgrid::source::MemoryCalendarSource::new())
}
