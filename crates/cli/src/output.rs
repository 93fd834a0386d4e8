//! Rendering of catalogue listings, generated data and scenario reports

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::path::Path;

use crm_e2e::TestSuiteResult;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// One row per record
    #[default]
    Table,
    /// Pretty JSON, for piping into other tools
    Json,
    /// `Column: value` lines, records separated by `---`
    Plain,
}

/// A record shown as one table row
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;

    /// Colour of the whole row, e.g. a failed scenario
    fn highlight(&self) -> Option<Color> {
        None
    }
}

/// Print records in the chosen format
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        return;
    }
    if items.is_empty() {
        println!("Nothing to show.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(T::headers());

            for item in items {
                let cells = item.row().into_iter().map(|value| match item.highlight() {
                    Some(color) => Cell::new(value).fg(color),
                    None => Cell::new(value),
                });
                table.add_row(cells);
            }
            println!("{table}");
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                for (header, value) in T::headers().iter().zip(item.row()) {
                    println!("{header}: {value}");
                }
            }
        }
        OutputFormat::Json => {}
    }
}

/// Totals line and results file location after a run
pub fn print_run_summary(summary: &TestSuiteResult, results_file: &Path) {
    println!(
        "{} passed, {} failed, {} skipped in {:.1} s (run {})",
        summary.passed.to_string().green(),
        summary.failed.to_string().red(),
        summary.skipped.to_string().yellow(),
        summary.duration_ms as f64 / 1000.0,
        summary.run_id
    );
    println!("Results: {}", results_file.display().to_string().dimmed());

    if summary.skipped > 0 {
        print_warning(&format!("{} scenario(s) not run", summary.skipped));
    }
    if summary.success() {
        print_success("All selected scenarios passed");
    } else {
        print_error(&format!("{} scenario(s) failed", summary.failed));
    }
}

pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}
