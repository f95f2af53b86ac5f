//! Progress reporting for the exporter
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::export::ExportSummary;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays the current export unit
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Set a status message (current file/table being exported)
    pub fn set_status(&self, status: impl Into<String>) {
        self.bar.set_message(status.into());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header at the start of the export
pub fn print_header(input: &str, output_dir: &str) {
    println!();
    println!(
        "{} {}",
        style("sqlite-exporter").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), input);
    println!("  {} {}", style("Output:").bold(), output_dir);
    println!();
}

/// Print a summary of the export results
pub fn print_summary(summary: &ExportSummary, output_dir: &str) {
    let title = if summary.interrupted {
        style("Export Interrupted").yellow().bold()
    } else {
        style("Export Complete").green().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Databases:").bold(),
        format_number(summary.databases_processed)
    );
    println!(
        "  {} {}",
        style("Tables exported:").bold(),
        format_number(summary.tables_exported)
    );
    println!(
        "  {} {} ({})",
        style("Rows written:").bold(),
        format_number(summary.rows_written),
        format_size(summary.csv_bytes, BINARY)
    );
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        summary.duration.as_secs_f64()
    );
    if summary.files_skipped > 0 {
        println!(
            "  {} {}",
            style("Files skipped:").yellow().bold(),
            format_number(summary.files_skipped)
        );
    }
    if summary.conversion_failures > 0 {
        println!(
            "  {} {}",
            style("Conversion failures:").yellow().bold(),
            format_number(summary.conversion_failures)
        );
    }
    if summary.error_count() > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(summary.error_count())
        );
    }
    println!("  {} {}", style("Output:").bold(), output_dir);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }
}
