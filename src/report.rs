/*!
 * Reporting functionality for dirtext
 *
 * Renders the outcome of a create/recreate run as console tables using the
 * tabled library.
 */

use std::path::PathBuf;
use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::materializer::MaterializeStats;

/// Outcome of a create or recreate run
#[derive(Debug, Clone)]
pub struct MaterializeReport {
    /// Operation name shown in the title
    pub operation: String,
    /// Directory the structure was created under
    pub project_root: PathBuf,
    /// Time taken to parse and materialize
    pub duration: Duration,
    /// Materialization statistics
    pub stats: MaterializeStats,
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for materialization results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &MaterializeReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &MaterializeReport) {
        println!("\n{}", self.generate_report(report));
    }

    // Create a summary table using the tabled crate
    fn create_summary_table(&self, report: &MaterializeReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let stats = &report.stats;
        let rows = vec![
            SummaryRow {
                key: "📂 Project Root".to_string(),
                value: report.project_root.display().to_string(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📁 Directories".to_string(),
                value: stats.directories_created.to_string(),
            },
            SummaryRow {
                key: "📄 Files".to_string(),
                value: stats.files_created.to_string(),
            },
            SummaryRow {
                key: "🙈 Ignored".to_string(),
                value: stats.skipped.to_string(),
            },
            SummaryRow {
                key: "⚠️ Failures".to_string(),
                value: stats.failures.len().to_string(),
            },
        ];

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    // Create a failures table using the tabled crate
    fn create_failures_table(&self, report: &MaterializeReport) -> String {
        #[derive(Tabled)]
        struct FailureRow {
            #[tabled(rename = "Path")]
            path: String,

            #[tabled(rename = "Error")]
            error: String,
        }

        let rows: Vec<FailureRow> = report
            .stats
            .failures
            .iter()
            .map(|failure| FailureRow {
                path: failure
                    .path
                    .strip_prefix(&report.project_root)
                    .unwrap_or(&failure.path)
                    .display()
                    .to_string(),
                error: failure.error.clone(),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    // Generate a console table report
    fn generate_console_report(&self, report: &MaterializeReport) -> String {
        let summary_table = self.create_summary_table(report);
        let summary_title = if report.stats.is_clean() {
            format!("✅  {} COMPLETE", report.operation.to_uppercase())
        } else {
            format!("⚠️  {} COMPLETED WITH ERRORS", report.operation.to_uppercase())
        };

        if report.stats.is_clean() {
            return format!("{}\n{}", summary_title, summary_table);
        }

        let failures_table = self.create_failures_table(report);
        format!(
            "{}\n{}\n\n{}\n{}",
            "📋  FAILED ENTRIES", failures_table, summary_title, summary_table
        )
    }
}
