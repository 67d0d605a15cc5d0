//! The `learnsphere report` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use learnsphere_core::parser;
use learnsphere_core::reporting::{
    build_rows, filter_rows, Report, ReportStatus, ReportingRow, RowFilter,
};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    catalog_path: Option<PathBuf>,
    enrollments_path: PathBuf,
    status: Option<String>,
    course: Option<String>,
    search: Option<String>,
    format: String,
    output: Option<Option<PathBuf>>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    let catalog = super::load_catalog(catalog_path, &config)?;

    let filter = RowFilter {
        status: status
            .map(|s| s.parse::<ReportStatus>().map_err(anyhow::Error::msg))
            .transpose()?,
        course_id: course,
        search,
    };

    let facts = parser::parse_enrollments(&enrollments_path)?;
    let all_rows = build_rows(&catalog, &facts)?;
    let rows: Vec<ReportingRow> = filter_rows(&all_rows, &filter).into_iter().cloned().collect();
    let report = Report::new(&catalog, rows);

    if let Some(dir) = output {
        let dir = dir.unwrap_or_else(|| config.output_dir.clone());
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = dir.join(format!("report-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_table(&report),
    }

    Ok(())
}

fn print_table(report: &Report) {
    let mut table = Table::new();
    table.set_header(vec![
        "Course",
        "Participant",
        "Enrolled",
        "Started",
        "Time Spent",
        "Completion",
        "Completed",
        "Status",
    ]);

    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    for r in &report.rows {
        table.add_row(vec![
            Cell::new(&r.course_name),
            Cell::new(&r.participant),
            Cell::new(r.enrolled_on),
            Cell::new(date(r.started_on)),
            Cell::new(r.time_spent),
            Cell::new(format!("{}%", r.completion_percentage)),
            Cell::new(date(r.completed_on)),
            Cell::new(r.status),
        ]);
    }
    println!("{table}");

    let s = &report.summary;
    println!(
        "{} participants: {} yet to start, {} in progress, {} completed ({:.1}% average, {} total)",
        s.participants, s.yet_to_start, s.in_progress, s.completed, s.average_completion,
        s.total_time_spent
    );
}
