//! Administrative reporting rows with JSON persistence.
//!
//! A reporting row joins one enrollment, the learner's progress in that
//! course and the time they spent on it. The completion percentage always
//! comes from the [`ProgressTracker`]; this module never recomputes it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EntityKind};
use crate::model::Catalog;
use crate::progress::{ProgressRecord, ProgressTracker};

/// Cumulative time a learner spent in a course, in whole minutes.
///
/// Displays as `"12h 30m"`, or `"0h"` when nothing was logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSpent {
    minutes: u32,
}

impl TimeSpent {
    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}

impl std::ops::Add for TimeSpent {
    type Output = TimeSpent;

    fn add(self, rhs: TimeSpent) -> TimeSpent {
        TimeSpent::from_minutes(self.minutes.saturating_add(rhs.minutes))
    }
}

impl std::iter::Sum for TimeSpent {
    fn sum<I: Iterator<Item = TimeSpent>>(iter: I) -> Self {
        iter.fold(TimeSpent::default(), |a, b| a + b)
    }
}

impl fmt::Display for TimeSpent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes == 0 {
            return write!(f, "0h");
        }
        write!(f, "{}h {:02}m", self.minutes / 60, self.minutes % 60)
    }
}

impl FromStr for TimeSpent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut minutes: u32 = 0;
        let mut seen_any = false;
        for part in s.split_whitespace() {
            let (value, factor) = if let Some(h) = part.strip_suffix('h') {
                (h, 60)
            } else if let Some(m) = part.strip_suffix('m') {
                (m, 1)
            } else {
                return Err(format!("invalid time spent: {s}"));
            };
            let value: u32 = value
                .parse()
                .map_err(|_| format!("invalid time spent: {s}"))?;
            minutes = minutes.saturating_add(value.saturating_mul(factor));
            seen_any = true;
        }
        if !seen_any {
            return Err(format!("invalid time spent: {s}"));
        }
        Ok(TimeSpent { minutes })
    }
}

impl TryFrom<String> for TimeSpent {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeSpent> for String {
    fn from(t: TimeSpent) -> Self {
        t.to_string()
    }
}

/// Where a learner stands in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    YetToStart,
    InProgress,
    Completed,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::YetToStart,
        ReportStatus::InProgress,
        ReportStatus::Completed,
    ];

    /// Not started until a start date exists, whatever the percentage says.
    /// Completed needs both 100% and a completion date.
    pub fn derive(
        started_on: Option<NaiveDate>,
        completion_percentage: u8,
        completed_on: Option<NaiveDate>,
    ) -> Self {
        if started_on.is_none() {
            ReportStatus::YetToStart
        } else if completion_percentage == 100 && completed_on.is_some() {
            ReportStatus::Completed
        } else {
            ReportStatus::InProgress
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::YetToStart => write!(f, "yet_to_start"),
            ReportStatus::InProgress => write!(f, "in_progress"),
            ReportStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "yet_to_start" | "not_started" => Ok(ReportStatus::YetToStart),
            "in_progress" => Ok(ReportStatus::InProgress),
            "completed" | "done" => Ok(ReportStatus::Completed),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

/// Enrollment facts for one learner in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub learner_id: String,
    /// Display name of the participant.
    pub participant: String,
    pub course_id: String,
    pub enrolled_on: NaiveDate,
    /// Set when the learner first opened a lesson.
    #[serde(default)]
    pub started_on: Option<NaiveDate>,
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
}

/// One learner's standing in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingRow {
    pub course_id: String,
    pub course_name: String,
    pub learner_id: String,
    pub participant: String,
    pub enrolled_on: NaiveDate,
    pub started_on: Option<NaiveDate>,
    pub time_spent: TimeSpent,
    pub completion_percentage: u8,
    pub completed_on: Option<NaiveDate>,
    pub status: ReportStatus,
}

/// Join an enrollment with the matching progress tracker.
///
/// The tracker must belong to the same learner and course as the enrollment.
pub fn build_row(
    enrollment: &Enrollment,
    progress: &ProgressTracker<'_>,
    time_spent: TimeSpent,
) -> std::result::Result<ReportingRow, EngineError> {
    let course = progress.course();
    if course.id != enrollment.course_id {
        return Err(EngineError::invalid_reference(
            EntityKind::Course,
            course.id.as_str(),
            format!("enrollment of '{}' in '{}'", enrollment.learner_id, enrollment.course_id),
        ));
    }
    if progress.learner_id() != enrollment.learner_id {
        return Err(EngineError::invalid_reference(
            EntityKind::Learner,
            progress.learner_id(),
            format!("enrollment of '{}' in '{}'", enrollment.learner_id, enrollment.course_id),
        ));
    }

    let completion_percentage = progress.percent_complete();
    if enrollment.completed_on.is_some() && completion_percentage < 100 {
        tracing::warn!(
            learner = %enrollment.learner_id,
            course = %enrollment.course_id,
            completion_percentage,
            "completion date recorded for an unfinished course"
        );
    }

    Ok(ReportingRow {
        course_id: course.id.clone(),
        course_name: course.title.clone(),
        learner_id: enrollment.learner_id.clone(),
        participant: enrollment.participant.clone(),
        enrolled_on: enrollment.enrolled_on,
        started_on: enrollment.started_on,
        time_spent,
        completion_percentage,
        completed_on: enrollment.completed_on,
        status: ReportStatus::derive(
            enrollment.started_on,
            completion_percentage,
            enrollment.completed_on,
        ),
    })
}

/// Everything recorded about one enrollment: the enrollment itself, the
/// learner's completed lessons and the time they logged.
#[derive(Debug, Clone)]
pub struct EnrollmentFacts {
    pub enrollment: Enrollment,
    pub progress: ProgressRecord,
    pub time_spent: TimeSpent,
}

/// Build one row per enrollment, in input order.
pub fn build_rows(
    catalog: &Catalog,
    facts: &[EnrollmentFacts],
) -> std::result::Result<Vec<ReportingRow>, EngineError> {
    facts
        .iter()
        .map(|f| {
            let tracker = ProgressTracker::resume(catalog, &f.progress)?;
            build_row(&f.enrollment, &tracker, f.time_spent)
        })
        .collect()
}

/// Row selection for dashboards.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub status: Option<ReportStatus>,
    pub course_id: Option<String>,
    /// Case-insensitive match against participant or course name.
    pub search: Option<String>,
}

impl RowFilter {
    pub fn matches(&self, row: &ReportingRow) -> bool {
        if self.status.is_some_and(|s| s != row.status) {
            return false;
        }
        if self.course_id.as_ref().is_some_and(|c| *c != row.course_id) {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            return row.participant.to_lowercase().contains(&needle)
                || row.course_name.to_lowercase().contains(&needle);
        }
        true
    }
}

pub fn filter_rows<'r>(rows: &'r [ReportingRow], filter: &RowFilter) -> Vec<&'r ReportingRow> {
    rows.iter().filter(|r| filter.matches(r)).collect()
}

/// Totals shown above the reporting table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub participants: usize,
    pub yet_to_start: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub average_completion: f64,
    pub total_time_spent: TimeSpent,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ReportingRow]) -> Self {
        let count = |status: ReportStatus| rows.iter().filter(|r| r.status == status).count();
        let average_completion = if rows.is_empty() {
            0.0
        } else {
            rows.iter()
                .map(|r| f64::from(r.completion_percentage))
                .sum::<f64>()
                / rows.len() as f64
        };
        Self {
            participants: rows.len(),
            yet_to_start: count(ReportStatus::YetToStart),
            in_progress: count(ReportStatus::InProgress),
            completed: count(ReportStatus::Completed),
            average_completion,
            total_time_spent: rows.iter().map(|r| r.time_spent).sum(),
        }
    }
}

/// Summary of the catalog a report was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub id: String,
    pub name: String,
    pub course_count: usize,
}

/// A complete reporting snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub catalog: CatalogSummary,
    pub rows: Vec<ReportingRow>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn new(catalog: &Catalog, rows: Vec<ReportingRow>) -> Self {
        let summary = ReportSummary::from_rows(&rows);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            catalog: CatalogSummary {
                id: catalog.id().to_string(),
                name: catalog.name().to_string(),
                course_count: catalog.courses().len(),
            },
            rows,
            summary,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: Report =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let s = &self.summary;

        md.push_str(&format!(
            "**Summary:** {} participants, {} yet to start, {} in progress, {} completed ({:.1}% average completion)\n\n",
            s.participants, s.yet_to_start, s.in_progress, s.completed, s.average_completion
        ));

        if self.rows.is_empty() {
            return md;
        }

        md.push_str("| Course | Participant | Enrolled | Started | Time Spent | Completion | Completed | Status |\n");
        md.push_str("|--------|-------------|----------|---------|------------|------------|-----------|--------|\n");
        for r in &self.rows {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {}% | {} | {} |\n",
                r.course_name,
                r.participant,
                r.enrolled_on,
                optional_date(r.started_on),
                r.time_spent,
                r.completion_percentage,
                optional_date(r.completed_on),
                r.status
            ));
        }

        md
    }
}

fn optional_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::catalog;
    use crate::progress::ProgressTracker;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn enrollment(course_id: &str, started: Option<&str>, completed: Option<&str>) -> Enrollment {
        Enrollment {
            learner_id: "john".into(),
            participant: "John Doe".into(),
            course_id: course_id.into(),
            enrolled_on: date("2025-11-01"),
            started_on: started.map(date),
            completed_on: completed.map(date),
        }
    }

    #[test]
    fn time_spent_display_and_parse() {
        assert_eq!(TimeSpent::from_minutes(750).to_string(), "12h 30m");
        assert_eq!(TimeSpent::from_minutes(2160).to_string(), "36h 00m");
        assert_eq!(TimeSpent::from_minutes(0).to_string(), "0h");
        assert_eq!("8h 45m".parse::<TimeSpent>().unwrap().minutes(), 525);
        assert_eq!("0h".parse::<TimeSpent>().unwrap().minutes(), 0);
        assert_eq!("45m".parse::<TimeSpent>().unwrap().minutes(), 45);
        assert!("".parse::<TimeSpent>().is_err());
        assert!("12 hours".parse::<TimeSpent>().is_err());
    }

    #[test]
    fn status_branches() {
        let d = Some(date("2026-01-10"));
        assert_eq!(ReportStatus::derive(None, 100, d), ReportStatus::YetToStart);
        assert_eq!(ReportStatus::derive(None, 0, None), ReportStatus::YetToStart);
        assert_eq!(ReportStatus::derive(d, 100, d), ReportStatus::Completed);
        assert_eq!(ReportStatus::derive(d, 100, None), ReportStatus::InProgress);
        assert_eq!(ReportStatus::derive(d, 75, d), ReportStatus::InProgress);
    }

    #[test]
    fn rows_for_all_three_states() {
        let catalog = catalog();

        let untouched = ProgressTracker::new(&catalog, "john", "1").unwrap();
        let row = build_row(
            &enrollment("1", None, None),
            &untouched,
            TimeSpent::default(),
        )
        .unwrap();
        assert_eq!(row.status, ReportStatus::YetToStart);
        assert_eq!(row.completion_percentage, 0);

        let mut partial = ProgressTracker::new(&catalog, "john", "1").unwrap();
        partial.advance(0).unwrap();
        partial.advance(1).unwrap();
        partial.advance(2).unwrap();
        let row = build_row(
            &enrollment("1", Some("2025-11-02"), None),
            &partial,
            "12h 30m".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(row.status, ReportStatus::InProgress);
        assert_eq!(row.completion_percentage, 75);
        assert_eq!(row.course_name, "Complete Web Development Bootcamp");

        let mut done = ProgressTracker::new(&catalog, "john", "2").unwrap();
        done.mark_complete("d1").unwrap();
        done.mark_complete("d2").unwrap();
        let row = build_row(
            &enrollment("2", Some("2025-11-06"), Some("2026-01-10")),
            &done,
            "36h 00m".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(row.status, ReportStatus::Completed);
    }

    #[test]
    fn mismatched_tracker_is_rejected() {
        let catalog = catalog();
        let tracker = ProgressTracker::new(&catalog, "john", "2").unwrap();
        assert!(matches!(
            build_row(&enrollment("1", None, None), &tracker, TimeSpent::default()),
            Err(EngineError::InvalidReference { kind: EntityKind::Course, .. })
        ));
        let someone_else = ProgressTracker::new(&catalog, "maria", "1").unwrap();
        assert!(matches!(
            build_row(&enrollment("1", None, None), &someone_else, TimeSpent::default()),
            Err(EngineError::InvalidReference { kind: EntityKind::Learner, .. })
        ));
    }

    fn sample_rows() -> Vec<ReportingRow> {
        let catalog = catalog();
        let mut done = ProgressTracker::new(&catalog, "john", "2").unwrap();
        done.mark_complete("d1").unwrap();
        done.mark_complete("d2").unwrap();
        let fresh = ProgressTracker::new(&catalog, "john", "1").unwrap();
        vec![
            build_row(
                &enrollment("2", Some("2025-11-06"), Some("2026-01-10")),
                &done,
                TimeSpent::from_minutes(90),
            )
            .unwrap(),
            build_row(&enrollment("1", None, None), &fresh, TimeSpent::default()).unwrap(),
        ]
    }

    #[test]
    fn summary_and_filters() {
        let rows = sample_rows();
        let summary = ReportSummary::from_rows(&rows);
        assert_eq!(summary.participants, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.yet_to_start, 1);
        assert!((summary.average_completion - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.total_time_spent.to_string(), "1h 30m");

        let completed = filter_rows(
            &rows,
            &RowFilter {
                status: Some(ReportStatus::Completed),
                ..Default::default()
            },
        );
        assert_eq!(completed.len(), 1);
        let search = filter_rows(
            &rows,
            &RowFilter {
                search: Some("bootcamp".into()),
                ..Default::default()
            },
        );
        assert_eq!(search[0].course_id, "1");
    }

    #[test]
    fn rows_from_recorded_facts() {
        let catalog = catalog();
        let mut progress = ProgressRecord::new("john", "1");
        progress.completed.insert("l1".into());
        let facts = vec![EnrollmentFacts {
            enrollment: enrollment("1", Some("2025-11-02"), None),
            progress,
            time_spent: TimeSpent::from_minutes(30),
        }];
        let rows = build_rows(&catalog, &facts).unwrap();
        assert_eq!(rows[0].completion_percentage, 25);
        assert_eq!(rows[0].status, ReportStatus::InProgress);

        let mut stray = facts[0].clone();
        stray.progress.completed.insert("d1".into());
        assert!(build_rows(&catalog, &[stray]).is_err());
    }

    #[test]
    fn json_roundtrip() {
        let report = Report::new(&catalog(), sample_rows());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = Report::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.rows, report.rows);
        assert_eq!(loaded.rows[0].time_spent.to_string(), "1h 30m");
    }

    #[test]
    fn markdown_output() {
        let md = Report::new(&catalog(), sample_rows()).to_markdown();
        assert!(md.contains("1 completed"));
        assert!(md.contains("| UI/UX Design Masterclass | John Doe |"));
        assert!(md.contains("yet_to_start"));
    }
}
