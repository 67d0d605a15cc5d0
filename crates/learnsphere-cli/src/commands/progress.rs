//! The `learnsphere progress` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use learnsphere_core::progress::{ProgressRecord, ProgressTracker};

#[derive(Serialize)]
struct ProgressView {
    #[serde(flatten)]
    record: ProgressRecord,
    percent_complete: u8,
    resume_at: Option<usize>,
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    catalog_path: Option<PathBuf>,
    course_id: String,
    learner_id: String,
    complete: Option<String>,
    advance: usize,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    let catalog = super::load_catalog(catalog_path, &config)?;

    let mut tracker = ProgressTracker::new(&catalog, learner_id, &course_id)?;
    if let Some(ids) = &complete {
        for lesson_id in super::split_list(ids) {
            tracker.mark_complete(lesson_id)?;
        }
    }

    let mut position = tracker
        .first_incomplete()
        .unwrap_or_else(|| tracker.total_lessons().saturating_sub(1));
    for _ in 0..advance {
        position = tracker.advance(position)?;
    }

    let view = ProgressView {
        record: tracker.snapshot(),
        percent_complete: tracker.percent_complete(),
        resume_at: tracker.first_incomplete(),
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&view)?),
        _ => {
            let course = tracker.course();
            println!("Course: {} ({})", course.title, course.id);

            let mut table = Table::new();
            table.set_header(vec!["#", "Lesson", "Kind", "Duration", "Done"]);
            for (i, (lesson, done)) in tracker.lesson_states().into_iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&lesson.title),
                    Cell::new(lesson.kind),
                    Cell::new(format!("{} min", lesson.duration_minutes)),
                    Cell::new(if done { "yes" } else { "" }),
                ]);
            }
            println!("{table}");

            println!(
                "{}/{} lessons complete ({}%)",
                tracker.completed_count(),
                tracker.total_lessons(),
                view.percent_complete
            );
            match view.resume_at.and_then(|i| tracker.jump_to(i).ok()) {
                Some(lesson) => println!("Resume at: {}", lesson.title),
                None if tracker.is_course_complete() => println!("Course complete."),
                None => println!("No lessons yet."),
            }
        }
    }

    Ok(())
}
