//! The `learnsphere courses` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use learnsphere_core::dashboard::{course_board, my_courses};
use learnsphere_core::model::{Catalog, CourseStatus};
use learnsphere_core::parser;

pub fn execute(
    catalog_path: Option<PathBuf>,
    search: Option<String>,
    learner: Option<String>,
    enrollments: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    let catalog = super::load_catalog(catalog_path, &config)?;

    match learner {
        Some(learner_id) => print_learner_courses(&catalog, &learner_id, enrollments, search),
        None => {
            print_board(&catalog, search.as_deref());
            Ok(())
        }
    }
}

fn print_board(catalog: &Catalog, search: Option<&str>) {
    let board = course_board(catalog, search);
    if board.is_empty() {
        println!("No courses found.");
        return;
    }

    for status in CourseStatus::ALL {
        let column = board.column(status);
        println!("{status} ({})", column.len());
        for course in column {
            let lessons = catalog.total_lessons(&course.id).unwrap_or(0);
            let rating = catalog
                .average_rating(&course.id)
                .ok()
                .flatten()
                .map(|r| format!(", rated {r:.1}"))
                .unwrap_or_default();
            println!(
                "  [{}] {} ({lessons} lessons, {}{rating})",
                course.id, course.title, course.access
            );
        }
    }
}

fn print_learner_courses(
    catalog: &Catalog,
    learner_id: &str,
    enrollments: Option<PathBuf>,
    search: Option<String>,
) -> Result<()> {
    let records: Vec<_> = match enrollments {
        Some(path) => parser::parse_enrollments(&path)?
            .into_iter()
            .filter(|f| f.progress.learner_id == learner_id)
            .map(|f| f.progress)
            .collect(),
        None => Vec::new(),
    };

    let courses = my_courses(catalog, learner_id, &records, search.as_deref())?;
    if courses.is_empty() {
        println!("No courses found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Course", "Lessons", "Progress", "Resume at"]);
    for entry in &courses {
        let resume = entry
            .resume_at
            .map(|i| (i + 1).to_string())
            .unwrap_or_else(|| "done".to_string());
        table.add_row(vec![
            Cell::new(&entry.course.title),
            Cell::new(format!("{}/{}", entry.completed_lessons, entry.total_lessons)),
            Cell::new(format!("{}%", entry.percent_complete)),
            Cell::new(resume),
        ]);
    }
    println!("{table}");

    Ok(())
}
