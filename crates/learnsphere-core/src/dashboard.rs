//! Course listings for the admin board and the learner's "my courses" page.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{EngineError, EntityKind, Result};
use crate::model::{AccessMode, Catalog, Course, CourseStatus};
use crate::progress::{ProgressRecord, ProgressTracker};

fn title_matches(course: &Course, search: Option<&str>) -> bool {
    match search {
        Some(needle) => course
            .title
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        None => true,
    }
}

/// Courses grouped by lifecycle status, in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct CourseBoard<'a> {
    pub draft: Vec<&'a Course>,
    pub published: Vec<&'a Course>,
    pub archived: Vec<&'a Course>,
}

impl<'a> CourseBoard<'a> {
    pub fn column(&self, status: CourseStatus) -> &[&'a Course] {
        match status {
            CourseStatus::Draft => &self.draft,
            CourseStatus::Published => &self.published,
            CourseStatus::Archived => &self.archived,
        }
    }

    pub fn len(&self) -> usize {
        self.draft.len() + self.published.len() + self.archived.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Group the catalog's courses for the admin board, optionally keeping only
/// titles containing `search` (case-insensitive).
pub fn course_board<'a>(catalog: &'a Catalog, search: Option<&str>) -> CourseBoard<'a> {
    let mut board = CourseBoard {
        draft: Vec::new(),
        published: Vec::new(),
        archived: Vec::new(),
    };
    for course in catalog.courses().iter().filter(|c| title_matches(c, search)) {
        match course.status {
            CourseStatus::Draft => board.draft.push(course),
            CourseStatus::Published => board.published.push(course),
            CourseStatus::Archived => board.archived.push(course),
        }
    }
    board
}

/// A course on the learner's own page.
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourse<'a> {
    pub course: &'a Course,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub percent_complete: u8,
    /// Index of the lesson to resume at, `None` once everything is done.
    pub resume_at: Option<usize>,
}

/// Courses a learner is enrolled in: any course they made progress in, plus
/// every open-access course.
///
/// `records` must all belong to `learner_id`; each is validated against the
/// catalog.
pub fn my_courses<'a>(
    catalog: &'a Catalog,
    learner_id: &str,
    records: &[ProgressRecord],
    search: Option<&str>,
) -> Result<Vec<EnrolledCourse<'a>>> {
    let mut trackers: HashMap<&str, ProgressTracker<'a>> = HashMap::new();
    for record in records {
        if record.learner_id != learner_id {
            return Err(EngineError::invalid_reference(
                EntityKind::Learner,
                record.learner_id.as_str(),
                format!("progress of '{learner_id}'"),
            ));
        }
        trackers.insert(record.course_id.as_str(), ProgressTracker::resume(catalog, record)?);
    }

    let mut enrolled = Vec::new();
    for course in catalog.courses().iter().filter(|c| title_matches(c, search)) {
        let tracker = match trackers.remove(course.id.as_str()) {
            Some(t) => t,
            None => ProgressTracker::new(catalog, learner_id, &course.id)?,
        };
        let has_progress = tracker.completed_count() > 0;
        if !has_progress && course.access != AccessMode::Open {
            continue;
        }
        enrolled.push(EnrolledCourse {
            course,
            completed_lessons: tracker.completed_count(),
            total_lessons: tracker.total_lessons(),
            percent_complete: tracker.percent_complete(),
            resume_at: tracker.first_incomplete(),
        });
    }
    Ok(enrolled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::catalog;

    #[test]
    fn board_groups_by_status() {
        let catalog = catalog();
        let board = course_board(&catalog, None);
        assert_eq!(board.published.len(), 2);
        assert_eq!(board.draft.len(), 1);
        assert!(board.column(CourseStatus::Archived).is_empty());
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn board_search_is_case_insensitive() {
        let catalog = catalog();
        let board = course_board(&catalog, Some("DESIGN"));
        assert_eq!(board.len(), 1);
        assert_eq!(board.published[0].id, "2");
        assert!(course_board(&catalog, Some("rust")).is_empty());
    }

    #[test]
    fn my_courses_includes_open_and_started() {
        let catalog = catalog();
        let mut paid = ProgressRecord::new("alex", "2");
        paid.completed.insert("d1".into());

        let courses = my_courses(&catalog, "alex", &[paid], None).unwrap();
        let ids: Vec<&str> = courses.iter().map(|c| c.course.id.as_str()).collect();
        // "1" is open access, "2" has progress, "empty" is invitation-only and untouched.
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(courses[1].percent_complete, 50);
        assert_eq!(courses[1].resume_at, Some(1));
        assert_eq!(courses[0].percent_complete, 0);
    }

    #[test]
    fn my_courses_rejects_other_learners_records() {
        let catalog = catalog();
        let foreign = ProgressRecord::new("maria", "1");
        assert!(my_courses(&catalog, "alex", &[foreign], None).is_err());
    }
}
