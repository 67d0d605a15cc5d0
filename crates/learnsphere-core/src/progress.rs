//! Per-(learner, course) lesson progress.
//!
//! A [`ProgressTracker`] owns the completion set for one learner in one
//! course and borrows the course's ordered lesson sequence from the catalog.
//! The completion percentage is always computed from the set. Moving forward
//! through a course completes the lesson being left; moving back never
//! changes completion.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EntityKind, Result};
use crate::model::{Catalog, Course, Lesson};

/// Persistable snapshot of one learner's progress in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub learner_id: String,
    pub course_id: String,
    /// Completed lesson ids.
    #[serde(default)]
    pub completed: BTreeSet<String>,
}

impl ProgressRecord {
    pub fn new(learner_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            course_id: course_id.into(),
            completed: BTreeSet::new(),
        }
    }
}

/// `round(100 * completed / total)` with half-up rounding; 0 for an empty course.
pub fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u8
}

/// Completion state of one course for one learner.
#[derive(Debug, Clone)]
pub struct ProgressTracker<'a> {
    learner_id: String,
    course: &'a Course,
    lessons: Vec<&'a Lesson>,
    completed: BTreeSet<String>,
}

impl<'a> ProgressTracker<'a> {
    /// Start tracking a course the learner has not touched yet.
    pub fn new(catalog: &'a Catalog, learner_id: impl Into<String>, course_id: &str) -> Result<Self> {
        Ok(Self {
            learner_id: learner_id.into(),
            course: catalog.course(course_id)?,
            lessons: catalog.lessons_for(course_id)?,
            completed: BTreeSet::new(),
        })
    }

    /// Rebuild a tracker from a stored snapshot.
    ///
    /// Fails if the snapshot names a lesson outside the course, so a tracker
    /// never holds ids that are not part of its lesson sequence.
    pub fn resume(catalog: &'a Catalog, record: &ProgressRecord) -> Result<Self> {
        let mut tracker = Self::new(catalog, record.learner_id.clone(), &record.course_id)?;
        if let Some(foreign) = record
            .completed
            .iter()
            .find(|id| tracker.position_of(id).is_none())
        {
            return Err(tracker.foreign_lesson(foreign));
        }
        tracker.completed = record.completed.clone();
        Ok(tracker)
    }

    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }

    pub fn course(&self) -> &'a Course {
        self.course
    }

    pub fn lessons(&self) -> &[&'a Lesson] {
        &self.lessons
    }

    pub fn total_lessons(&self) -> usize {
        self.lessons.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.completed.contains(lesson_id)
    }

    /// Mark a lesson complete. Returns `true` if it was not complete before.
    pub fn mark_complete(&mut self, lesson_id: &str) -> Result<bool> {
        if self.position_of(lesson_id).is_none() {
            return Err(self.foreign_lesson(lesson_id));
        }
        let added = self.completed.insert(lesson_id.to_string());
        if added {
            tracing::debug!(
                learner = %self.learner_id,
                course = %self.course.id,
                lesson = lesson_id,
                percent = self.percent_complete(),
                "lesson completed"
            );
        }
        Ok(added)
    }

    /// Complete the lesson at `current` and move to the next one.
    ///
    /// At the last lesson the position stays put; the lesson is still
    /// completed, which is how a course gets finished.
    pub fn advance(&mut self, current: usize) -> Result<usize> {
        let lesson = self.lesson_at(current)?;
        let lesson_id = lesson.id.clone();
        self.mark_complete(&lesson_id)?;
        if current + 1 < self.lessons.len() {
            Ok(current + 1)
        } else {
            Ok(current)
        }
    }

    /// Move to the previous lesson. Completion is left untouched.
    pub fn retreat(&self, current: usize) -> Result<usize> {
        self.lesson_at(current)?;
        Ok(current.saturating_sub(1))
    }

    /// Jump straight to a lesson, e.g. from the course outline.
    pub fn jump_to(&self, index: usize) -> Result<&'a Lesson> {
        self.lesson_at(index)
    }

    pub fn percent_complete(&self) -> u8 {
        completion_percent(self.completed.len(), self.lessons.len())
    }

    pub fn is_course_complete(&self) -> bool {
        !self.lessons.is_empty() && self.completed.len() == self.lessons.len()
    }

    /// Where a returning learner should resume.
    pub fn first_incomplete(&self) -> Option<usize> {
        self.lessons
            .iter()
            .position(|l| !self.completed.contains(&l.id))
    }

    /// Lessons in course order paired with their completion flag.
    pub fn lesson_states(&self) -> Vec<(&'a Lesson, bool)> {
        self.lessons
            .iter()
            .map(|l| (*l, self.completed.contains(&l.id)))
            .collect()
    }

    pub fn snapshot(&self) -> ProgressRecord {
        ProgressRecord {
            learner_id: self.learner_id.clone(),
            course_id: self.course.id.clone(),
            completed: self.completed.clone(),
        }
    }

    fn position_of(&self, lesson_id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.id == lesson_id)
    }

    fn lesson_at(&self, index: usize) -> Result<&'a Lesson> {
        self.lessons.get(index).copied().ok_or_else(|| {
            EngineError::invalid_reference(
                EntityKind::LessonPosition,
                index.to_string(),
                format!("course '{}' ({} lessons)", self.course.id, self.lessons.len()),
            )
        })
    }

    fn foreign_lesson(&self, lesson_id: &str) -> EngineError {
        EngineError::invalid_reference(
            EntityKind::Lesson,
            lesson_id,
            format!("course '{}'", self.course.id),
        )
    }
}
