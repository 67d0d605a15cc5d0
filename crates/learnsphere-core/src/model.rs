//! Catalog model: courses, lessons, quizzes and reviews.
//!
//! The catalog holds static reference facts only. How far a learner got
//! through a course lives in [`crate::progress`], never here.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EntityKind, Result};
use crate::quiz::RewardTable;

/// Lifecycle of a course as seen by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Published,
    Archived,
}

impl CourseStatus {
    pub const ALL: [CourseStatus; 3] = [
        CourseStatus::Draft,
        CourseStatus::Published,
        CourseStatus::Archived,
    ];
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseStatus::Draft => write!(f, "draft"),
            CourseStatus::Published => write!(f, "published"),
            CourseStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for CourseStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(CourseStatus::Draft),
            "published" => Ok(CourseStatus::Published),
            "archived" => Ok(CourseStatus::Archived),
            other => Err(format!("unknown course status: {other}")),
        }
    }
}

/// How a learner gets into a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Open,
    Invitation,
    Payment,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Open => write!(f, "open"),
            AccessMode::Invitation => write!(f, "invitation"),
            AccessMode::Payment => write!(f, "payment"),
        }
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(AccessMode::Open),
            "invitation" | "invite" => Ok(AccessMode::Invitation),
            "payment" | "paid" => Ok(AccessMode::Payment),
            other => Err(format!("unknown access mode: {other}")),
        }
    }
}

/// Who can see a course in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Everyone,
    SignedIn,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Everyone => write!(f, "everyone"),
            Visibility::SignedIn => write!(f, "signed_in"),
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "everyone" => Ok(Visibility::Everyone),
            "signed_in" | "signed-in" => Ok(Visibility::SignedIn),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

/// What a lesson presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Video,
    Document,
    Image,
    Quiz,
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonKind::Video => write!(f, "video"),
            LessonKind::Document => write!(f, "document"),
            LessonKind::Image => write!(f, "image"),
            LessonKind::Quiz => write!(f, "quiz"),
        }
    }
}

impl FromStr for LessonKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(LessonKind::Video),
            "document" | "doc" => Ok(LessonKind::Document),
            "image" => Ok(LessonKind::Image),
            "quiz" => Ok(LessonKind::Quiz),
            other => Err(format!("unknown lesson kind: {other}")),
        }
    }
}

/// A course definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// One-line summary shown on cards.
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Price in the catalog currency; `None` for free courses.
    #[serde(default)]
    pub price: Option<f64>,
    pub status: CourseStatus,
    pub access: AccessMode,
    pub visibility: Visibility,
}

/// A single lesson. Its position within the course is its position in the
/// catalog's lesson list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    /// Owning course.
    pub course_id: String,
    pub title: String,
    pub kind: LessonKind,
    /// Expected duration in minutes.
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub description: String,
    /// Quiz presented by a `quiz` lesson.
    #[serde(default)]
    pub quiz_id: Option<String>,
}

/// One selectable answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A single-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// The option flagged correct. Well-formed questions (the only kind a
    /// [`Catalog`] accepts) always have exactly one.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    pub fn option(&self, option_id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Reject questions that do not have exactly one correct option.
    pub fn check_well_formed(&self, quiz_id: &str) -> Result<()> {
        let correct = self.options.iter().filter(|o| o.is_correct).count();
        if correct != 1 {
            return Err(EngineError::MalformedQuestion {
                quiz_id: quiz_id.to_string(),
                question_id: self.id.clone(),
                correct,
            });
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.id.as_str()) {
                return Err(EngineError::DuplicateId {
                    kind: EntityKind::AnswerOption,
                    id: option.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A quiz attached to a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub questions: Vec<Question>,
    /// Points paid per attempt number.
    pub rewards: RewardTable,
}

impl Quiz {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// A learner's review of a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub course_id: String,
    pub reviewer: String,
    /// Star rating, 1 to 5.
    pub rating: u8,
    #[serde(default)]
    pub text: String,
    pub date: chrono::NaiveDate,
}

/// Immutable, validated reference data.
///
/// Construction checks referential integrity and question well-formedness,
/// so everything downstream can assume a consistent catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    id: String,
    name: String,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    quizzes: Vec<Quiz>,
    reviews: Vec<Review>,
}

impl Catalog {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        courses: Vec<Course>,
        lessons: Vec<Lesson>,
        quizzes: Vec<Quiz>,
        reviews: Vec<Review>,
    ) -> Result<Self> {
        ensure_unique(EntityKind::Course, courses.iter().map(|c| c.id.as_str()))?;
        ensure_unique(EntityKind::Lesson, lessons.iter().map(|l| l.id.as_str()))?;
        ensure_unique(EntityKind::Quiz, quizzes.iter().map(|q| q.id.as_str()))?;
        ensure_unique(EntityKind::Review, reviews.iter().map(|r| r.id.as_str()))?;

        let course_ids: HashSet<&str> = courses.iter().map(|c| c.id.as_str()).collect();
        let quiz_ids: HashSet<&str> = quizzes.iter().map(|q| q.id.as_str()).collect();

        for lesson in &lessons {
            if !course_ids.contains(lesson.course_id.as_str()) {
                return Err(EngineError::not_found(EntityKind::Course, &lesson.course_id));
            }
            if let Some(quiz_id) = &lesson.quiz_id {
                if !quiz_ids.contains(quiz_id.as_str()) {
                    return Err(EngineError::not_found(EntityKind::Quiz, quiz_id));
                }
            }
        }

        for quiz in &quizzes {
            if !course_ids.contains(quiz.course_id.as_str()) {
                return Err(EngineError::not_found(EntityKind::Course, &quiz.course_id));
            }
            ensure_unique(
                EntityKind::Question,
                quiz.questions.iter().map(|q| q.id.as_str()),
            )?;
            for question in &quiz.questions {
                question.check_well_formed(&quiz.id)?;
            }
        }

        for review in &reviews {
            if !course_ids.contains(review.course_id.as_str()) {
                return Err(EngineError::not_found(EntityKind::Course, &review.course_id));
            }
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            courses,
            lessons,
            quizzes,
            reviews,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    pub fn course(&self, course_id: &str) -> Result<&Course> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Course, course_id))
    }

    pub fn lesson(&self, lesson_id: &str) -> Result<&Lesson> {
        self.lessons
            .iter()
            .find(|l| l.id == lesson_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Lesson, lesson_id))
    }

    pub fn quiz(&self, quiz_id: &str) -> Result<&Quiz> {
        self.quizzes
            .iter()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Quiz, quiz_id))
    }

    /// The ordered lesson sequence of a course.
    pub fn lessons_for(&self, course_id: &str) -> Result<Vec<&Lesson>> {
        self.course(course_id)?;
        Ok(self
            .lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .collect())
    }

    pub fn total_lessons(&self, course_id: &str) -> Result<usize> {
        Ok(self.lessons_for(course_id)?.len())
    }

    pub fn quizzes_for(&self, course_id: &str) -> Result<Vec<&Quiz>> {
        self.course(course_id)?;
        Ok(self
            .quizzes
            .iter()
            .filter(|q| q.course_id == course_id)
            .collect())
    }

    pub fn reviews_for(&self, course_id: &str) -> Result<Vec<&Review>> {
        self.course(course_id)?;
        Ok(self
            .reviews
            .iter()
            .filter(|r| r.course_id == course_id)
            .collect())
    }

    /// Mean star rating, `None` when the course has no reviews.
    pub fn average_rating(&self, course_id: &str) -> Result<Option<f64>> {
        let reviews = self.reviews_for(course_id)?;
        if reviews.is_empty() {
            return Ok(None);
        }
        let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        Ok(Some(f64::from(sum) / reviews.len() as f64))
    }
}

fn ensure_unique<'a>(kind: EntityKind, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(EngineError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn enum_display_and_parse() {
        assert_eq!(CourseStatus::Published.to_string(), "published");
        assert_eq!("Archived".parse::<CourseStatus>().unwrap(), CourseStatus::Archived);
        assert_eq!("invite".parse::<AccessMode>().unwrap(), AccessMode::Invitation);
        assert_eq!("signed-in".parse::<Visibility>().unwrap(), Visibility::SignedIn);
        assert_eq!(Visibility::SignedIn.to_string(), "signed_in");
        assert_eq!("doc".parse::<LessonKind>().unwrap(), LessonKind::Document);
        assert!("podcast".parse::<LessonKind>().is_err());
    }

    #[test]
    fn lessons_keep_catalog_order() {
        let catalog = catalog();
        let ids: Vec<&str> = catalog
            .lessons_for("1")
            .unwrap()
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["l1", "l2", "l3", "l4"]);
        assert_eq!(catalog.total_lessons("empty").unwrap(), 0);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let catalog = catalog();
        assert!(matches!(
            catalog.course("nope"),
            Err(EngineError::NotFound { kind: EntityKind::Course, .. })
        ));
        assert!(matches!(
            catalog.lessons_for("nope"),
            Err(EngineError::NotFound { .. })
        ));
        assert!(catalog.quiz("q404").is_err());
    }

    #[test]
    fn rejects_question_with_two_correct_options() {
        let mut quiz = html_quiz();
        quiz.questions[2].options[0].is_correct = true;
        let err = Catalog::new(
            "bad",
            "Bad",
            vec![course("1", "Web", CourseStatus::Published, AccessMode::Open)],
            vec![],
            vec![quiz],
            vec![],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::MalformedQuestion {
                quiz_id: "q1".into(),
                question_id: "qq3".into(),
                correct: 2,
            }
        );
    }

    #[test]
    fn rejects_question_without_correct_option() {
        let mut q = question("x", "none", &["a", "b"]);
        q.options.iter_mut().for_each(|o| o.is_correct = false);
        assert!(matches!(
            q.check_well_formed("quiz"),
            Err(EngineError::MalformedQuestion { correct: 0, .. })
        ));
    }

    #[test]
    fn rejects_dangling_and_duplicate_references() {
        let orphan = Catalog::new(
            "x",
            "x",
            vec![],
            vec![lesson("l1", "ghost", LessonKind::Video)],
            vec![],
            vec![],
        );
        assert!(matches!(orphan, Err(EngineError::NotFound { kind: EntityKind::Course, .. })));

        let dupes = Catalog::new(
            "x",
            "x",
            vec![
                course("1", "A", CourseStatus::Draft, AccessMode::Open),
                course("1", "B", CourseStatus::Draft, AccessMode::Open),
            ],
            vec![],
            vec![],
            vec![],
        );
        assert!(matches!(dupes, Err(EngineError::DuplicateId { .. })));
    }

    #[test]
    fn average_rating_of_reviews() {
        let catalog = catalog();
        assert_eq!(catalog.average_rating("1").unwrap(), Some(4.5));
        assert_eq!(catalog.average_rating("2").unwrap(), None);
    }
}
