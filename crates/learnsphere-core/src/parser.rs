//! TOML catalog and enrollment parser.
//!
//! Loads catalogs from TOML files and directories, validates them, and reads
//! enrollment facts for reporting.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::model::{
    AccessMode, AnswerOption, Catalog, Course, CourseStatus, Lesson, LessonKind, Question, Quiz,
    Review, Visibility,
};
use crate::progress::ProgressRecord;
use crate::quiz::{RewardTable, RewardTier};
use crate::reporting::{Enrollment, EnrollmentFacts, TimeSpent};

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    courses: Vec<TomlCourse>,
    #[serde(default)]
    lessons: Vec<TomlLesson>,
    #[serde(default)]
    quizzes: Vec<TomlQuiz>,
    #[serde(default)]
    reviews: Vec<TomlReview>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlCourse {
    id: String,
    title: String,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    instructor: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default = "default_access")]
    access: String,
    #[serde(default = "default_visibility")]
    visibility: String,
}

fn default_status() -> String {
    "draft".to_string()
}

fn default_access() -> String {
    "open".to_string()
}

fn default_visibility() -> String {
    "everyone".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlLesson {
    id: String,
    course_id: String,
    title: String,
    kind: String,
    #[serde(default)]
    duration_minutes: u32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    quiz_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuiz {
    id: String,
    course_id: String,
    title: String,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    rewards: Vec<TomlReward>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    id: String,
    text: String,
    #[serde(default)]
    is_correct: bool,
}

#[derive(Debug, Deserialize)]
struct TomlReward {
    attempt: u32,
    points: u32,
}

#[derive(Debug, Deserialize)]
struct TomlReview {
    id: String,
    course_id: String,
    reviewer: String,
    rating: u8,
    #[serde(default)]
    text: String,
    date: NaiveDate,
}

fn parse_enum<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(|e: String| anyhow::anyhow!("{}", e))
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path, default_rewards: &RewardTable) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path, default_rewards)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
///
/// Quizzes without a `rewards` list get `default_rewards`.
pub fn parse_catalog_str(
    content: &str,
    source_path: &Path,
    default_rewards: &RewardTable,
) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let courses = parsed
        .courses
        .into_iter()
        .map(|c| {
            Ok(Course {
                status: parse_enum::<CourseStatus>(&c.status)
                    .with_context(|| format!("course '{}'", c.id))?,
                access: parse_enum::<AccessMode>(&c.access)
                    .with_context(|| format!("course '{}'", c.id))?,
                visibility: parse_enum::<Visibility>(&c.visibility)
                    .with_context(|| format!("course '{}'", c.id))?,
                id: c.id,
                title: c.title,
                short_description: c.short_description,
                category: c.category,
                instructor: c.instructor,
                tags: c.tags,
                price: c.price,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let lessons = parsed
        .lessons
        .into_iter()
        .map(|l| {
            Ok(Lesson {
                kind: parse_enum::<LessonKind>(&l.kind)
                    .with_context(|| format!("lesson '{}'", l.id))?,
                id: l.id,
                course_id: l.course_id,
                title: l.title,
                duration_minutes: l.duration_minutes,
                description: l.description,
                quiz_id: l.quiz_id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let quizzes = parsed
        .quizzes
        .into_iter()
        .map(|q| {
            let rewards = if q.rewards.is_empty() {
                default_rewards.clone()
            } else {
                RewardTable::new(
                    q.rewards
                        .into_iter()
                        .map(|r| RewardTier {
                            attempt: r.attempt,
                            points: r.points,
                        })
                        .collect(),
                )
                .with_context(|| format!("quiz '{}'", q.id))?
            };

            let questions = q
                .questions
                .into_iter()
                .map(|question| Question {
                    id: question.id,
                    text: question.text,
                    options: question
                        .options
                        .into_iter()
                        .map(|o| AnswerOption {
                            id: o.id,
                            text: o.text,
                            is_correct: o.is_correct,
                        })
                        .collect(),
                })
                .collect();

            Ok(Quiz {
                id: q.id,
                course_id: q.course_id,
                title: q.title,
                questions,
                rewards,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let reviews = parsed
        .reviews
        .into_iter()
        .map(|r| Review {
            id: r.id,
            course_id: r.course_id,
            reviewer: r.reviewer,
            rating: r.rating,
            text: r.text,
            date: r.date,
        })
        .collect();

    let catalog = Catalog::new(
        parsed.catalog.id,
        parsed.catalog.name,
        courses,
        lessons,
        quizzes,
        reviews,
    )
    .with_context(|| format!("invalid catalog: {}", source_path.display()))?;

    Ok(catalog)
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path, default_rewards: &RewardTable) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path, default_rewards)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path, default_rewards) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The course, lesson, quiz or review the warning is about.
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a catalog for issues that do not break the engine but are
/// probably authoring mistakes.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |subject: &str, message: String| ValidationWarning {
        subject: Some(subject.to_string()),
        message,
    };

    for course in catalog.courses() {
        let lessons = catalog.lessons_for(&course.id).unwrap_or_default();
        if lessons.is_empty() && course.status == CourseStatus::Published {
            warnings.push(warn(&course.id, "published course has no lessons".into()));
        }
        if course.access == AccessMode::Payment && course.price.is_none() {
            warnings.push(warn(&course.id, "payment course has no price".into()));
        }

        for lesson in &lessons {
            match (lesson.kind, &lesson.quiz_id) {
                (LessonKind::Quiz, None) => {
                    warnings.push(warn(&lesson.id, "quiz lesson does not name a quiz".into()))
                }
                (kind, Some(quiz_id)) if kind != LessonKind::Quiz => warnings.push(warn(
                    &lesson.id,
                    format!("{kind} lesson names quiz '{quiz_id}'"),
                )),
                _ => {}
            }
        }

        let presented: HashSet<&str> =
            lessons.iter().filter_map(|l| l.quiz_id.as_deref()).collect();
        for quiz in catalog.quizzes_for(&course.id).unwrap_or_default() {
            if !presented.contains(quiz.id.as_str()) {
                warnings.push(warn(
                    &quiz.id,
                    format!("quiz is not presented by any lesson of course '{}'", course.id),
                ));
            }
        }

        if let Ok(reviews) = catalog.reviews_for(&course.id) {
            for review in reviews {
                if !(1..=5).contains(&review.rating) {
                    warnings.push(warn(
                        &review.id,
                        format!("rating {} is outside 1-5", review.rating),
                    ));
                }
            }
        }
    }

    for quiz in catalog.quizzes() {
        if quiz.questions.is_empty() {
            warnings.push(warn(&quiz.id, "quiz has no questions".into()));
        }
    }

    warnings
}

#[derive(Debug, Deserialize)]
struct TomlEnrollmentFile {
    #[serde(default)]
    enrollments: Vec<TomlEnrollment>,
}

#[derive(Debug, Deserialize)]
struct TomlEnrollment {
    learner_id: String,
    participant: String,
    course_id: String,
    enrolled_on: NaiveDate,
    #[serde(default)]
    started_on: Option<NaiveDate>,
    #[serde(default)]
    completed_on: Option<NaiveDate>,
    #[serde(default = "default_time_spent")]
    time_spent: String,
    #[serde(default)]
    completed_lessons: Vec<String>,
}

fn default_time_spent() -> String {
    "0h".to_string()
}

/// Parse an enrollment facts file.
pub fn parse_enrollments(path: &Path) -> Result<Vec<EnrollmentFacts>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read enrollments file: {}", path.display()))?;
    parse_enrollments_str(&content, path)
}

/// Parse enrollment facts from a TOML string.
pub fn parse_enrollments_str(content: &str, source_path: &Path) -> Result<Vec<EnrollmentFacts>> {
    let parsed: TomlEnrollmentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    parsed
        .enrollments
        .into_iter()
        .map(|e| {
            let time_spent: TimeSpent = parse_enum(&e.time_spent)
                .with_context(|| format!("enrollment of '{}' in '{}'", e.learner_id, e.course_id))?;
            Ok(EnrollmentFacts {
                progress: ProgressRecord {
                    learner_id: e.learner_id.clone(),
                    course_id: e.course_id.clone(),
                    completed: e.completed_lessons.into_iter().collect::<BTreeSet<_>>(),
                },
                enrollment: Enrollment {
                    learner_id: e.learner_id,
                    participant: e.participant,
                    course_id: e.course_id,
                    enrolled_on: e.enrolled_on,
                    started_on: e.started_on,
                    completed_on: e.completed_on,
                },
                time_spent,
            })
        })
        .collect()
}
