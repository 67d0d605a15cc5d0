//! Domain error types.
//!
//! Every engine operation either applies its state change completely or
//! returns one of these errors without touching state. None of them are
//! transient, so callers should not retry.

use std::fmt;

use thiserror::Error;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Course,
    Lesson,
    LessonPosition,
    Quiz,
    Question,
    AnswerOption,
    Review,
    Learner,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Course => write!(f, "course"),
            EntityKind::Lesson => write!(f, "lesson"),
            EntityKind::LessonPosition => write!(f, "lesson position"),
            EntityKind::Quiz => write!(f, "quiz"),
            EntityKind::Question => write!(f, "question"),
            EntityKind::AnswerOption => write!(f, "option"),
            EntityKind::Review => write!(f, "review"),
            EntityKind::Learner => write!(f, "learner"),
        }
    }
}

/// Errors raised by the progress, scoring, badge and reporting engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A lookup by identifier found nothing.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// An operation targeted an id that does not belong to its owner.
    #[error("invalid reference: {kind} '{id}' does not belong to {owner}")]
    InvalidReference {
        kind: EntityKind,
        id: String,
        owner: String,
    },

    /// Attempt numbers start at 1.
    #[error("invalid attempt number {0}: attempts start at 1")]
    InvalidAttempt(u32),

    /// A question without exactly one correct option.
    #[error(
        "malformed question '{question_id}' in quiz '{quiz_id}': expected exactly one correct option, found {correct}"
    )]
    MalformedQuestion {
        quiz_id: String,
        question_id: String,
        correct: usize,
    },

    /// A reward table that is empty, has gaps, or pays more for later attempts.
    #[error("malformed reward table: {0}")]
    MalformedRewardTable(String),

    /// Badge lookups need at least one tier.
    #[error("badge table is empty")]
    EmptyBadgeTable,

    /// Two catalog entries of the same kind share an id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: EntityKind, id: String },
}

impl EngineError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn invalid_reference(
        kind: EntityKind,
        id: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        EngineError::InvalidReference {
            kind,
            id: id.into(),
            owner: owner.into(),
        }
    }

    /// Returns `true` if the error points at bad reference data rather than
    /// a bad request from the caller.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            EngineError::MalformedQuestion { .. }
                | EngineError::MalformedRewardTable(_)
                | EngineError::EmptyBadgeTable
                | EngineError::DuplicateId { .. }
        )
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = EngineError::invalid_reference(EntityKind::Lesson, "l99", "course '1'");
        assert_eq!(
            err.to_string(),
            "invalid reference: lesson 'l99' does not belong to course '1'"
        );
        assert_eq!(
            EngineError::not_found(EntityKind::Quiz, "q7").to_string(),
            "quiz not found: q7"
        );
    }

    #[test]
    fn integrity_classification() {
        assert!(EngineError::EmptyBadgeTable.is_data_integrity());
        assert!(!EngineError::InvalidAttempt(0).is_data_integrity());
    }
}
