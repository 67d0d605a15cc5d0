//! Quiz scoring and attempt-decay rewards.
//!
//! Scoring counts correct single-choice answers. Rewards are indexed by
//! attempt number, not by score: the first attempt pays the most and later
//! attempts pay the same or less, with the last table entry acting as a floor.
//! Callers that want to gate rewards on a passing score choose a
//! [`RewardPolicy`] other than the default.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EntityKind, Result};
use crate::model::Quiz;

/// Points paid for completing a quiz on a given attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTier {
    pub attempt: u32,
    pub points: u32,
}

/// Attempt number → points, validated on construction.
///
/// Entries start at attempt 1, are contiguous, and never pay more for a
/// later attempt than for an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RewardTier>", into = "Vec<RewardTier>")]
pub struct RewardTable {
    tiers: Vec<RewardTier>,
}

impl RewardTable {
    pub fn new(mut tiers: Vec<RewardTier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(EngineError::MalformedRewardTable(
                "at least one attempt must be listed".into(),
            ));
        }
        tiers.sort_by_key(|t| t.attempt);

        for (i, tier) in tiers.iter().enumerate() {
            let expected = i as u32 + 1;
            if tier.attempt != expected {
                return Err(EngineError::MalformedRewardTable(format!(
                    "expected attempt {expected}, found attempt {}",
                    tier.attempt
                )));
            }
        }
        if let Some(pair) = tiers.windows(2).find(|w| w[1].points > w[0].points) {
            return Err(EngineError::MalformedRewardTable(format!(
                "attempt {} pays {} points, more than attempt {} ({})",
                pair[1].attempt, pair[1].points, pair[0].attempt, pair[0].points
            )));
        }

        Ok(Self { tiers })
    }

    /// 20, 15, 10, then 5 points from the fourth attempt on.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                RewardTier { attempt: 1, points: 20 },
                RewardTier { attempt: 2, points: 15 },
                RewardTier { attempt: 3, points: 10 },
                RewardTier { attempt: 4, points: 5 },
            ],
        }
    }

    pub fn tiers(&self) -> &[RewardTier] {
        &self.tiers
    }

    /// Points for passing on `attempt`. Attempts past the last listed one
    /// reuse the last entry's points.
    pub fn points_for_attempt(&self, attempt: u32) -> Result<u32> {
        if attempt < 1 {
            return Err(EngineError::InvalidAttempt(attempt));
        }
        let idx = (attempt as usize - 1).min(self.tiers.len() - 1);
        Ok(self.tiers[idx].points)
    }
}

impl TryFrom<Vec<RewardTier>> for RewardTable {
    type Error = EngineError;

    fn try_from(tiers: Vec<RewardTier>) -> Result<Self> {
        RewardTable::new(tiers)
    }
}

impl From<RewardTable> for Vec<RewardTier> {
    fn from(table: RewardTable) -> Self {
        table.tiers
    }
}

/// Whether a scored attempt earns its attempt reward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardPolicy {
    /// Every attempt earns the attempt-indexed reward regardless of score.
    #[default]
    AttemptIndexed,
    /// Only attempts with at least `fraction` of answers correct earn points.
    MinimumScore { fraction: f64 },
}

impl RewardPolicy {
    pub fn earns_reward(&self, score: u32, total_questions: u32) -> bool {
        match self {
            RewardPolicy::AttemptIndexed => true,
            RewardPolicy::MinimumScore { fraction } => {
                if total_questions == 0 {
                    return true;
                }
                f64::from(score) / f64::from(total_questions) >= *fraction
            }
        }
    }
}

/// Question id → selected option id. At most one selection per question.
pub type Selections = HashMap<String, String>;

/// How one question was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question_id: String,
    /// `None` when the learner skipped the question.
    pub selected: Option<String>,
    pub correct: bool,
}

/// Result of scoring one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub quiz_id: String,
    pub attempt: u32,
    /// Number of correct answers.
    pub score: u32,
    pub total_questions: u32,
    pub points_awarded: u32,
    /// Per-question results in quiz order.
    pub answers: Vec<AnswerResult>,
}

impl QuizOutcome {
    pub fn is_perfect(&self) -> bool {
        self.score == self.total_questions
    }
}

/// Score an attempt with the default attempt-indexed reward policy.
pub fn score(quiz: &Quiz, selections: &Selections, attempt: u32) -> Result<QuizOutcome> {
    score_with_policy(quiz, selections, attempt, RewardPolicy::AttemptIndexed)
}

/// Score an attempt, awarding the attempt reward only if `policy` allows it.
///
/// The whole attempt is rejected if any selection names a question outside
/// the quiz or an option outside its question.
pub fn score_with_policy(
    quiz: &Quiz,
    selections: &Selections,
    attempt: u32,
    policy: RewardPolicy,
) -> Result<QuizOutcome> {
    let reward = quiz.rewards.points_for_attempt(attempt)?;

    for (question_id, option_id) in selections {
        let question = quiz.question(question_id).ok_or_else(|| {
            EngineError::invalid_reference(
                EntityKind::Question,
                question_id.as_str(),
                format!("quiz '{}'", quiz.id),
            )
        })?;
        if question.option(option_id).is_none() {
            return Err(EngineError::invalid_reference(
                EntityKind::AnswerOption,
                option_id.as_str(),
                format!("question '{question_id}'"),
            ));
        }
    }

    let answers: Vec<AnswerResult> = quiz
        .questions
        .iter()
        .map(|question| {
            let selected = selections.get(&question.id).cloned();
            let correct = selected
                .as_deref()
                .and_then(|id| question.option(id))
                .is_some_and(|o| o.is_correct);
            AnswerResult {
                question_id: question.id.clone(),
                selected,
                correct,
            }
        })
        .collect();

    let score = answers.iter().filter(|a| a.correct).count() as u32;
    let total_questions = quiz.questions.len() as u32;
    let points_awarded = if policy.earns_reward(score, total_questions) {
        reward
    } else {
        0
    };

    tracing::debug!(
        quiz = %quiz.id,
        attempt,
        score,
        total_questions,
        points_awarded,
        "scored quiz attempt"
    );

    Ok(QuizOutcome {
        quiz_id: quiz.id.clone(),
        attempt,
        score,
        total_questions,
        points_awarded,
        answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{html_quiz, standard_rewards};

    fn select(pairs: &[(&str, &str)]) -> Selections {
        pairs
            .iter()
            .map(|(q, o)| ((*q).to_string(), (*o).to_string()))
            .collect()
    }

    #[test]
    fn points_follow_attempt_decay() {
        let table = standard_rewards();
        assert_eq!(table.points_for_attempt(1).unwrap(), 20);
        assert_eq!(table.points_for_attempt(2).unwrap(), 15);
        assert_eq!(table.points_for_attempt(4).unwrap(), 5);
    }

    #[test]
    fn points_floor_at_last_entry() {
        let table = standard_rewards();
        assert_eq!(table.points_for_attempt(10).unwrap(), 5);
        assert_eq!(table.points_for_attempt(u32::MAX).unwrap(), 5);
    }

    #[test]
    fn attempt_zero_is_invalid() {
        assert_eq!(
            standard_rewards().points_for_attempt(0),
            Err(EngineError::InvalidAttempt(0))
        );
    }

    #[test]
    fn table_sorts_unordered_input() {
        let table = RewardTable::new(vec![
            RewardTier { attempt: 2, points: 5 },
            RewardTier { attempt: 1, points: 10 },
        ])
        .unwrap();
        assert_eq!(table.points_for_attempt(1).unwrap(), 10);
    }

    #[test]
    fn malformed_tables_are_rejected() {
        assert!(RewardTable::new(vec![]).is_err());
        let gap = RewardTable::new(vec![
            RewardTier { attempt: 1, points: 20 },
            RewardTier { attempt: 3, points: 10 },
        ]);
        assert!(matches!(gap, Err(EngineError::MalformedRewardTable(_))));
        let rising = RewardTable::new(vec![
            RewardTier { attempt: 1, points: 10 },
            RewardTier { attempt: 2, points: 15 },
        ]);
        assert!(matches!(rising, Err(EngineError::MalformedRewardTable(_))));
    }

    #[test]
    fn table_deserializes_through_validation() {
        let ok: RewardTable =
            serde_json::from_str(r#"[{"attempt":1,"points":20},{"attempt":2,"points":15}]"#)
                .unwrap();
        assert_eq!(ok.tiers().len(), 2);
        let bad = serde_json::from_str::<RewardTable>(r#"[{"attempt":2,"points":20}]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn scores_three_of_five() {
        let quiz = html_quiz();
        let selections = select(&[
            ("qq1", "o1"),
            ("qq2", "o7"),
            ("qq3", "o9"),
            ("qq4", "o15"),
            ("qq5", "o18"),
        ]);
        let outcome = score(&quiz, &selections, 1).unwrap();
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.total_questions, 5);
        assert_eq!(outcome.points_awarded, 20);
        assert!(!outcome.answers[2].correct);
        assert!(outcome.answers[4].correct);
    }

    #[test]
    fn missing_selection_counts_as_incorrect() {
        let quiz = html_quiz();
        let outcome = score(&quiz, &select(&[("qq1", "o1")]), 2).unwrap();
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.answers[1].selected, None);
        assert_eq!(outcome.points_awarded, 15);
    }

    #[test]
    fn reward_is_independent_of_score_by_default() {
        let quiz = html_quiz();
        let outcome = score(&quiz, &Selections::new(), 1).unwrap();
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.points_awarded, 20);
    }

    #[test]
    fn minimum_score_policy_withholds_points() {
        let quiz = html_quiz();
        let policy = RewardPolicy::MinimumScore { fraction: 0.6 };
        let low = score_with_policy(&quiz, &select(&[("qq1", "o1")]), 1, policy).unwrap();
        assert_eq!(low.points_awarded, 0);
        let high = score_with_policy(
            &quiz,
            &select(&[("qq1", "o1"), ("qq2", "o7"), ("qq3", "o11")]),
            1,
            policy,
        )
        .unwrap();
        assert_eq!(high.points_awarded, 20);
    }

    #[test]
    fn foreign_selection_rejects_attempt() {
        let quiz = html_quiz();
        let unknown_question = score(&quiz, &select(&[("qq9", "o1")]), 1);
        assert!(matches!(
            unknown_question,
            Err(EngineError::InvalidReference { kind: EntityKind::Question, .. })
        ));
        let wrong_option = score(&quiz, &select(&[("qq1", "o7")]), 1);
        assert!(matches!(
            wrong_option,
            Err(EngineError::InvalidReference { kind: EntityKind::AnswerOption, .. })
        ));
    }

    #[test]
    fn invalid_attempt_checked_before_selections() {
        let quiz = html_quiz();
        assert_eq!(
            score(&quiz, &select(&[("qq9", "o1")]), 0),
            Err(EngineError::InvalidAttempt(0))
        );
    }
}
