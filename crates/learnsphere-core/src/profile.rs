//! Learner profiles, point awards and attempt counters.
//!
//! The [`LearnerDirectory`] maps learner ids to their point totals and
//! per-quiz attempt counters. Each learner sits behind their own mutex, so
//! two sessions finishing an attempt for the same learner serialize while
//! different learners never contend. Badges are never stored: they are
//! derived from the point total on every read.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::badges::{Badge, BadgeTable};
use crate::error::{EngineError, EntityKind, Result};
use crate::model::{Catalog, Quiz};
use crate::progress::{ProgressRecord, ProgressTracker};
use crate::quiz::{score_with_policy, QuizOutcome, RewardPolicy, Selections};

/// A learner's gamification state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub learner_id: String,
    pub name: String,
    /// Cumulative points. Only ever increased, by quiz rewards.
    pub total_points: u64,
}

impl LearnerProfile {
    pub fn badge<'t>(&self, table: &'t BadgeTable) -> &'t Badge {
        table.current_badge(self.total_points)
    }

    pub fn next_badge<'t>(&self, table: &'t BadgeTable) -> Option<&'t Badge> {
        table.next_badge(self.total_points)
    }
}

/// Persistable snapshot of a learner: profile plus attempts per quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerSnapshot {
    pub profile: LearnerProfile,
    #[serde(default)]
    pub attempts: BTreeMap<String, u32>,
}

/// Counts of a learner's courses by progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTally {
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
}

/// Classify a learner's progress records. Every record is validated against
/// the catalog first.
pub fn course_tally(catalog: &Catalog, records: &[ProgressRecord]) -> Result<CourseTally> {
    let mut tally = CourseTally::default();
    for record in records {
        let tracker = ProgressTracker::resume(catalog, record)?;
        match tracker.percent_complete() {
            100 => tally.completed += 1,
            0 => tally.not_started += 1,
            _ => tally.in_progress += 1,
        }
    }
    Ok(tally)
}

/// A reward that was applied to a learner's total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAward {
    pub learner_id: String,
    pub quiz_id: String,
    pub attempt: u32,
    pub points: u32,
    /// Total after the award.
    pub total_points: u64,
}

/// Observer for point awards and badge unlocks.
pub trait AwardListener: Send + Sync {
    fn on_points_awarded(&self, award: &PointAward);
    fn on_badge_earned(&self, learner_id: &str, badge: &Badge);
}

/// Listener that ignores every event.
pub struct NoopListener;

impl AwardListener for NoopListener {
    fn on_points_awarded(&self, _: &PointAward) {}
    fn on_badge_earned(&self, _: &str, _: &Badge) {}
}

/// Everything that happened in one submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptReceipt {
    pub learner_id: String,
    pub outcome: QuizOutcome,
    pub points_before: u64,
    pub points_after: u64,
    pub badge_before: Badge,
    pub badge_after: Badge,
    /// Tiers crossed by this award, lowest first.
    pub badges_earned: Vec<Badge>,
}

#[derive(Debug)]
struct LearnerState {
    profile: LearnerProfile,
    attempts: HashMap<String, u32>,
}

/// All learners known to the engine.
pub struct LearnerDirectory {
    learners: RwLock<HashMap<String, Arc<Mutex<LearnerState>>>>,
    badges: BadgeTable,
    policy: RewardPolicy,
}

impl LearnerDirectory {
    pub fn new(badges: BadgeTable, policy: RewardPolicy) -> Self {
        Self {
            learners: RwLock::new(HashMap::new()),
            badges,
            policy,
        }
    }

    pub fn badges(&self) -> &BadgeTable {
        &self.badges
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    /// Add a learner with zero points.
    pub fn register(&self, learner_id: &str, name: &str) -> Result<LearnerProfile> {
        let profile = LearnerProfile {
            learner_id: learner_id.to_string(),
            name: name.to_string(),
            total_points: 0,
        };
        self.insert(LearnerSnapshot {
            profile: profile.clone(),
            attempts: BTreeMap::new(),
        })?;
        Ok(profile)
    }

    /// Load a learner from a stored snapshot.
    pub fn restore(&self, snapshot: LearnerSnapshot) -> Result<()> {
        self.insert(snapshot)
    }

    fn insert(&self, snapshot: LearnerSnapshot) -> Result<()> {
        let mut learners = self.learners.write().unwrap_or_else(PoisonError::into_inner);
        let id = snapshot.profile.learner_id.clone();
        if learners.contains_key(&id) {
            return Err(EngineError::DuplicateId {
                kind: EntityKind::Learner,
                id,
            });
        }
        tracing::debug!(learner = %id, points = snapshot.profile.total_points, "learner added");
        learners.insert(
            id,
            Arc::new(Mutex::new(LearnerState {
                profile: snapshot.profile,
                attempts: snapshot.attempts.into_iter().collect(),
            })),
        );
        Ok(())
    }

    fn learner(&self, learner_id: &str) -> Result<Arc<Mutex<LearnerState>>> {
        let learners = self.learners.read().unwrap_or_else(PoisonError::into_inner);
        learners
            .get(learner_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Learner, learner_id))
    }

    pub fn profile(&self, learner_id: &str) -> Result<LearnerProfile> {
        let learner = self.learner(learner_id)?;
        let state = learner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.profile.clone())
    }

    pub fn snapshot(&self, learner_id: &str) -> Result<LearnerSnapshot> {
        let learner = self.learner(learner_id)?;
        let state = learner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(LearnerSnapshot {
            profile: state.profile.clone(),
            attempts: state
                .attempts
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        })
    }

    pub fn current_badge(&self, learner_id: &str) -> Result<Badge> {
        let profile = self.profile(learner_id)?;
        Ok(profile.badge(&self.badges).clone())
    }

    pub fn next_badge(&self, learner_id: &str) -> Result<Option<Badge>> {
        let profile = self.profile(learner_id)?;
        Ok(profile.next_badge(&self.badges).cloned())
    }

    /// Attempts the learner has submitted for a quiz so far.
    pub fn attempts(&self, learner_id: &str, quiz_id: &str) -> Result<u32> {
        let learner = self.learner(learner_id)?;
        let state = learner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.attempts.get(quiz_id).copied().unwrap_or(0))
    }

    /// Score the learner's next attempt at `quiz` and apply its reward.
    ///
    /// Runs under the learner's lock: the attempt number, the score and the
    /// point update form one step. A rejected attempt changes nothing and
    /// does not consume an attempt number.
    pub fn submit_attempt(
        &self,
        learner_id: &str,
        quiz: &Quiz,
        selections: &Selections,
        listener: &dyn AwardListener,
    ) -> Result<AttemptReceipt> {
        let learner = self.learner(learner_id)?;
        let mut state = learner.lock().unwrap_or_else(PoisonError::into_inner);

        let attempt = state.attempts.get(&quiz.id).copied().unwrap_or(0) + 1;
        let outcome = score_with_policy(quiz, selections, attempt, self.policy)?;

        let points_before = state.profile.total_points;
        let points_after = points_before.saturating_add(u64::from(outcome.points_awarded));
        state.attempts.insert(quiz.id.clone(), attempt);
        state.profile.total_points = points_after;

        let badges_earned = self.badges.badges_between(points_before, points_after).to_vec();
        let receipt = AttemptReceipt {
            learner_id: learner_id.to_string(),
            badge_before: self.badges.current_badge(points_before).clone(),
            badge_after: self.badges.current_badge(points_after).clone(),
            outcome,
            points_before,
            points_after,
            badges_earned,
        };

        if receipt.outcome.points_awarded > 0 {
            tracing::info!(
                learner = learner_id,
                quiz = %quiz.id,
                attempt,
                points = receipt.outcome.points_awarded,
                total = points_after,
                "points awarded"
            );
            listener.on_points_awarded(&PointAward {
                learner_id: learner_id.to_string(),
                quiz_id: quiz.id.clone(),
                attempt,
                points: receipt.outcome.points_awarded,
                total_points: points_after,
            });
        }
        for badge in &receipt.badges_earned {
            tracing::info!(learner = learner_id, badge = %badge.name, "badge earned");
            listener.on_badge_earned(learner_id, badge);
        }

        Ok(receipt)
    }
}

impl Default for LearnerDirectory {
    fn default() -> Self {
        Self::new(BadgeTable::standard(), RewardPolicy::AttemptIndexed)
    }
}
