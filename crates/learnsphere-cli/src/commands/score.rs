//! The `learnsphere score` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use learnsphere_core::badges::Badge;
use learnsphere_core::profile::{AwardListener, LearnerProfile, LearnerSnapshot, PointAward};
use learnsphere_core::quiz::Selections;

const LEARNER_ID: &str = "cli";

/// Console listener for awards.
struct ConsoleListener;

impl AwardListener for ConsoleListener {
    fn on_points_awarded(&self, award: &PointAward) {
        eprintln!(
            "  +{} points for {} (attempt {}), total {}",
            award.points, award.quiz_id, award.attempt, award.total_points
        );
    }

    fn on_badge_earned(&self, _learner_id: &str, badge: &Badge) {
        eprintln!("  Badge unlocked: {} {}", badge.icon, badge.name);
    }
}

fn parse_answers(answers: &str) -> Result<Selections> {
    super::split_list(answers)
        .into_iter()
        .map(|pair| {
            let (question, option) = pair
                .split_once('=')
                .with_context(|| format!("invalid answer '{pair}', expected question=option"))?;
            Ok((question.trim().to_string(), option.trim().to_string()))
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    catalog_path: Option<PathBuf>,
    quiz_id: String,
    answers: String,
    attempt: u32,
    points: u64,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(attempt >= 1, "attempt must be at least 1");

    let config = super::load_config(config_path.as_deref())?;
    let catalog = super::load_catalog(catalog_path, &config)?;
    let quiz = catalog.quiz(&quiz_id)?;
    let selections = parse_answers(&answers)?;

    let directory = config.learner_directory();
    directory.restore(LearnerSnapshot {
        profile: LearnerProfile {
            learner_id: LEARNER_ID.to_string(),
            name: "Command line".to_string(),
            total_points: points,
        },
        attempts: BTreeMap::from([(quiz.id.clone(), attempt - 1)]),
    })?;

    let receipt = directory.submit_attempt(LEARNER_ID, quiz, &selections, &ConsoleListener)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&receipt)?),
        _ => {
            let outcome = &receipt.outcome;
            println!("Quiz: {} (attempt {})", quiz.title, outcome.attempt);
            for answer in &outcome.answers {
                let mark = if answer.correct { "correct" } else { "wrong" };
                let selected = answer.selected.as_deref().unwrap_or("-");
                println!("  {}: {} ({mark})", answer.question_id, selected);
            }
            println!("Score: {}/{}", outcome.score, outcome.total_questions);
            println!("Points awarded: {}", outcome.points_awarded);
            println!(
                "Total points: {} -> {}",
                receipt.points_before, receipt.points_after
            );
            println!("Badge: {}", receipt.badge_after.name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_pairs() {
        let selections = parse_answers("qq1=o1, qq2 = o7,").unwrap();
        assert_eq!(selections.len(), 2);
        assert_eq!(selections["qq2"], "o7");
        assert!(parse_answers("").unwrap().is_empty());
        assert!(parse_answers("qq1").is_err());
    }
}
