//! Engine configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::badges::BadgeTable;
use crate::profile::LearnerDirectory;
use crate::quiz::{RewardPolicy, RewardTable};

/// Top-level LearnSphere configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Badge tiers; the standard six when omitted.
    #[serde(default)]
    pub badges: BadgeTable,
    /// Reward table for quizzes that do not list their own.
    #[serde(default = "default_rewards")]
    pub default_rewards: RewardTable,
    /// Fraction of correct answers needed to earn points. Unset means every
    /// attempt earns its attempt reward.
    #[serde(default)]
    pub pass_threshold: Option<f64>,
    /// Catalog file or directory.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_rewards() -> RewardTable {
    RewardTable::standard()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./learnsphere-reports")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            badges: BadgeTable::standard(),
            default_rewards: default_rewards(),
            pass_threshold: None,
            catalog: None,
            output_dir: default_output_dir(),
        }
    }
}

impl EngineConfig {
    pub fn reward_policy(&self) -> RewardPolicy {
        match self.pass_threshold {
            Some(fraction) => RewardPolicy::MinimumScore { fraction },
            None => RewardPolicy::AttemptIndexed,
        }
    }

    /// An empty learner directory using this configuration's badges and policy.
    pub fn learner_directory(&self) -> LearnerDirectory {
        LearnerDirectory::new(self.badges.clone(), self.reward_policy())
    }

    fn validate(&self) -> Result<()> {
        if let Some(t) = self.pass_threshold {
            anyhow::ensure!(
                (0.0..=1.0).contains(&t),
                "pass_threshold must be between 0.0 and 1.0, got {t}"
            );
        }
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `learnsphere.toml` in the current directory
/// 2. `~/.config/learnsphere/config.toml`
///
/// Environment variable overrides: `LEARNSPHERE_CATALOG`, `LEARNSPHERE_PASS_THRESHOLD`.
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("learnsphere.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<EngineConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => EngineConfig::default(),
    };

    if let Ok(catalog) = std::env::var("LEARNSPHERE_CATALOG") {
        config.catalog = Some(PathBuf::from(catalog));
    }
    if let Ok(threshold) = std::env::var("LEARNSPHERE_PASS_THRESHOLD") {
        let fraction = threshold
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid LEARNSPHERE_PASS_THRESHOLD: '{threshold}'"))?;
        config.pass_threshold = Some(fraction);
    }

    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("learnsphere"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.badges.tiers().len(), 6);
        assert_eq!(config.default_rewards.points_for_attempt(9).unwrap(), 5);
        assert_eq!(config.reward_policy(), RewardPolicy::AttemptIndexed);
    }

    #[test]
    fn parse_custom_config() {
        let toml_str = r#"
pass_threshold = 0.6
output_dir = "out"

[[badges]]
name = "Bronze"
threshold = 100

[[badges]]
name = "Starter"
threshold = 0

[[default_rewards]]
attempt = 1
points = 50

[[default_rewards]]
attempt = 2
points = 25
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.badges.tiers()[0].name, "Starter");
        assert_eq!(config.default_rewards.points_for_attempt(3).unwrap(), 25);
        assert_eq!(
            config.reward_policy(),
            RewardPolicy::MinimumScore { fraction: 0.6 }
        );
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn rejects_rising_reward_table() {
        let toml_str = r#"
[[default_rewards]]
attempt = 1
points = 5

[[default_rewards]]
attempt = 2
points = 10
"#;
        assert!(toml::from_str::<EngineConfig>(toml_str).is_err());
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnsphere.toml");
        std::fs::write(&path, "pass_threshold = 1.5\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("pass_threshold"));

        std::fs::write(&path, "catalog = \"catalogs/web.toml\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert!(config.catalog.is_some());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config_from(Some(Path::new("/nonexistent/learnsphere.toml")));
        assert!(result.is_err());
    }
}
