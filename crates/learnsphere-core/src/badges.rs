//! Badge tiers unlocked by cumulative points.
//!
//! The table is sorted once when it is built and every lookup is a binary
//! search over it. A learner always holds at least the entry-level badge.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A named achievement tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    /// Points needed to hold this badge.
    pub threshold: u64,
    #[serde(default)]
    pub icon: String,
}

impl Badge {
    pub fn new(name: impl Into<String>, threshold: u64, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            threshold,
            icon: icon.into(),
        }
    }
}

/// Badge tiers in ascending threshold order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Badge>", into = "Vec<Badge>")]
pub struct BadgeTable {
    tiers: Vec<Badge>,
}

impl BadgeTable {
    pub fn new(mut tiers: Vec<Badge>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(EngineError::EmptyBadgeTable);
        }
        tiers.sort_by_key(|b| b.threshold);
        Ok(Self { tiers })
    }

    /// The six tiers every learner progresses through by default.
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                Badge::new("Newbie", 20, "🌱"),
                Badge::new("Explorer", 40, "🧭"),
                Badge::new("Achiever", 60, "🏆"),
                Badge::new("Specialist", 80, "⭐"),
                Badge::new("Expert", 100, "💎"),
                Badge::new("Master", 120, "👑"),
            ],
        }
    }

    pub fn tiers(&self) -> &[Badge] {
        &self.tiers
    }

    /// Number of tiers whose threshold is at or below `points`.
    fn reached(&self, points: u64) -> usize {
        self.tiers.partition_point(|b| b.threshold <= points)
    }

    /// Highest tier reached, or the lowest tier when none is reached yet.
    pub fn current_badge(&self, points: u64) -> &Badge {
        match self.reached(points) {
            0 => &self.tiers[0],
            n => &self.tiers[n - 1],
        }
    }

    /// The next tier up, or `None` once the top tier is reached.
    pub fn next_badge(&self, points: u64) -> Option<&Badge> {
        self.tiers.get(self.reached(points))
    }

    pub fn points_to_next(&self, points: u64) -> Option<u64> {
        self.next_badge(points).map(|b| b.threshold - points)
    }

    /// Tiers newly reached when a total moves from `before` to `after`.
    ///
    /// The lowest tier is held from zero points, so it is never reported.
    pub fn badges_between(&self, before: u64, after: u64) -> &[Badge] {
        let lo = self.reached(before).max(1);
        let hi = self.reached(after).max(lo);
        &self.tiers[lo..hi]
    }
}

impl Default for BadgeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<Badge>> for BadgeTable {
    type Error = EngineError;

    fn try_from(tiers: Vec<Badge>) -> Result<Self> {
        BadgeTable::new(tiers)
    }
}

impl From<BadgeTable> for Vec<Badge> {
    fn from(table: BadgeTable) -> Self {
        table.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_badge_picks_highest_reached() {
        let table = BadgeTable::standard();
        assert_eq!(table.current_badge(65).name, "Achiever");
        assert_eq!(table.current_badge(60).name, "Achiever");
        assert_eq!(table.current_badge(500).name, "Master");
    }

    #[test]
    fn below_every_threshold_holds_entry_badge() {
        let table = BadgeTable::standard();
        assert_eq!(table.current_badge(0).name, "Newbie");
        assert_eq!(table.current_badge(19).name, "Newbie");
    }

    #[test]
    fn next_badge_is_lowest_unreached() {
        let table = BadgeTable::standard();
        assert_eq!(table.next_badge(65).unwrap().name, "Specialist");
        assert_eq!(table.next_badge(0).unwrap().name, "Newbie");
        assert_eq!(table.next_badge(119).unwrap().name, "Master");
        assert!(table.next_badge(120).is_none());
        assert_eq!(table.points_to_next(65), Some(15));
        assert_eq!(table.points_to_next(130), None);
    }

    #[test]
    fn unsorted_input_is_sorted_once() {
        let table = BadgeTable::new(vec![
            Badge::new("Gold", 300, ""),
            Badge::new("Bronze", 100, ""),
            Badge::new("Silver", 200, ""),
        ])
        .unwrap();
        let names: Vec<&str> = table.tiers().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Bronze", "Silver", "Gold"]);
        assert_eq!(table.current_badge(250).name, "Silver");
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(BadgeTable::new(vec![]), Err(EngineError::EmptyBadgeTable));
    }

    #[test]
    fn jump_over_several_tiers() {
        let table = BadgeTable::standard();
        let crossed: Vec<&str> = table
            .badges_between(35, 85)
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(crossed, vec!["Explorer", "Achiever", "Specialist"]);
        assert!(table.badges_between(65, 70).is_empty());
        assert!(table.badges_between(90, 10).is_empty());
    }

    #[test]
    fn entry_badge_is_never_newly_earned() {
        let table = BadgeTable::standard();
        assert!(table.badges_between(0, 20).is_empty());
        assert!(table.badges_between(0, 0).is_empty());
        let crossed: Vec<&str> = table
            .badges_between(0, 45)
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(crossed, vec!["Explorer"]);
    }
}
