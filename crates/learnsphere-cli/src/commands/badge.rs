//! The `learnsphere badge` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn execute(points: u64, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    let badges = &config.badges;

    let current = badges.current_badge(points);
    println!("Points: {points}");
    println!("Badge: {} {}", current.icon, current.name);
    match (badges.next_badge(points), badges.points_to_next(points)) {
        (Some(next), Some(missing)) => {
            println!("Next: {} {} ({missing} points to go)", next.icon, next.name)
        }
        _ => println!("Next: none, top tier reached"),
    }

    let mut table = Table::new();
    table.set_header(vec!["Badge", "Threshold", "Reached"]);
    for badge in badges.tiers() {
        table.add_row(vec![
            Cell::new(format!("{} {}", badge.icon, badge.name)),
            Cell::new(badge.threshold),
            Cell::new(if points >= badge.threshold { "yes" } else { "" }),
        ]);
    }
    println!("\n{table}");

    Ok(())
}
