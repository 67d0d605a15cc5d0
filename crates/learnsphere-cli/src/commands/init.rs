//! The `learnsphere init` command.

use std::path::Path;

use anyhow::Result;

const SAMPLE_CONFIG: &str = r#"# learnsphere configuration

catalog = "catalogs/sample.toml"
output_dir = "./learnsphere-reports"

# Uncomment to award quiz points only from 60% correct answers up.
# pass_threshold = 0.6

# Reward table for quizzes that do not list their own.
[[default_rewards]]
attempt = 1
points = 20

[[default_rewards]]
attempt = 2
points = 15

[[default_rewards]]
attempt = 3
points = 10

[[default_rewards]]
attempt = 4
points = 5
"#;

const SAMPLE_CATALOG: &str = include_str!("../../../../catalogs/sample.toml");
const SAMPLE_ENROLLMENTS: &str = include_str!("../../../../catalogs/enrollments.toml");

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_once(Path::new("learnsphere.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("catalogs")?;
    write_once(Path::new("catalogs/sample.toml"), SAMPLE_CATALOG)?;
    write_once(Path::new("catalogs/enrollments.toml"), SAMPLE_ENROLLMENTS)?;

    println!("\nNext steps:");
    println!("  1. Run: learnsphere validate --catalog catalogs/sample.toml");
    println!("  2. Run: learnsphere progress --course 1 --complete l1,l2");
    println!("  3. Run: learnsphere report --enrollments catalogs/enrollments.toml");

    Ok(())
}
