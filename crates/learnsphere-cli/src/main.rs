//! The `learnsphere` command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "learnsphere",
    version,
    about = "Course progress, quiz scoring and badges for LearnSphere"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate catalog TOML files
    Validate {
        /// Path to a catalog file or directory
        #[arg(long)]
        catalog: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List courses on the admin board, or one learner's courses
    Courses {
        /// Catalog file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,

        /// Show this learner's courses instead of the board
        #[arg(long)]
        learner: Option<String>,

        /// Enrollment facts providing the learner's progress
        #[arg(long, requires = "learner")]
        enrollments: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay lesson progress through a course
    Progress {
        /// Catalog file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Course id
        #[arg(long)]
        course: String,

        /// Learner id
        #[arg(long, default_value = "learner")]
        learner: String,

        /// Lessons to mark complete (comma-separated ids)
        #[arg(long)]
        complete: Option<String>,

        /// Advance this many times from the resume point
        #[arg(long, default_value = "0")]
        advance: usize,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a quiz attempt and apply its reward
    Score {
        /// Catalog file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Quiz id
        #[arg(long)]
        quiz: String,

        /// Selections as question=option pairs (e.g. "qq1=o1,qq2=o7")
        #[arg(long, default_value = "")]
        answers: String,

        /// Attempt number being submitted
        #[arg(long, default_value = "1")]
        attempt: u32,

        /// Learner's points before this attempt
        #[arg(long, default_value = "0")]
        points: u64,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the badge for a point total
    Badge {
        /// Cumulative points
        #[arg(long)]
        points: u64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Build the reporting table from enrollment facts
    Report {
        /// Catalog file (defaults to the configured catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Enrollment facts TOML file
        #[arg(long)]
        enrollments: PathBuf,

        /// Keep rows with this status (yet_to_start, in_progress, completed)
        #[arg(long)]
        status: Option<String>,

        /// Keep rows of this course
        #[arg(long)]
        course: Option<String>,

        /// Search participant or course name
        #[arg(long)]
        search: Option<String>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Also save the report as JSON in this directory (the configured
        /// `output_dir` when no directory is given)
        #[arg(long, num_args = 0..=1)]
        output: Option<Option<PathBuf>>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and sample catalog
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("learnsphere=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { catalog, config } => commands::validate::execute(catalog, config),
        Commands::Courses {
            catalog,
            search,
            learner,
            enrollments,
            config,
        } => commands::courses::execute(catalog, search, learner, enrollments, config),
        Commands::Progress {
            catalog,
            course,
            learner,
            complete,
            advance,
            format,
            config,
        } => commands::progress::execute(catalog, course, learner, complete, advance, format, config),
        Commands::Score {
            catalog,
            quiz,
            answers,
            attempt,
            points,
            format,
            config,
        } => commands::score::execute(catalog, quiz, answers, attempt, points, format, config),
        Commands::Badge { points, config } => commands::badge::execute(points, config),
        Commands::Report {
            catalog,
            enrollments,
            status,
            course,
            search,
            format,
            output,
            config,
        } => commands::report::execute(
            catalog,
            enrollments,
            status,
            course,
            search,
            format,
            output,
            config,
        ),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
