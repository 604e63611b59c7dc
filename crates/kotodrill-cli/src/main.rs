//! kotodrill CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use kotodrill_core::Difficulty;

mod commands;

#[derive(Parser)]
#[command(
    name = "kotodrill",
    version,
    about = "Japanese grammar and vocabulary drills on a local LLM"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for vocabulary weeks and progress
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and a sample vocabulary week
    Init,

    /// Generate grammar questions with the local model
    Generate {
        /// GGUF model file (defaults to `model_path` from the config)
        #[arg(long)]
        model: Option<PathBuf>,

        /// beginner, intermediate or advanced
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Number of questions
        #[arg(long, default_value = "1")]
        count: u32,

        /// Read an answer for each question from stdin and record progress
        #[arg(long)]
        quiz: bool,
    },

    /// Drill a random vocabulary item from a week
    Vocab {
        /// Week number
        #[arg(long)]
        week: u32,

        /// Difficulty filter, or "All"
        #[arg(long, default_value = "All")]
        difficulty: String,

        /// Number of items
        #[arg(long, default_value = "1")]
        count: u32,
    },

    /// List vocabulary weeks
    Weeks,

    /// Edit the vocabulary bank
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },

    /// Show answer statistics
    Progress {
        /// Clear all recorded answers
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
enum DatasetAction {
    /// List items of one week, or of all weeks
    List {
        /// Week number
        #[arg(long)]
        week: Option<u32>,
    },

    /// Add an item, or update the item with the same Chinese text
    Add {
        /// Week number
        #[arg(long)]
        week: u32,

        /// Chinese prompt text
        #[arg(long)]
        chinese: String,

        /// Japanese answer
        #[arg(long)]
        answer: String,

        /// Other accepted answers, separated by `,` or `;`
        #[arg(long)]
        alternates: Option<String>,

        /// beginner, intermediate or advanced
        #[arg(long, default_value = "Beginner")]
        difficulty: Difficulty,

        /// Hint shown with the prompt
        #[arg(long)]
        hint: Option<String>,
    },

    /// Delete an item
    Delete {
        /// Week number
        #[arg(long)]
        week: u32,

        /// Chinese prompt text
        #[arg(long)]
        chinese: String,

        /// Japanese answer
        #[arg(long)]
        answer: String,
    },

    /// Create an empty week (defaults to the next week number)
    CreateWeek {
        /// Week number
        #[arg(long)]
        week: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kotodrill=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(cli.config, cli.data_dir),
        Commands::Generate {
            model,
            difficulty,
            count,
            quiz,
        } => {
            commands::generate::execute(cli.config, cli.data_dir, model, difficulty, count, quiz)
                .await
        }
        Commands::Vocab {
            week,
            difficulty,
            count,
        } => commands::vocab::execute(cli.config, cli.data_dir, week, difficulty, count).await,
        Commands::Weeks => commands::weeks::execute(cli.config, cli.data_dir),
        Commands::Dataset { action } => match action {
            DatasetAction::List { week } => {
                commands::dataset::list(cli.config, cli.data_dir, week)
            }
            DatasetAction::Add {
                week,
                chinese,
                answer,
                alternates,
                difficulty,
                hint,
            } => commands::dataset::add(
                cli.config,
                cli.data_dir,
                week,
                commands::dataset::ItemArgs {
                    chinese,
                    answer,
                    alternates,
                    difficulty,
                    hint,
                },
            ),
            DatasetAction::Delete {
                week,
                chinese,
                answer,
            } => commands::dataset::delete(cli.config, cli.data_dir, week, chinese, answer),
            DatasetAction::CreateWeek { week } => {
                commands::dataset::create_week(cli.config, cli.data_dir, week)
            }
        },
        Commands::Progress { reset } => {
            commands::progress::execute(cli.config, cli.data_dir, reset)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
