//! The `kotodrill generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use kotodrill_core::evaluator::evaluate;
use kotodrill_core::generator::QuestionGenerator;
use kotodrill_core::{
    CancelSignal, Difficulty, GenerationError, GenerationService, ModelRuntime, Question,
};
use kotodrill_runtime::create_loader;
use kotodrill_store::ProgressStore;

use super::{load_settings, AnswerReader};

pub async fn execute(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    model: Option<PathBuf>,
    difficulty: Option<Difficulty>,
    count: u32,
    quiz: bool,
) -> Result<()> {
    let settings = load_settings(config.as_deref(), data_dir)?;
    let model_path = model
        .or_else(|| settings.model_path.clone())
        .context("no model file given; pass --model or set model_path in kotodrill.toml")?;
    let difficulty = difficulty.unwrap_or(settings.default_difficulty);

    let loader = create_loader(&settings.runtime)?;
    let generator = QuestionGenerator::new(settings.generation.to_generator_config());
    let mut service = GenerationService::new(ModelRuntime::new(loader), generator);

    eprintln!("Loading model {} ...", model_path.display());
    service.initialize(&model_path).await?;

    let cancel = CancelSignal::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            cancel.cancel();
            // A second Ctrl-C means the user does not want to wait for cleanup.
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Aborted.");
                std::process::exit(130);
            }
        })
    };

    let store = ProgressStore::new(&settings.data_dir);
    let result = run_session(&service, &store, difficulty, count, quiz, &cancel).await;

    watcher.abort();
    service.dispose().await;
    result
}

async fn run_session(
    service: &GenerationService,
    store: &ProgressStore,
    difficulty: Difficulty,
    count: u32,
    quiz: bool,
    cancel: &CancelSignal,
) -> Result<()> {
    let mut answers = quiz.then(AnswerReader::spawn);
    let mut progress = store.load();
    let mut asked = 0u32;
    let mut right = 0u32;

    for n in 1..=count {
        let question = match service.generate(difficulty, cancel).await {
            Ok(q) => q,
            Err(GenerationError::Cancelled) => {
                eprintln!("Interrupted.");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = store.append_question(&question) {
            tracing::warn!("failed to log question: {e:#}");
        }

        println!("\n[{n}/{count}] {}", question.difficulty());
        println!("  {}", question.prompt_text());

        let Some(reader) = answers.as_mut() else {
            println!("  Answer: {}", question.correct_answer());
            print_explanation(&question);
            continue;
        };

        let Some(answer) = reader.next("Your answer: ").await else {
            break;
        };
        let evaluation = evaluate(&question, &answer);
        println!("{}", evaluation.feedback);
        print_explanation(&question);

        progress.record(evaluation.outcome(&question));
        store.save(&progress)?;
        asked += 1;
        if evaluation.correct {
            right += 1;
        }
    }

    if asked > 0 {
        println!(
            "\nSession: {right}/{asked} correct. Overall accuracy: {:.1}%",
            progress.accuracy_rate()
        );
    }
    Ok(())
}

fn print_explanation(question: &Question) {
    if let Some(explanation) = question.explanation() {
        println!("  Explanation: {explanation}");
    }
}
