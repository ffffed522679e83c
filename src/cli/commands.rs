use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::client::{HttpClientFactory, LlmClientFactory};
use crate::config::{Config, PipelineSettings};
use crate::crew::LlmCrew;
use crate::pipeline::{
    CancelSignal, CheckpointStore, ClarificationResolver, JsonCheckpointStore, NoClarifier,
    PipelineOrchestrator,
};

use super::args::{Cli, Command};
use super::clarify::StdinClarifier;
use super::config_cmd;
use super::render;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Graph) => handle_graph(),
        Some(Command::Config(args)) => config_cmd::handle_config(args),
        None => handle_task(cli).await,
    }
}

fn handle_graph() -> Result<()> {
    let config = Config::load_unvalidated()?;
    let orchestrator = build_orchestrator(&config, Arc::new(NoClarifier))?;
    render::print_graph(orchestrator.graph());
    Ok(())
}

/// Flags given on the command line win over file and environment settings.
pub(crate) fn apply_run_overrides(settings: &mut PipelineSettings, cli: &Cli) {
    if let Some(workers) = cli.workers {
        settings.worker_pool_size = workers;
    }
    if let Some(max_iterations) = cli.max_iterations {
        settings.max_iterations_per_gate = max_iterations;
    }
    if let Some(route) = cli.review_failure {
        settings.review_failure_route = route;
    }
    if let Some(dir) = &cli.checkpoint_dir {
        settings.checkpoint_dir = Some(dir.clone());
    }
}

fn build_orchestrator(
    config: &Config,
    clarifier: Arc<dyn ClarificationResolver>,
) -> Result<PipelineOrchestrator> {
    let client = HttpClientFactory.build(&config.llm)?;
    let crew = Arc::new(LlmCrew::from_config(client, config)?);

    let orchestrator = PipelineOrchestrator::builder(config.pipeline.clone())
        .with_crew(crew)
        .with_clarifier(clarifier)
        .build()?;
    Ok(orchestrator)
}

fn checkpoint_store(config: &Config, resume: Option<&PathBuf>) -> Option<JsonCheckpointStore> {
    config
        .pipeline
        .checkpoint_dir
        .as_ref()
        .map(JsonCheckpointStore::in_dir)
        .or_else(|| resume.map(JsonCheckpointStore::at))
}

async fn handle_task(cli: Cli) -> Result<()> {
    let prompt = cli.task.join(" ").trim().to_owned();
    if prompt.is_empty() && cli.resume.is_none() {
        show_welcome_message();
        return Ok(());
    }

    let mut config = Config::load()?;
    apply_run_overrides(&mut config.pipeline, &cli);
    config.validate()?;

    let clarifier: Arc<dyn ClarificationResolver> = if cli.yes {
        Arc::new(NoClarifier)
    } else {
        Arc::new(StdinClarifier)
    };
    let mut orchestrator = build_orchestrator(&config, clarifier)?;
    if let Some(store) = checkpoint_store(&config, cli.resume.as_ref()) {
        info!(path = %store.path().display(), "checkpointing enabled");
        orchestrator = orchestrator.with_checkpoints(store);
    }

    let cancel = CancelSignal::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling the run");
                cancel.cancel();
            }
        }
    });

    let result = match &cli.resume {
        Some(path) => {
            let checkpoint = JsonCheckpointStore::at(path)
                .load()?
                .with_context(|| format!("No checkpoint found at {}", path.display()))?;
            println!("🔁 Resuming {}", checkpoint.state.input);
            orchestrator.resume(checkpoint, cancel).await
        }
        None => {
            println!("🚀 Crew is working on: {prompt}");
            orchestrator.run_with_cancel(&prompt, cancel).await
        }
    };

    match result {
        Ok(run) => {
            render::print_run(&run);
            Ok(())
        }
        Err(err) => {
            render::print_failure(&err);
            Err(err.into())
        }
    }
}

fn show_welcome_message() {
    println!("🚀 Welcome to crewflow - an AI software-development crew!");
    println!();
    println!("📖 What crewflow does:");
    println!("   • Collects and validates requirements for your request");
    println!("   • Designs work-items and builds them in parallel");
    println!("   • Reviews the result and loops until it passes");
    println!();
    println!("💡 How to use crewflow:");
    println!("   crewflow 'build a CLI tool that greets the user'   # Run the crew");
    println!("   crewflow --yes --workers 8 'a REST API in Go'       # Non-interactive, 8 workers");
    println!("   crewflow --checkpoint-dir .crewflow 'a parser'      # Save progress after each stage");
    println!("   crewflow --resume .crewflow/checkpoint.json         # Continue a saved run");
    println!("   crewflow graph                                      # Show the stage transition table");
    println!("   crewflow config --api-key YOUR_KEY                  # Set API key");
    println!("   crewflow config --provider ollama --model llama3    # Use a local model");
    println!();
    println!("❓ For more help: crewflow --help");
}
