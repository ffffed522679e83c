use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::{LlmProvider, ReviewFailureRoute};

use super::commands;

/// Entry point for the `crewflow` command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "crewflow",
    about = "AI software-development crew: from a one-line request to a reviewed deliverable",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging of stages, gates and LLM calls
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Never stop for clarifying questions
    #[arg(long)]
    pub yes: bool,

    /// Override the worker pool size for parallel work
    #[arg(long)]
    pub workers: Option<usize>,

    /// Override how many times a single stage may be entered
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<u32>,

    /// Where a rejected review sends the pipeline (parallel-work or design)
    #[arg(long = "review-failure", value_name = "ROUTE")]
    pub review_failure: Option<ReviewFailureRoute>,

    /// Persist a checkpoint after every stage into this directory
    #[arg(long = "checkpoint-dir", value_name = "DIR")]
    pub checkpoint_dir: Option<PathBuf>,

    /// Resume a run from a checkpoint file
    #[arg(long, value_name = "FILE")]
    pub resume: Option<PathBuf>,

    /// Task description: words typed after `crewflow`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub task: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the stage transition table.
    Graph,
    /// Persist settings to the configuration file.
    Config(ConfigArgs),
}

#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Set the API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Select the LLM provider (openrouter, openai or ollama)
    #[arg(long)]
    pub provider: Option<LlmProvider>,

    /// Set the model used by every crew role
    #[arg(long)]
    pub model: Option<String>,

    /// Set the HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Set max tokens per completion
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Set the worker pool size
    #[arg(long)]
    pub workers: Option<usize>,

    /// Set the per-stage entry cap
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<u32>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        commands::run(self).await
    }
}
