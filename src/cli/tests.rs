use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, LlmProvider, PipelineSettings, ReviewFailureRoute};

use super::args::{Cli, Command, ConfigArgs};
use super::clarify::normalize_answer;
use super::commands::apply_run_overrides;
use super::config_cmd::{apply_config_args, mask_api_key};

#[test]
fn task_words_and_run_flags_parse() {
    let cli = Cli::try_parse_from([
        "crewflow",
        "--yes",
        "--workers",
        "8",
        "--review-failure",
        "design",
        "build",
        "a",
        "CLI",
        "tool",
    ])
    .unwrap();

    assert!(cli.command.is_none());
    assert!(cli.yes);
    assert_eq!(cli.task.join(" "), "build a CLI tool");
    assert_eq!(cli.review_failure, Some(ReviewFailureRoute::Design));

    let mut settings = PipelineSettings::default();
    apply_run_overrides(&mut settings, &cli);
    assert_eq!(settings.worker_pool_size, 8);
    assert_eq!(settings.review_failure_route, ReviewFailureRoute::Design);
    assert_eq!(settings.max_iterations_per_gate, 50);
}

#[test]
fn unknown_review_route_is_rejected() {
    let err = Cli::try_parse_from(["crewflow", "--review-failure", "commit", "task"]).unwrap_err();
    assert!(err.to_string().contains("Unknown review failure route"));
}

#[test]
fn checkpoint_flags_parse() {
    let cli = Cli::try_parse_from([
        "crewflow",
        "--checkpoint-dir",
        "/tmp/runs",
        "--resume",
        "/tmp/runs/checkpoint.json",
    ])
    .unwrap();

    assert!(cli.task.is_empty());
    assert_eq!(cli.resume, Some(PathBuf::from("/tmp/runs/checkpoint.json")));

    let mut settings = PipelineSettings::default();
    apply_run_overrides(&mut settings, &cli);
    assert_eq!(settings.checkpoint_dir, Some(PathBuf::from("/tmp/runs")));
}

#[test]
fn subcommands_parse() {
    let cli = Cli::try_parse_from(["crewflow", "graph"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Graph)));

    let cli = Cli::try_parse_from([
        "crewflow",
        "config",
        "--provider",
        "ollama",
        "--model",
        "llama3",
        "--max-iterations",
        "10",
    ])
    .unwrap();
    match cli.command {
        Some(Command::Config(args)) => {
            assert_eq!(args.provider, Some(LlmProvider::Ollama));
            assert_eq!(args.model.as_deref(), Some("llama3"));
            assert_eq!(args.max_iterations, Some(10));
        }
        other => panic!("expected config command, got {other:?}"),
    }
}

#[test]
fn config_args_switch_provider_base_url() {
    let mut config = Config::builder().build().unwrap();
    config.llm.base_url = "https://proxy.example/v1".to_string();

    apply_config_args(
        &mut config,
        ConfigArgs {
            provider: Some(LlmProvider::Ollama),
            workers: Some(2),
            ..ConfigArgs::default()
        },
    );

    assert_eq!(config.llm.provider, LlmProvider::Ollama);
    assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
    assert_eq!(config.pipeline.worker_pool_size, 2);

    apply_config_args(
        &mut config,
        ConfigArgs {
            provider: Some(LlmProvider::Ollama),
            api_key: Some("sk-local".to_string()),
            ..ConfigArgs::default()
        },
    );
    assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
    assert_eq!(config.llm.api_key, "sk-local");
}

#[test]
fn clarification_answers_are_normalized() {
    assert_eq!(normalize_answer("  /home/me/app \n"), Some("/home/me/app".to_string()));
    assert_eq!(normalize_answer("SKIP\n"), None);
    assert_eq!(normalize_answer("\n"), None);
}

#[test]
fn api_keys_are_masked() {
    assert_eq!(mask_api_key(""), "(not set)");
    assert_eq!(mask_api_key("sk-or-v1-abcdef"), "sk-or-v1***");
    assert_eq!(mask_api_key("abc"), "abc***");
}
