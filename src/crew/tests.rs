use std::collections::BTreeMap;
use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;

use crate::client::AIClient;
use crate::config::{
    Config, LlmProvider, LlmSettings, ModelSettings, PersonaOverride, PipelineSettings,
};
use crate::pipeline::{
    Collaborator, PipelineOrchestrator, ProjectState, RequirementsBrief, RequirementsRecord,
    RequirementsVerdict, Reviewer, TaskDesigner, WorkItem, WorkStatus,
};

use super::parsing::{extract_json_object, strip_prompt_prefix};
use super::{LlmCrew, PersonaTable, Role};

fn sample_config(base_url: String) -> Config {
    Config {
        llm: LlmSettings {
            provider: LlmProvider::OpenRouter,
            api_key: "test-key".to_string(),
            timeout_secs: 30,
            base_url,
            user_agent: "crewflow/test".to_string(),
        },
        models: ModelSettings {
            model: "crew/model".to_string(),
            max_tokens: 512,
            temperature: 0.2,
        },
        pipeline: PipelineSettings::default(),
        personas: BTreeMap::new(),
    }
}

fn crew_for(server: &MockServer) -> LlmCrew {
    let config = sample_config(server.url("/v1"));
    let client = AIClient::new(&config.llm).unwrap();
    LlmCrew::from_config(Arc::new(client), &config).unwrap()
}

fn reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            {
                "index": 0,
                "finish_reason": "stop",
                "message": {
                    "role": "assistant",
                    "content": content
                }
            }
        ]
    })
}

fn sample_requirements() -> RequirementsRecord {
    RequirementsRecord {
        language: "Rust".to_string(),
        project_path: "/home/user/cli-tool".to_string(),
        repository_url: None,
        libraries: vec!["clap".to_string()],
        implementation_scope: None,
        expected_outcome: "a CLI that greets the user".to_string(),
    }
}

#[tokio::test]
async fn collector_reply_is_parsed_through_think_blocks_and_fences() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer test-key")
                .body_contains("Information Collector")
                .body_contains("build a CLI tool")
                .body_contains("Where should it live?");

            then.status(200).json_body(reply(
                "<think>the user wants { something }</think>\n```json\n{\"program_lang\":\"Rust\",\"project_path\":\"/home/user/cli-tool\",\"librarys\":[\"clap\"],\"implementations\":null,\"expect\":\"a CLI that greets the user\"}\n```",
            ));
        })
        .await;

    let crew = crew_for(&server);
    let brief = RequirementsBrief {
        input: "build a CLI tool".to_string(),
        issues: vec![],
        clarifications: vec![crate::pipeline::Clarification {
            question: "Where should it live?".to_string(),
            answer: "/home/user/cli-tool".to_string(),
        }],
    };

    let record = crew.collect_requirements(&brief).await.unwrap();

    assert_eq!(record, sample_requirements());
    mock.assert_async().await;
}

#[tokio::test]
async fn collector_reply_with_missing_keys_is_blank_not_an_error() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(reply("{\"language\":\"Go\",\"libraries\":[]}"));
        })
        .await;

    let crew = crew_for(&server);
    let brief = RequirementsBrief {
        input: "a web server".to_string(),
        issues: vec![],
        clarifications: vec![],
    };

    let record = crew.collect_requirements(&brief).await.unwrap();
    assert_eq!(record.language, "Go");
    assert_eq!(record.missing_fields(), vec!["project_path", "expected_outcome"]);
}

#[tokio::test]
async fn validator_issues_become_a_verdict_with_question() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Information Validator");

            then.status(200).json_body(reply(
                "{\"valid\":false,\"requirements\":null,\"issues\":[\"project_path is relative\"],\"question\":\"What absolute path should be used?\"}",
            ));
        })
        .await;

    let crew = crew_for(&server);
    let verdict = crew
        .validate_requirements(&sample_requirements())
        .await
        .unwrap();

    match verdict {
        RequirementsVerdict::Issues(issues) => {
            assert_eq!(issues.issues, vec!["project_path is relative"]);
            assert_eq!(
                issues.question.as_deref(),
                Some("What absolute path should be used?")
            );
        }
        other => panic!("expected issues, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn validator_acceptance_keeps_the_original_record_when_omitted() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(reply("{\"valid\":true,\"issues\":[]}"));
        })
        .await;

    let crew = crew_for(&server);
    let verdict = crew
        .validate_requirements(&sample_requirements())
        .await
        .unwrap();

    assert_eq!(verdict, RequirementsVerdict::Valid(sample_requirements()));
}

#[tokio::test]
async fn optimizer_reply_loses_its_label() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("AI Prompt Engineering Specialist");
            then.status(200).json_body(reply(
                "Optimized Prompt: Build a Rust CLI with clap that greets the user.",
            ));
        })
        .await;

    let crew = crew_for(&server);
    let prompt = crew.optimize_prompt(&sample_requirements()).await.unwrap();

    assert_eq!(prompt, "Build a Rust CLI with clap that greets the user.");
}

#[tokio::test]
async fn architect_receives_review_feedback() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Software Architect")
                .body_contains("Reviewer feedback on the previous attempt")
                .body_contains("add tests");
            then.status(200).json_body(reply(
                "{\"tasks\":[{\"title\":\"Parse args\",\"description\":\"use clap\"},{\"title\":\"  \",\"description\":\"blank\"},{\"title\":\"Greeting\"}]}",
            ));
        })
        .await;

    let crew = crew_for(&server);
    let drafts = crew
        .design(&sample_requirements(), "Build a CLI", Some("add tests"))
        .await
        .unwrap();

    let titles: Vec<_> = drafts.iter().map(|draft| draft.title.as_str()).collect();
    assert_eq!(titles, vec!["Parse args", "Greeting"]);
    assert_eq!(drafts[1].description, "");
    mock.assert_async().await;
}

#[tokio::test]
async fn architect_reply_without_json_is_an_error() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(reply("I would split this into three modules."));
        })
        .await;

    let crew = crew_for(&server);
    let err = crew
        .design(&sample_requirements(), "Build a CLI", None)
        .await
        .unwrap_err();

    assert!(
        err.to_string()
            .contains("architect response did not contain a JSON object")
    );
}

#[tokio::test]
async fn reviewer_drops_unknown_rework_ids() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Code Reviewer")
                .body_contains("fn main");
            then.status(200).json_body(reply(
                "{\"passed\":false,\"feedback\":\"handle empty names\",\"rework\":[\"task-1\",\"task-7\"]}",
            ));
        })
        .await;

    let crew = crew_for(&server);
    let mut state = ProjectState::new("build a CLI tool");
    let mut item = WorkItem::new("task-1", "Greeting", "print hello", 0);
    item.status = WorkStatus::Complete;
    item.output = Some("fn main() { println!(\"hello\"); }".to_string());
    state.tasks.push(item);

    let verdict = crew.review(&state).await.unwrap();

    assert!(!verdict.passed);
    assert_eq!(verdict.feedback.as_deref(), Some("handle empty names"));
    assert_eq!(verdict.rework, vec!["task-1".to_string()]);
}

#[tokio::test]
async fn http_errors_surface_with_role_context() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401);
        })
        .await;

    let crew = crew_for(&server);
    let err = crew
        .optimize_prompt(&sample_requirements())
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("AI Prompt Engineering Specialist call failed"));
    assert!(message.contains("Invalid API key"));
}

#[tokio::test]
async fn crew_drives_the_whole_pipeline() {
    let server = MockServer::start_async().await;

    let collector = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Information Collector");
            then.status(200).json_body(reply(
                "{\"language\":\"Rust\",\"project_path\":\"/home/user/cli-tool\",\"libraries\":[\"clap\"],\"expected_outcome\":\"a CLI that greets the user\"}",
            ));
        })
        .await;
    let _validator = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Information Validator");
            then.status(200).json_body(reply("{\"valid\":true}"));
        })
        .await;
    let _optimizer = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("AI Prompt Engineering Specialist");
            then.status(200)
                .json_body(reply("Optimized Prompt: Build a greeting CLI in Rust."));
        })
        .await;
    let _architect = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Software Architect");
            then.status(200).json_body(reply(
                "{\"tasks\":[{\"title\":\"Args\",\"description\":\"parse\"},{\"title\":\"Greet\",\"description\":\"print\"}]}",
            ));
        })
        .await;
    let engineer = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Software Engineer");
            then.status(200)
                .json_body(reply("src/main.rs\n```rust\nfn main() {}\n```"));
        })
        .await;
    let _reviewer = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Code Reviewer");
            then.status(200).json_body(reply("{\"passed\":true}"));
        })
        .await;

    let config = sample_config(server.url("/v1"));
    let client = AIClient::new(&config.llm).unwrap();
    let crew = Arc::new(LlmCrew::from_config(Arc::new(client), &config).unwrap());
    let orchestrator = PipelineOrchestrator::builder(config.pipeline.clone())
        .with_crew(crew)
        .build()
        .unwrap();

    let run = orchestrator.run("build a CLI tool").await.unwrap();

    assert_eq!(run.state.task.as_deref(), Some("Build a greeting CLI in Rust."));
    assert_eq!(run.state.tasks.len(), 2);
    let output = run.output().unwrap();
    assert!(output.contains("### 2. Greet (`task-2`)"));
    assert!(output.contains("fn main() {}"));

    collector.assert_hits_async(1).await;
    engineer.assert_hits_async(2).await;
}

#[test]
fn persona_overrides_replace_only_given_fields() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "reviewer".to_string(),
        PersonaOverride {
            goal: Some("Ship it fast".to_string()),
            ..PersonaOverride::default()
        },
    );

    let table = PersonaTable::with_overrides(&overrides).unwrap();
    let builtin = PersonaTable::builtin();

    let reviewer = table.get(Role::Reviewer);
    assert_eq!(reviewer.goal, "Ship it fast");
    assert_eq!(reviewer.backstory, builtin.get(Role::Reviewer).backstory);
    assert!(reviewer.system_prompt().contains("Goal: Ship it fast"));
    assert_eq!(table.get(Role::Engineer), builtin.get(Role::Engineer));
}

#[test]
fn unknown_persona_role_is_rejected() {
    let mut overrides = BTreeMap::new();
    overrides.insert("janitor".to_string(), PersonaOverride::default());

    let err = PersonaTable::with_overrides(&overrides).unwrap_err();
    assert!(err.to_string().contains("Unknown crew role 'janitor'"));
}

#[test]
fn role_keys_match_configurable_roles() {
    let keys: Vec<_> = Role::ALL.iter().map(|role| role.key()).collect();
    assert_eq!(keys, crate::config::KNOWN_ROLES);
}

#[test]
fn json_extraction_ignores_braces_inside_strings() {
    let reply = "Sure! {\"feedback\":\"use `{}` placeholders\",\"passed\":true} trailing {";
    assert_eq!(
        extract_json_object(reply).as_deref(),
        Some("{\"feedback\":\"use `{}` placeholders\",\"passed\":true}")
    );

    assert_eq!(
        extract_json_object("{\"quote\":\"a \\\"{\\\" b\"}").as_deref(),
        Some("{\"quote\":\"a \\\"{\\\" b\"}")
    );
    assert_eq!(extract_json_object("<think>{\"a\":1}</think>no json"), None);
    assert_eq!(extract_json_object("{\"unterminated\": 1"), None);
}

#[test]
fn prompt_prefix_is_stripped_case_insensitively() {
    assert_eq!(strip_prompt_prefix("OPTIMIZED PROMPT:  do it"), "do it");
    assert_eq!(strip_prompt_prefix("just do it"), "just do it");
    assert_eq!(strip_prompt_prefix("<think>x</think>Optimized Prompt: go"), "go");
}
