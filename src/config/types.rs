use anyhow::anyhow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_OLLAMA_BASE_URL, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENROUTER_BASE_URL,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub models: ModelSettings,
    pub pipeline: PipelineSettings,
    pub personas: BTreeMap<String, PersonaOverride>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub timeout_secs: u64,
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    OpenRouter,
    OpenAi,
    Ollama,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenRouter => write!(f, "openrouter"),
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openrouter" => Ok(LlmProvider::OpenRouter),
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(anyhow!("Unknown LLM provider '{other}'")),
        }
    }
}

impl LlmProvider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => DEFAULT_OPENROUTER_BASE_URL,
            LlmProvider::OpenAi => DEFAULT_OPENAI_BASE_URL,
            LlmProvider::Ollama => DEFAULT_OLLAMA_BASE_URL,
        }
    }

    pub fn api_key_env_var(self) -> Option<&'static str> {
        match self {
            LlmProvider::OpenRouter => Some("OPENROUTER_API_KEY"),
            LlmProvider::OpenAi => Some("OPENAI_API_KEY"),
            LlmProvider::Ollama => None,
        }
    }

    pub fn requires_api_key(self) -> bool {
        self.api_key_env_var().is_some()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::OpenAi => "OpenAI",
            LlmProvider::Ollama => "Ollama",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Where a rejected review sends the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewFailureRoute {
    /// Reopen the flagged work-items and run them again.
    ParallelWork,
    /// Regenerate the task list from the requirements.
    Design,
}

impl fmt::Display for ReviewFailureRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewFailureRoute::ParallelWork => write!(f, "parallel-work"),
            ReviewFailureRoute::Design => write!(f, "design"),
        }
    }
}

impl std::str::FromStr for ReviewFailureRoute {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel-work" => Ok(ReviewFailureRoute::ParallelWork),
            "design" => Ok(ReviewFailureRoute::Design),
            other => Err(anyhow!(
                "Unknown review failure route '{other}' (expected parallel-work or design)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub max_iterations_per_gate: u32,
    pub worker_pool_size: usize,
    pub stage_timeout_secs: u64,
    pub retry: RetrySettings,
    pub review_failure_route: ReviewFailureRoute,
    pub checkpoint_dir: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

/// Partial persona text for one crew role; unset fields keep the built-in text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// File configuration types
#[derive(Debug, Default, Deserialize)]
pub(super) struct FileConfig {
    #[serde(default)]
    pub llm: Option<FileLlmSettings>,
    #[serde(default)]
    pub models: Option<FileModelSettings>,
    #[serde(default)]
    pub pipeline: Option<FilePipelineSettings>,
    #[serde(default)]
    pub personas: Option<BTreeMap<String, PersonaOverride>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileLlmSettings {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileModelSettings {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FilePipelineSettings {
    pub max_iterations_per_gate: Option<u32>,
    pub worker_pool_size: Option<usize>,
    pub stage_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub review_failure_route: Option<ReviewFailureRoute>,
    pub checkpoint_dir: Option<PathBuf>,
}

// Serialization helpers
#[derive(Serialize)]
pub(super) struct PersistedConfig<'a> {
    pub llm: PersistedLlm<'a>,
    pub models: PersistedModels<'a>,
    pub pipeline: PersistedPipeline<'a>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub personas: &'a BTreeMap<String, PersonaOverride>,
}

#[derive(Serialize)]
pub(super) struct PersistedLlm<'a> {
    pub provider: LlmProvider,
    pub api_key: &'a str,
    pub timeout_secs: u64,
    pub base_url: &'a str,
    pub user_agent: &'a str,
}

#[derive(Serialize)]
pub(super) struct PersistedModels<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Serialize)]
pub(super) struct PersistedPipeline<'a> {
    pub max_iterations_per_gate: u32,
    pub worker_pool_size: usize,
    pub stage_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub review_failure_route: ReviewFailureRoute,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<&'a PathBuf>,
}

impl<'a> From<&'a Config> for PersistedConfig<'a> {
    fn from(config: &'a Config) -> Self {
        PersistedConfig {
            llm: PersistedLlm {
                provider: config.llm.provider,
                api_key: &config.llm.api_key,
                timeout_secs: config.llm.timeout_secs,
                base_url: &config.llm.base_url,
                user_agent: &config.llm.user_agent,
            },
            models: PersistedModels {
                model: &config.models.model,
                max_tokens: config.models.max_tokens,
                temperature: config.models.temperature,
            },
            pipeline: PersistedPipeline {
                max_iterations_per_gate: config.pipeline.max_iterations_per_gate,
                worker_pool_size: config.pipeline.worker_pool_size,
                stage_timeout_secs: config.pipeline.stage_timeout_secs,
                max_retries: config.pipeline.retry.max_retries,
                backoff_ms: config.pipeline.retry.backoff_ms,
                review_failure_route: config.pipeline.review_failure_route,
                checkpoint_dir: config.pipeline.checkpoint_dir.as_ref(),
            },
            personas: &config.personas,
        }
    }
}
