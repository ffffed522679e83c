use anyhow::{Context, Result, anyhow};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use super::builder::ConfigBuilder;
use super::types::{LlmProvider, ReviewFailureRoute};

pub fn apply_env_overrides(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Some(provider_raw) = env_string("CREWFLOW_PROVIDER")? {
        let provider = provider_raw
            .parse::<LlmProvider>()
            .with_context(|| format!("Failed to parse CREWFLOW_PROVIDER value '{provider_raw}'"))?;
        builder = builder.with_llm(|llm| {
            if llm.provider != provider {
                llm.provider = provider;
                llm.base_url = provider.default_base_url().to_string();
            }
        });
    }

    if let Some(base_url) = env_string("CREWFLOW_LLM_BASE_URL")? {
        builder = builder.with_llm(|llm| llm.base_url = base_url);
    }

    for provider in [LlmProvider::OpenRouter, LlmProvider::OpenAi] {
        let Some(var) = provider.api_key_env_var() else {
            continue;
        };
        if let Some(api_key) = env_string(var)? {
            builder = builder.with_llm(|llm| {
                if llm.provider == provider {
                    llm.api_key = api_key;
                }
            });
        }
    }

    if let Some(timeout) = env_parse::<u64>("CREWFLOW_TIMEOUT_SECS")? {
        builder = builder.with_llm(|llm| llm.timeout_secs = timeout);
    }

    if let Some(max_tokens) = env_parse::<u32>("CREWFLOW_MAX_TOKENS")? {
        builder = builder.with_models(|models| models.max_tokens = max_tokens);
    }

    if let Some(model) = env_string("CREWFLOW_MODEL")? {
        builder = builder.with_models(|models| models.model = model);
    }

    if let Some(max_iterations) = env_parse::<u32>("CREWFLOW_MAX_ITERATIONS")? {
        builder = builder.with_pipeline(|p| p.max_iterations_per_gate = max_iterations);
    }

    if let Some(workers) = env_parse::<usize>("CREWFLOW_WORKERS")? {
        builder = builder.with_pipeline(|p| p.worker_pool_size = workers);
    }

    if let Some(timeout) = env_parse::<u64>("CREWFLOW_STAGE_TIMEOUT_SECS")? {
        builder = builder.with_pipeline(|p| p.stage_timeout_secs = timeout);
    }

    if let Some(max_retries) = env_parse::<u32>("CREWFLOW_MAX_RETRIES")? {
        builder = builder.with_pipeline(|p| p.retry.max_retries = max_retries);
    }

    if let Some(route) = env_parse::<ReviewFailureRoute>("CREWFLOW_REVIEW_FAILURE")? {
        builder = builder.with_pipeline(|p| p.review_failure_route = route);
    }

    if let Some(dir) = env_string("CREWFLOW_CHECKPOINT_DIR")? {
        builder = builder.with_pipeline(|p| p.checkpoint_dir = Some(PathBuf::from(dir)));
    }

    Ok(builder)
}

pub fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(anyhow!("{key} contains invalid UTF-8")),
    }
}

pub fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(value) = env_string(key)? else {
        return Ok(None);
    };

    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|err| anyhow!("Failed to parse {key} value '{value}': {err}"))
}
