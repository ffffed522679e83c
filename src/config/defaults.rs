use super::constants::*;
use super::types::{
    LlmProvider, LlmSettings, ModelSettings, PipelineSettings, RetrySettings, ReviewFailureRoute,
};

pub fn default_user_agent() -> String {
    format!("crewflow/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for LlmSettings {
    fn default() -> Self {
        let provider = LlmProvider::OpenRouter;
        Self {
            provider,
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: provider.default_base_url().to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_iterations_per_gate: DEFAULT_MAX_ITERATIONS_PER_GATE,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            retry: RetrySettings::default(),
            review_failure_route: ReviewFailureRoute::ParallelWork,
            checkpoint_dir: None,
        }
    }
}
