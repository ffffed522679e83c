use anyhow::{Context, Result};
use dirs::home_dir;
use std::{fs, path::Path};

use super::Config;
use super::builder::ConfigBuilder;
use super::environment::apply_env_overrides;
use super::types::{FileConfig, LlmProvider, PersistedConfig};
use super::validation::validate;

impl Config {
    pub fn config_path() -> Result<std::path::PathBuf> {
        let mut path = home_dir().context("Could not determine home directory")?;
        path.push(".crewflow/config");
        Ok(path)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn load() -> Result<Self> {
        let config = Self::load_unvalidated()?;
        validate(&config)?;
        Ok(config)
    }

    /// Defaults, file and environment layered without the credential checks.
    pub fn load_unvalidated() -> Result<Self> {
        let path = Self::config_path()?;
        let mut builder = ConfigBuilder::new();

        if path.exists() {
            builder = Self::apply_file(builder, &path)?;
        }

        builder = apply_env_overrides(builder)?;
        builder.build()
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create config directory {}", parent.display())
            })?;
        }

        let payload = PersistedConfig::from(self);
        let json = serde_json::to_string_pretty(&payload)
            .context("Failed to serialize configuration to JSON")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate(self)
    }

    fn apply_file(builder: ConfigBuilder, path: &Path) -> Result<ConfigBuilder> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed reading config at {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(builder);
        }

        let file: FileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing JSON config at {}", path.display()))?;

        file.apply(builder)
    }
}

impl FileConfig {
    pub fn apply(self, mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
        if let Some(llm) = self.llm {
            let provider = llm
                .provider
                .as_deref()
                .map(str::parse::<LlmProvider>)
                .transpose()?;
            builder = builder.with_llm(|settings| {
                if let Some(provider) = provider {
                    if settings.provider != provider {
                        settings.provider = provider;
                        settings.base_url = provider.default_base_url().to_string();
                    }
                }
                if let Some(api_key) = llm.api_key {
                    settings.api_key = api_key;
                }
                if let Some(timeout) = llm.timeout_secs {
                    settings.timeout_secs = timeout;
                }
                if let Some(base_url) = llm.base_url {
                    settings.base_url = base_url;
                }
                if let Some(user_agent) = llm.user_agent {
                    settings.user_agent = user_agent;
                }
            });
        }

        if let Some(models) = self.models {
            builder = builder.with_models(|settings| {
                if let Some(model) = models.model {
                    settings.model = model;
                }
                if let Some(max_tokens) = models.max_tokens {
                    settings.max_tokens = max_tokens;
                }
                if let Some(temperature) = models.temperature {
                    settings.temperature = temperature;
                }
            });
        }

        if let Some(pipeline) = self.pipeline {
            builder = builder.with_pipeline(|settings| {
                if let Some(max_iterations) = pipeline.max_iterations_per_gate {
                    settings.max_iterations_per_gate = max_iterations;
                }
                if let Some(workers) = pipeline.worker_pool_size {
                    settings.worker_pool_size = workers;
                }
                if let Some(timeout) = pipeline.stage_timeout_secs {
                    settings.stage_timeout_secs = timeout;
                }
                if let Some(max_retries) = pipeline.max_retries {
                    settings.retry.max_retries = max_retries;
                }
                if let Some(backoff_ms) = pipeline.backoff_ms {
                    settings.retry.backoff_ms = backoff_ms;
                }
                if let Some(route) = pipeline.review_failure_route {
                    settings.review_failure_route = route;
                }
                if pipeline.checkpoint_dir.is_some() {
                    settings.checkpoint_dir = pipeline.checkpoint_dir;
                }
            });
        }

        for (role, persona) in self.personas.unwrap_or_default() {
            builder = builder.with_persona(role, persona);
        }

        Ok(builder)
    }
}
