use anyhow::{Result, anyhow, bail};

use super::constants::KNOWN_ROLES;
use super::types::Config;

pub fn validate(config: &Config) -> Result<()> {
    let provider = config.llm.provider;
    if provider.requires_api_key() && config.llm.api_key.trim().is_empty() {
        let env_var = provider.api_key_env_var().unwrap_or("the provider API key variable");
        return Err(anyhow!(
            "{} API key not found. Set {} or add it to {}",
            provider.display_name(),
            env_var,
            Config::config_path()?.display()
        ));
    }

    if config.pipeline.max_iterations_per_gate == 0 {
        bail!("max_iterations_per_gate must be at least 1");
    }

    if config.pipeline.worker_pool_size == 0 {
        bail!("worker_pool_size must be at least 1");
    }

    if config.pipeline.stage_timeout_secs == 0 {
        bail!("stage_timeout_secs must be at least 1");
    }

    if let Some(role) = config
        .personas
        .keys()
        .find(|role| !KNOWN_ROLES.contains(&role.as_str()))
    {
        bail!(
            "Unknown persona role '{role}' (expected one of: {})",
            KNOWN_ROLES.join(", ")
        );
    }

    Ok(())
}
