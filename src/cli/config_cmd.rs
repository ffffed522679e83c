use anyhow::Result;

use crate::config::Config;

use super::args::ConfigArgs;

pub(crate) fn handle_config(args: ConfigArgs) -> Result<()> {
    let mut config = Config::load_unvalidated()?;
    apply_config_args(&mut config, args);
    config.save()?;

    println!(
        "✅ Configuration saved to {}",
        Config::config_path()?.display()
    );
    println!("📋 Current configuration:");
    println!(
        "   Provider: {} ({})",
        config.llm.provider,
        config.llm.provider.display_name()
    );
    println!("   API Key: {}", mask_api_key(&config.llm.api_key));
    println!("   Base URL: {}", config.llm.base_url);
    println!("   Timeout: {}s", config.llm.timeout_secs);
    println!("   Model: {}", config.models.model);
    println!("   Max Tokens: {}", config.models.max_tokens);
    println!("   Workers: {}", config.pipeline.worker_pool_size);
    println!(
        "   Max Iterations: {}",
        config.pipeline.max_iterations_per_gate
    );

    if let Err(err) = config.validate() {
        println!("⚠️  {err}");
    }

    Ok(())
}

pub(crate) fn apply_config_args(config: &mut Config, args: ConfigArgs) {
    if let Some(provider) = args.provider {
        if config.llm.provider != provider {
            config.llm.provider = provider;
            config.llm.base_url = provider.default_base_url().to_string();
        }
    }

    if let Some(api_key) = args.api_key {
        config.llm.api_key = api_key;
    }

    if let Some(timeout) = args.timeout {
        config.llm.timeout_secs = timeout;
    }

    if let Some(model) = args.model {
        config.models.model = model;
    }

    if let Some(max_tokens) = args.max_tokens {
        config.models.max_tokens = max_tokens;
    }

    if let Some(workers) = args.workers {
        config.pipeline.worker_pool_size = workers;
    }

    if let Some(max_iterations) = args.max_iterations {
        config.pipeline.max_iterations_per_gate = max_iterations;
    }
}

pub(crate) fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }

    let visible = key.chars().take(8).collect::<String>();
    format!("{visible}***")
}
