use crate::config::Config;
use crate::providers::OpenAIProvider;
use crate::traits::Provider;
use anyhow::{Context, Result, anyhow};
use std::time::Duration;

const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    let provider_name = config.provider.as_deref().unwrap_or("openai");

    let provider = match provider_name.to_lowercase().as_str() {
        "openai" => {
            let api_key =
                resolve_api_key_with_fallback(&["OPENAI_API_KEY", "RELAY_API_KEY"], &config.api_key)?;
            let mut provider =
                OpenAIProvider::new(api_key).context("Failed to build HTTP client")?;
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            provider
        }
        "ollama" => OpenAIProvider::new(String::new())
            .context("Failed to build HTTP client")?
            .with_base_url(config.base_url.as_deref().unwrap_or(OLLAMA_BASE_URL)),
        _ => {
            return Err(anyhow!(
                "Unknown provider: {}. Available: openai, ollama",
                provider_name
            ));
        }
    };

    let mut provider = provider
        .with_model(config.model.clone())
        .with_timeout(Duration::from_secs(config.request_timeout_secs))
        .context("Failed to build HTTP client with configured timeout")?;
    if let Some(temperature) = config.temperature {
        provider = provider.with_temperature(temperature);
    }

    tracing::debug!(provider = provider_name, model = %config.model, "Created provider");
    Ok(Box::new(provider))
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found. Set {} or api_key in {}",
            env_vars.join(" or "),
            crate::config::get_config_path().display()
        ))
    }
}
