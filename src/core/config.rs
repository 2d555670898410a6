use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

use crate::ai::chat::ModelConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_hostname: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub token_budget: usize,
    pub structured_persona: bool,
    pub transcription_model: String,
}

impl AppConfig {
    /// Reads the config from environment variables. `GROQ_API_KEY` is
    /// required, everything else has a default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but with a custom source for variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(anyhow!("Missing env var GROQ_API_KEY"))?;
        let api_hostname = lookup("CHARCHAT_LLM_HOST")
            .unwrap_or_else(|| "https://api.groq.com/openai".to_string());
        let model = lookup("CHARCHAT_LLM_MODEL")
            .unwrap_or_else(|| "llama-3.3-70b-versatile".to_string());
        let temperature = parse_var(&lookup, "CHARCHAT_TEMPERATURE", 0.4)?;
        let max_retries = parse_var(&lookup, "CHARCHAT_MAX_RETRIES", 2)?;
        let token_budget = parse_var(&lookup, "CHARCHAT_TOKEN_BUDGET", 100)?;
        let structured_persona = parse_var(&lookup, "CHARCHAT_STRUCTURED_PERSONA", false)?;
        let transcription_model = lookup("CHARCHAT_TRANSCRIPTION_MODEL")
            .unwrap_or_else(|| "whisper-large-v3".to_string());

        Ok(Self {
            api_hostname,
            api_key,
            model,
            temperature,
            max_retries,
            token_budget,
            structured_persona,
            transcription_model,
        })
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_retries: self.max_retries,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for env var {}: {}", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("GROQ_API_KEY", "gsk_test")])).unwrap();
        assert_eq!(config.api_key, "gsk_test");
        assert_eq!(config.api_hostname, "https://api.groq.com/openai");
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.temperature, 0.4);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.token_budget, 100);
        assert!(!config.structured_persona);
        assert_eq!(config.transcription_model, "whisper-large-v3");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("CHARCHAT_LLM_MODEL", "mixtral-8x7b-32768"),
            ("CHARCHAT_TEMPERATURE", "0.9"),
            ("CHARCHAT_TOKEN_BUDGET", "2048"),
            ("CHARCHAT_STRUCTURED_PERSONA", "true"),
        ]))
        .unwrap();
        assert_eq!(config.model, "mixtral-8x7b-32768");
        assert_eq!(config.temperature, 0.9);
        assert_eq!(config.token_budget, 2048);
        assert!(config.structured_persona);

        let model_config = config.model_config();
        assert_eq!(model_config.model, "mixtral-8x7b-32768");
        assert_eq!(model_config.max_retries, 2);
    }

    #[test]
    fn test_missing_api_key() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(result.unwrap_err().to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_invalid_number() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("CHARCHAT_TOKEN_BUDGET", "lots"),
        ]));
        assert!(result.unwrap_err().to_string().contains("CHARCHAT_TOKEN_BUDGET"));
    }
}
