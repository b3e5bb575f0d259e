use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::errors::PipelineError;

/// Pipeline configuration loaded from environment variables.
/// Only the stage that needs a credential asks for it (see `require_api_key`).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_file: PathBuf,
    pub legacy_dir: PathBuf,
    pub useful_docs_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub knowledge_bank: PathBuf,
    pub min_content_length: usize,
    pub mirror_to_master: bool,
    pub overwrite: bool,
    pub report_char_budget: usize,
    pub kb_char_budget: usize,
    pub anthropic_api_key: Option<String>,
    pub llm: LlmSettings,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-20241022".to_string(),
            temperature: 0.0,
            max_tokens: 4000,
            timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_defaults = LlmSettings::default();
        Ok(Config {
            db_file: path_env("PHRASEBOOK_DB_FILE", "Master_Phrase_Library.xlsx"),
            legacy_dir: path_env("PHRASEBOOK_LEGACY_DIR", "."),
            useful_docs_dir: path_env("PHRASEBOOK_USEFUL_DOCS_DIR", "USEFUL_DOCS"),
            reports_dir: path_env("PHRASEBOOK_REPORTS_DIR", "REPORTS_TO_MINE"),
            knowledge_bank: path_env("PHRASEBOOK_KNOWLEDGE_BANK", "knowledge_bank.json"),
            min_content_length: parse_env("PHRASEBOOK_MIN_CONTENT_LENGTH", 20)?,
            mirror_to_master: parse_env("PHRASEBOOK_MIRROR_TO_MASTER", true)?,
            overwrite: parse_env("PHRASEBOOK_OVERWRITE", false)?,
            report_char_budget: parse_env("PHRASEBOOK_REPORT_CHAR_BUDGET", 100_000)?,
            kb_char_budget: parse_env("PHRASEBOOK_KB_CHAR_BUDGET", 50_000)?,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            llm: LlmSettings {
                model: std::env::var("PHRASEBOOK_LLM_MODEL").unwrap_or(llm_defaults.model),
                temperature: parse_env("PHRASEBOOK_LLM_TEMPERATURE", llm_defaults.temperature)?,
                max_tokens: parse_env("PHRASEBOOK_LLM_MAX_TOKENS", llm_defaults.max_tokens)?,
                timeout_secs: parse_env("PHRASEBOOK_LLM_TIMEOUT_SECS", llm_defaults.timeout_secs)?,
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn require_api_key(&self) -> Result<&str, PipelineError> {
        self.anthropic_api_key
            .as_deref()
            .ok_or(PipelineError::MissingCredential("ANTHROPIC_API_KEY"))
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with every path under `root`.
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Config {
            db_file: root.join("Master_Phrase_Library.xlsx"),
            legacy_dir: root.join("legacy"),
            useful_docs_dir: root.join("USEFUL_DOCS"),
            reports_dir: root.join("REPORTS_TO_MINE"),
            knowledge_bank: root.join("knowledge_bank.json"),
            min_content_length: 20,
            mirror_to_master: true,
            overwrite: false,
            report_char_budget: 100_000,
            kb_char_budget: 50_000,
            anthropic_api_key: None,
            llm: LlmSettings::default(),
            rust_log: "info".to_string(),
        }
    }
}

fn path_env(key: &str, default: &str) -> PathBuf {
    PathBuf::from(std::env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_numbers_and_bools() {
        assert_eq!(parse_value::<usize>("K", " 42 ").unwrap(), 42);
        assert!(parse_value::<bool>("K", "true").unwrap());
        assert!((parse_value::<f32>("K", "0.3").unwrap() - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_value_rejects_garbage_naming_the_variable() {
        let err = parse_value::<usize>("PHRASEBOOK_MIN_CONTENT_LENGTH", "twenty").unwrap_err();
        assert!(err.to_string().contains("PHRASEBOOK_MIN_CONTENT_LENGTH"));
    }

    #[test]
    fn test_llm_defaults_are_deterministic() {
        let llm = LlmSettings::default();
        assert_eq!(llm.temperature, 0.0);
        assert_eq!(llm.max_tokens, 4000);
    }
}
