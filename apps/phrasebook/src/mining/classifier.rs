//! Report classification: the seam between the mining stage and the
//! language-model service.
//!
//! `LlmReportClassifier` is the production backend. Tests drive mining with a
//! stub implementation instead of a live model.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::mining::prompts::{MINING_PROMPT_TEMPLATE, MINING_SYSTEM};
use crate::models::phrase::RawFields;
use crate::schema::{PROPERTY_AGE_BANDS, PROPERTY_STYLES, PROPERTY_TYPES, SURVEY_SECTIONS};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification service failed: {0}")]
    Service(#[from] LlmError),

    /// The reply was discarded wholesale.
    #[error("classification response rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ReportClassifier: Send + Sync {
    /// Classifies already-truncated report text against a knowledge-bank
    /// context blob. Each mapping is keyed by column name, without `Source_File`.
    async fn classify(&self, report: &str, context: &str) -> Result<Vec<RawFields>, ClassifyError>;
}

pub struct LlmReportClassifier {
    llm: LlmClient,
}

impl LlmReportClassifier {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ReportClassifier for LlmReportClassifier {
    async fn classify(&self, report: &str, context: &str) -> Result<Vec<RawFields>, ClassifyError> {
        let prompt = build_prompt(report, context);
        debug!(model = self.llm.model(), prompt_chars = prompt.len(), "Sending report");
        let response = self.llm.call(&prompt, MINING_SYSTEM).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        parse_response(text)
    }
}

/// Fills the template slots. The report and knowledge-bank text are inserted
/// last and never rescanned, so braces inside them survive verbatim.
pub fn build_prompt(report: &str, context: &str) -> String {
    let (head, tail) = MINING_PROMPT_TEMPLATE
        .split_once("{report_text}")
        .unwrap_or((MINING_PROMPT_TEMPLATE, ""));
    let fill = |part: &str| {
        let filled = part
            .replace("{sections}", &quoted_list(&SURVEY_SECTIONS))
            .replace("{styles}", &quoted_list(&PROPERTY_STYLES))
            .replace("{types}", &quoted_list(&PROPERTY_TYPES))
            .replace("{ages}", &quoted_list(&PROPERTY_AGE_BANDS));
        match filled.split_once("{kb_context}") {
            Some((before, after)) => format!("{before}{context}{after}"),
            None => filled,
        }
    };
    format!("{}{report}{}", fill(head), fill(tail))
}

fn quoted_list(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses a classification reply. Anything other than a JSON array is
/// rejected; array elements that are not objects are skipped.
pub fn parse_response(text: &str) -> Result<Vec<RawFields>, ClassifyError> {
    let cleaned = strip_json_fences(text);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        let preview: String = cleaned.chars().take(200).collect();
        ClassifyError::Rejected(format!("not valid JSON ({e}); starts with: {preview}"))
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ClassifyError::Rejected(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut mappings = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(object) => mappings.push(
                object
                    .into_iter()
                    .map(|(key, value)| (key, value_to_cell(value)))
                    .collect(),
            ),
            other => warn!("Skipping item {idx}: expected an object, got {}", json_kind(&other)),
        }
    }
    Ok(mappings)
}

fn value_to_cell(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Keeps at most `budget` characters. Truncation is lossy and always logged.
pub fn truncate_chars<'a>(text: &'a str, budget: usize, what: &str) -> &'a str {
    match text.char_indices().nth(budget) {
        Some((cut, _)) => {
            warn!(
                original_chars = text.chars().count(),
                kept_chars = budget,
                "Truncating {what}; text beyond the budget is not sent"
            );
            &text[..cut]
        }
        None => text,
    }
}
