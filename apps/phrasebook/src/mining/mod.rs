//! Mining: PDF survey reports classified by the language model into `Master`.

pub mod classifier;
pub mod prompts;

use std::path::Path;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::PipelineError;
use crate::inputs::{file_name, list_inputs};
use crate::knowledge::{self, KnowledgeBank};
use crate::library::Library;
use crate::llm_client::LlmClient;
use crate::mining::classifier::{truncate_chars, ClassifyError, LlmReportClassifier, ReportClassifier};
use crate::models::phrase::{Assembled, PhraseRecord};
use crate::schema::MASTER_SHEET;

#[derive(Debug, Default)]
pub struct MiningSummary {
    pub reports: usize,
    pub skipped_reports: usize,
    pub phrases: usize,
    pub too_short: usize,
    pub violations: usize,
}

pub async fn run(config: &Config) -> Result<MiningSummary, PipelineError> {
    if !config.db_file.exists() {
        return Err(PipelineError::DatabaseNotInitialized {
            path: config.db_file.clone(),
        });
    }
    let api_key = config.require_api_key()?;

    if !config.reports_dir.is_dir() {
        std::fs::create_dir_all(&config.reports_dir)?;
        info!("Created folder: {}", config.reports_dir.display());
        info!(
            "Place your PDF reports in {} and run `phrasebook mine` again.",
            config.reports_dir.display()
        );
        return Ok(MiningSummary::default());
    }

    let bank = knowledge::load(&config.knowledge_bank);
    let llm = LlmClient::new(api_key.to_string(), config.llm.clone()).map_err(anyhow::Error::from)?;
    info!("LLM client initialized (model: {})", llm.model());
    let classifier = LlmReportClassifier::new(llm);

    mine_reports(config, &bank, &classifier).await
}

/// Mines every PDF in the reports folder, one report at a time in filename
/// order. A report that fails at any step is logged and skipped.
pub async fn mine_reports(
    config: &Config,
    bank: &KnowledgeBank,
    classifier: &dyn ReportClassifier,
) -> Result<MiningSummary, PipelineError> {
    let mut summary = MiningSummary::default();

    let reports = list_inputs(&config.reports_dir, &["pdf"])?;
    if reports.is_empty() {
        warn!(
            "No PDF files found in {}. Add reports and run again.",
            config.reports_dir.display()
        );
        return Ok(summary);
    }
    info!("Found {} report(s) to mine", reports.len());

    let bank_json = serde_json::to_string(bank)?;
    let context = truncate_chars(&bank_json, config.kb_char_budget, "knowledge bank context");

    for path in reports {
        let name = file_name(&path);
        info!("Mining: {name}");

        let text = match knowledge::pdf_text(&path) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Skipping {name}: no text could be extracted");
                summary.skipped_reports += 1;
                continue;
            }
            Err(e) => {
                warn!("Skipping {name}: {e}");
                summary.skipped_reports += 1;
                continue;
            }
        };
        info!("Extracted {} characters", text.chars().count());

        let records = match classify_report(config, &name, &text, context, classifier, &mut summary).await
        {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping {name}: {e}");
                summary.skipped_reports += 1;
                continue;
            }
        };
        summary.reports += 1;
        if records.is_empty() {
            warn!("No phrases extracted from {name}");
            continue;
        }

        if let Err(e) = save_to_master(&config.db_file, &records) {
            error!("Could not save phrases from {name}: {e}");
            continue;
        }
        info!("Saved {} phrases to {MASTER_SHEET}", records.len());
        summary.phrases += records.len();
    }

    info!("Report mining complete");
    Ok(summary)
}

/// Sends one report through the classifier and turns the reply into
/// writable records tagged with `source_file`.
pub async fn classify_report(
    config: &Config,
    source_file: &str,
    text: &str,
    context: &str,
    classifier: &dyn ReportClassifier,
    summary: &mut MiningSummary,
) -> Result<Vec<PhraseRecord>, ClassifyError> {
    let report = truncate_chars(text, config.report_char_budget, "report text");
    info!("Sending to the classification service...");
    let mappings = classifier.classify(report, context).await?;
    info!("Classifier returned {} phrases", mappings.len());

    let mut records = Vec::with_capacity(mappings.len());
    for fields in &mappings {
        let Assembled { mut record, violations } = PhraseRecord::assemble(fields);
        for violation in &violations {
            warn!(report = source_file, "{violation}");
        }
        summary.violations += violations.len();

        record.source_file = source_file.to_string();
        if record.is_writable(config.min_content_length) {
            records.push(record);
        } else {
            summary.too_short += 1;
        }
    }
    Ok(records)
}

fn save_to_master(db_file: &Path, records: &[PhraseRecord]) -> Result<(), PipelineError> {
    let mut library = Library::open(db_file)?;
    library.append(MASTER_SHEET, records);
    library.save()
}
