//! Harvesting: legacy "standard phrase" Word documents into the library.

pub mod classifier;
pub mod docx;
pub mod extractor;

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::errors::PipelineError;
use crate::harvest::classifier::SectionClassifier;
use crate::inputs::{file_name, list_inputs};
use crate::library::Library;
use crate::models::phrase::PhraseRecord;
use crate::schema::MASTER_SHEET;

#[derive(Debug, Default)]
pub struct HarvestSummary {
    pub documents: usize,
    pub skipped_documents: usize,
    pub phrases: usize,
    pub too_short: usize,
    pub sheets: Vec<(String, usize)>,
}

pub fn run(config: &Config) -> Result<HarvestSummary, PipelineError> {
    if !config.db_file.exists() {
        return Err(PipelineError::DatabaseNotInitialized {
            path: config.db_file.clone(),
        });
    }
    if !config.legacy_dir.is_dir() {
        return Err(PipelineError::MissingInput {
            what: "legacy phrase documents",
            path: config.legacy_dir.clone(),
        });
    }

    let mut summary = HarvestSummary::default();
    let records = harvest_dir(&config.legacy_dir, &mut summary)?;

    let (records, too_short): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| r.is_writable(config.min_content_length));
    summary.too_short = too_short.len();
    if summary.too_short > 0 {
        info!(
            dropped = summary.too_short,
            min_chars = config.min_content_length,
            "Dropped phrases below the minimum length"
        );
    }

    if records.is_empty() {
        warn!("No phrases found. Check your .docx files.");
        return Ok(summary);
    }

    info!("Saving {} phrases to {}", records.len(), config.db_file.display());
    let mut library = Library::open(&config.db_file)?;
    summary.sheets = library.append_by_section(&records);
    for (sheet, count) in &summary.sheets {
        info!("Added {count} rows to '{sheet}'");
    }
    if config.mirror_to_master {
        library.append(MASTER_SHEET, &records);
        info!("Added {} rows to '{MASTER_SHEET}'", records.len());
    }
    library.save()?;

    summary.phrases = records.len();
    info!("Legacy phrases imported");
    Ok(summary)
}

/// Extracts every `.docx` in `dir`, one fresh cursor per document. A document
/// that cannot be read is logged and skipped.
pub fn harvest_dir(
    dir: &Path,
    summary: &mut HarvestSummary,
) -> Result<Vec<PhraseRecord>, PipelineError> {
    let classifier = SectionClassifier::default();
    let mut records = Vec::new();

    for path in list_inputs(dir, &["docx"])? {
        let name = file_name(&path);
        info!("Processing {name}...");
        let paragraphs = match docx::read_paragraphs(&path) {
            Ok(paragraphs) => paragraphs,
            Err(e) => {
                warn!("Skipping {name}: {e}");
                summary.skipped_documents += 1;
                continue;
            }
        };
        let extracted = extractor::extract(&paragraphs, &name, &classifier);
        info!(document = %name, phrases = extracted.len(), "Document harvested");
        summary.documents += 1;
        records.extend(extracted);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::docx::tests::write_docx;
    use crate::library::setup::initialize;
    use crate::schema::DEFAULT_SECTION;

    const LEGACY_BODY: &str = r#"
        <w:p><w:r><w:rPr><w:b/></w:rPr><w:t>SECTION D EXTERNAL</w:t></w:r></w:p>
        <w:p><w:r><w:t>External walls are rendered and painted throughout.</w:t></w:r></w:p>
        <w:p><w:r><w:t>4.1 Chimney Stacks</w:t></w:r></w:p>
        <w:p><w:r><w:t>Mortar joints to the stack show wear.</w:t></w:r></w:p>
        <w:p><w:r><w:t>Short.</w:t></w:r></w:p>"#;

    #[test]
    fn test_run_requires_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        let err = run(&config).unwrap_err();
        assert!(matches!(err, PipelineError::DatabaseNotInitialized { .. }));
    }

    #[test]
    fn test_run_requires_legacy_folder() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        initialize(&config.db_file, false).unwrap();
        let err = run(&config).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }

    #[test]
    fn test_run_appends_to_section_sheets_and_master() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        initialize(&config.db_file, false).unwrap();
        std::fs::create_dir(&config.legacy_dir).unwrap();
        write_docx(&config.legacy_dir.join("Fast Texts.docx"), LEGACY_BODY);
        std::fs::write(config.legacy_dir.join("broken.docx"), b"not a zip").unwrap();

        let summary = run(&config).unwrap();
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.skipped_documents, 1);
        assert_eq!(summary.phrases, 2);
        assert_eq!(summary.too_short, 1);

        let library = Library::open(&config.db_file).unwrap();
        let external: Vec<_> = library
            .records("Section_D_External")
            .into_iter()
            .map(|a| a.record)
            .collect();
        assert_eq!(external.len(), 2);
        assert_eq!(external[0].element, "Section D External");
        assert_eq!(external[1].element, "Chimney Stacks");
        assert_eq!(external[1].source_file, "Fast Texts.docx");
        assert_eq!(library.records(MASTER_SHEET).len(), 2);
        assert!(library.records(DEFAULT_SECTION).is_empty());
    }

    #[test]
    fn test_min_length_filter_counts_drops() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::rooted_at(dir.path());
        config.min_content_length = 45;
        config.mirror_to_master = false;
        initialize(&config.db_file, false).unwrap();
        std::fs::create_dir(&config.legacy_dir).unwrap();
        write_docx(&config.legacy_dir.join("Fast Texts.docx"), LEGACY_BODY);

        let summary = run(&config).unwrap();
        assert_eq!(summary.phrases, 1);
        assert_eq!(summary.too_short, 2);
        let library = Library::open(&config.db_file).unwrap();
        assert!(library.records(MASTER_SHEET).is_empty());
    }
}
