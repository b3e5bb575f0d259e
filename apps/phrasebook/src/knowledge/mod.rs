//! Knowledge bank: reference documents scraped to text, keyed by filename.
//!
//! Built once by `build-kb`, read back as classification context by `mine`.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::errors::PipelineError;
use crate::harvest::docx;
use crate::harvest::extractor::clean_text;
use crate::inputs::{extension_of, file_name, list_inputs};

pub type KnowledgeBank = BTreeMap<String, String>;

const REFERENCE_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];

pub fn run(config: &Config) -> Result<KnowledgeBank, PipelineError> {
    if !config.useful_docs_dir.is_dir() {
        return Err(PipelineError::MissingInput {
            what: "reference documents (standards, guidance PDFs/DOCXs)",
            path: config.useful_docs_dir.clone(),
        });
    }

    info!("Scanning {}", config.useful_docs_dir.display());
    let bank = build(&config.useful_docs_dir)?;

    let json = serde_json::to_string_pretty(&bank)?;
    std::fs::write(&config.knowledge_bank, json)?;

    let total_chars: usize = bank.values().map(|t| t.chars().count()).sum();
    info!(
        documents = bank.len(),
        total_chars,
        "Knowledge bank written to {}",
        config.knowledge_bank.display()
    );
    Ok(bank)
}

/// Extracts text from every supported document in `dir`, filename order.
/// Unreadable or empty documents are left out.
pub fn build(dir: &Path) -> Result<KnowledgeBank, PipelineError> {
    let mut bank = KnowledgeBank::new();

    for path in list_inputs(dir, &REFERENCE_EXTENSIONS)? {
        let name = file_name(&path);
        let text = match extension_of(&path).as_deref() {
            Some("pdf") => {
                info!("PDF: {name}");
                pdf_text(&path)
            }
            Some("docx") => {
                info!("DOCX: {name}");
                docx_text(&path)
            }
            _ => {
                warn!("Skipping {name}: legacy .doc files are not supported, save it as .docx");
                continue;
            }
        };

        let text = match text {
            Ok(text) => clean_text(&text),
            Err(e) => {
                warn!("Could not read {name}: {e}");
                continue;
            }
        };
        if text.is_empty() {
            warn!("No text extracted from {name}");
            continue;
        }
        bank.insert(name, text);
    }
    Ok(bank)
}

/// Reads a knowledge bank file. A missing or unreadable bank is not fatal:
/// mining proceeds without reference context.
pub fn load(path: &Path) -> KnowledgeBank {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Knowledge bank {} not found. Run `phrasebook build-kb` first, \
                 or mining will work without reference context.",
                path.display()
            );
            return KnowledgeBank::new();
        }
        Err(e) => {
            warn!(
                "Cannot read knowledge bank {} ({e}); mining will work without reference context.",
                path.display()
            );
            return KnowledgeBank::new();
        }
    };
    match serde_json::from_str::<KnowledgeBank>(&raw) {
        Ok(bank) => {
            info!("Loaded knowledge bank with {} reference documents", bank.len());
            bank
        }
        Err(e) => {
            warn!("Ignoring malformed knowledge bank {}: {e}", path.display());
            KnowledgeBank::new()
        }
    }
}

/// Extracts the text layer of a PDF. The extractor panics on some malformed
/// files; that is reported as a document error like any other parse failure.
pub fn pdf_text(path: &Path) -> Result<String, PipelineError> {
    let document_error = |reason: String| PipelineError::Document {
        file: file_name(path),
        reason,
    };
    match std::panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(document_error(e.to_string())),
        Err(_) => Err(document_error("the PDF parser gave up on this file".to_string())),
    }
}

/// Non-blank paragraphs joined with newlines.
fn docx_text(path: &Path) -> Result<String, PipelineError> {
    let paragraphs = docx::read_paragraphs(path)?;
    Ok(paragraphs
        .iter()
        .map(|p| p.text())
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::docx::tests::write_docx;

    #[test]
    fn test_build_reads_docx_and_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        write_docx(
            &dir.path().join("Guidance.docx"),
            r#"<w:p><w:r><w:t>Damp   proofing</w:t></w:r></w:p>
               <w:p/>
               <w:p><w:r><w:t>courses must be  visible.</w:t></w:r></w:p>"#,
        );
        std::fs::write(dir.path().join("Old.doc"), b"binary").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        std::fs::write(dir.path().join("broken.docx"), b"not a zip").unwrap();

        let bank = build(dir.path()).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(
            bank["Guidance.docx"],
            "Damp proofing courses must be visible."
        );
    }

    #[test]
    fn test_build_skips_empty_documents() {
        let dir = tempfile::tempdir().unwrap();
        write_docx(&dir.path().join("Blank.docx"), "<w:p/>");
        assert!(build(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_run_requires_reference_folder() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        let err = run(&config).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }

    #[test]
    fn test_run_writes_loadable_bank() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        std::fs::create_dir(&config.useful_docs_dir).unwrap();
        write_docx(
            &config.useful_docs_dir.join("Regs.docx"),
            "<w:p><w:r><w:t>Part L applies.</w:t></w:r></w:p>",
        );

        run(&config).unwrap();
        let bank = load(&config.knowledge_bank);
        assert_eq!(bank.get("Regs.docx").map(String::as_str), Some("Part L applies."));
    }

    #[test]
    fn test_load_missing_or_malformed_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge_bank.json");
        assert!(load(&path).is_empty());

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(load(&path).is_empty());
    }

    #[test]
    fn test_load_unreadable_path_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge_bank.json");
        std::fs::create_dir(&path).unwrap();
        assert!(load(&path).is_empty());
    }
}
