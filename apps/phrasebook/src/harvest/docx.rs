//! Paragraph reader for `.docx` files.
//!
//! Streams `word/document.xml` out of the zip container and yields body
//! paragraphs with their runs' text and bold flag. Paragraphs inside tables
//! are not body paragraphs and are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::PipelineError;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    #[cfg(test)]
    pub fn plain(text: &str) -> Self {
        Self {
            runs: vec![Run {
                text: text.to_string(),
                bold: false,
            }],
        }
    }

    #[cfg(test)]
    pub fn bold(text: &str) -> Self {
        Self {
            runs: vec![Run {
                text: text.to_string(),
                bold: true,
            }],
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn has_bold_run(&self) -> bool {
        self.runs.iter().any(|r| r.bold)
    }
}

/// Reads every body paragraph of a `.docx` file, in document order.
pub fn read_paragraphs(path: &Path) -> Result<Vec<Paragraph>, PipelineError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let document_error = |reason: String| PipelineError::Document {
        file: file_name.clone(),
        reason,
    };

    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| document_error(format!("not a valid .docx ({e})")))?;
    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| document_error(format!("missing {DOCUMENT_PART} ({e})")))?;

    parse_document_xml(BufReader::new(part)).map_err(|e| document_error(e.to_string()))
}

/// Parses WordprocessingML body XML into paragraphs.
pub fn parse_document_xml<R: BufRead>(source: R) -> Result<Vec<Paragraph>, quick_xml::Error> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut table_depth = 0usize;
    let mut paragraph_depth = 0usize;
    let mut current = Paragraph::default();
    let mut run: Option<Run> = None;
    let mut in_run_props = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"p" if table_depth == 0 => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        current = Paragraph::default();
                    }
                }
                // Paragraphs nested inside a run (text boxes) push the depth
                // past 1; nothing inside them belongs to the outer run.
                b"r" if paragraph_depth == 1 => {
                    run = Some(Run {
                        text: String::new(),
                        bold: false,
                    })
                }
                b"rPr" if paragraph_depth == 1 && run.is_some() => in_run_props = true,
                b"b" if paragraph_depth == 1 && in_run_props => set_bold(&mut run, &e),
                b"t" if paragraph_depth == 1 && run.is_some() => in_text = true,
                _ => {}
            },
            Event::Empty(e) if paragraph_depth <= 1 => match e.local_name().as_ref() {
                b"b" if in_run_props => set_bold(&mut run, &e),
                b"tab" => push_text(&mut run, "\t"),
                b"br" | b"cr" => push_text(&mut run, " "),
                b"p" if table_depth == 0 && paragraph_depth == 0 => {
                    paragraphs.push(Paragraph::default())
                }
                _ => {}
            },
            Event::Text(e) if in_text => {
                let text = e.unescape()?;
                push_text(&mut run, &text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"p" if table_depth == 0 && paragraph_depth > 0 => {
                    paragraph_depth -= 1;
                    if paragraph_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                b"r" if paragraph_depth == 1 => {
                    if let Some(finished) = run.take() {
                        current.runs.push(finished);
                    }
                    in_run_props = false;
                }
                b"rPr" if paragraph_depth == 1 => in_run_props = false,
                b"t" if paragraph_depth == 1 => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn push_text(run: &mut Option<Run>, text: &str) {
    if let Some(run) = run.as_mut() {
        run.text.push_str(text);
    }
}

/// `<w:b/>` turns bold on; `w:val` of `0`, `false` or `off` turns it off.
fn set_bold(run: &mut Option<Run>, element: &BytesStart<'_>) {
    let Some(run) = run.as_mut() else { return };
    let disabled = element
        .try_get_attribute("w:val")
        .ok()
        .flatten()
        .map(|attr| matches!(attr.value.as_ref(), b"0" | b"false" | b"off"))
        .unwrap_or(false);
    run.bold = !disabled;
}
