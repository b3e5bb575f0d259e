//! Document Extractor: splits a legacy document into header and content
//! lines and tags each content line with the section/element in effect.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::harvest::classifier::SectionClassifier;
use crate::harvest::docx::Paragraph;
use crate::models::phrase::PhraseRecord;
use crate::schema::{DEFAULT_ELEMENT, DEFAULT_SECTION};

/// Lines shorter than this are noise.
pub const MIN_LINE_CHARS: usize = 5;
/// Headers are short; a long bold or numbered line is content.
pub const MAX_HEADER_CHARS: usize = 60;

/// Headers like "4.1 Chimney Stacks" or "D1 - Roof".
fn header_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([A-Z]?\d+[.\-]?\d*)\s+[:\-]?\s*(.*)").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Noise,
    Header { title: String },
    Content(String),
}

/// Classifies one paragraph without touching any cursor state.
pub fn classify_line(paragraph: &Paragraph) -> Line {
    let text = clean_text(&paragraph.text());
    let len = text.chars().count();
    if len < MIN_LINE_CHARS {
        return Line::Noise;
    }

    let captured_title = header_pattern()
        .captures(&text)
        .map(|caps| caps.get(2).map_or("", |m| m.as_str()).to_string());
    let looks_like_header = captured_title.is_some() || paragraph.has_bold_run();

    if looks_like_header && len < MAX_HEADER_CHARS {
        let title = match captured_title {
            Some(title) if !title.is_empty() => title,
            _ => text,
        };
        Line::Header { title }
    } else {
        Line::Content(text)
    }
}

/// Per-document extraction state. A fresh cursor starts every document in the
/// default bucket under `General`; nothing carries over between documents.
pub struct DocumentCursor<'a> {
    classifier: &'a SectionClassifier,
    source_file: String,
    section: &'static str,
    element: String,
}

impl<'a> DocumentCursor<'a> {
    pub fn new(classifier: &'a SectionClassifier, source_file: &str) -> Self {
        Self {
            classifier,
            source_file: source_file.to_string(),
            section: DEFAULT_SECTION,
            element: DEFAULT_ELEMENT.to_string(),
        }
    }

    #[cfg(test)]
    pub fn section(&self) -> &str {
        self.section
    }

    #[cfg(test)]
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Advances over one paragraph; returns a record only for content lines.
    pub fn feed(&mut self, paragraph: &Paragraph) -> Option<PhraseRecord> {
        match classify_line(paragraph) {
            Line::Noise => None,
            Line::Header { title } => {
                if let Some(section) = self.classifier.classify(&title) {
                    self.section = section;
                }
                self.element = title_case(&title);
                debug!(
                    element = %self.element,
                    sheet = self.section,
                    "Found element"
                );
                None
            }
            Line::Content(text) => Some(PhraseRecord::harvested(
                self.section,
                &self.element,
                &text,
                &self.source_file,
            )),
        }
    }
}

/// Runs a fresh cursor over a whole document.
pub fn extract(
    paragraphs: &[Paragraph],
    source_file: &str,
    classifier: &SectionClassifier,
) -> Vec<PhraseRecord> {
    let mut cursor = DocumentCursor::new(classifier, source_file);
    paragraphs.iter().filter_map(|p| cursor.feed(p)).collect()
}

/// Collapses whitespace runs to single spaces and trims.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercases the first letter of every letter run and lowercases the rest,
/// so "CHIMNEY STACKS" and "chimney stacks" both become "Chimney Stacks".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
