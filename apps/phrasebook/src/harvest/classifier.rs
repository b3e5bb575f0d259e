use crate::schema::SECTION_KEYWORDS;

/// Maps header text to a section sheet by keyword.
///
/// The table is a priority list: the first entry whose keyword occurs in the
/// uppercased header wins, even when a later keyword appears earlier in the text.
#[derive(Debug, Clone, Copy)]
pub struct SectionClassifier {
    keywords: &'static [(&'static str, &'static str)],
}

impl Default for SectionClassifier {
    fn default() -> Self {
        Self::new(SECTION_KEYWORDS)
    }
}

impl SectionClassifier {
    pub fn new(keywords: &'static [(&'static str, &'static str)]) -> Self {
        Self { keywords }
    }

    /// `None` when no keyword matches; the caller keeps its current section.
    pub fn classify(&self, header: &str) -> Option<&'static str> {
        let upper = header.to_uppercase();
        self.keywords
            .iter()
            .find(|(keyword, _)| upper.contains(*keyword))
            .map(|(_, section)| *section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let classifier = SectionClassifier::default();
        assert_eq!(classifier.classify("Section D external"), Some("Section_D_External"));
        assert_eq!(classifier.classify("Inside the property"), Some("Section_E_Internal"));
        assert_eq!(classifier.classify("Building Regulations"), Some("Building_Regulations"));
    }

    #[test]
    fn test_no_match_returns_none() {
        assert_eq!(SectionClassifier::default().classify("Chimney Stacks"), None);
    }

    #[test]
    fn test_declaration_order_beats_text_position() {
        // LEGAL appears first in the text, EXTERNAL first in the table.
        let classifier = SectionClassifier::default();
        assert_eq!(
            classifier.classify("Legal matters and external works"),
            Some("Section_D_External")
        );
    }

    #[test]
    fn test_custom_order_changes_the_winner() {
        const LEGAL_FIRST: &[(&str, &str)] = &[
            ("LEGAL", "Sections_A-C_H_I_J_K"),
            ("EXTERNAL", "Section_D_External"),
        ];
        let classifier = SectionClassifier::new(LEGAL_FIRST);
        assert_eq!(
            classifier.classify("External legal issues"),
            Some("Sections_A-C_H_I_J_K")
        );
    }

    #[test]
    fn test_multi_word_keyword() {
        let classifier = SectionClassifier::default();
        assert_eq!(classifier.classify("Building regs approval"), Some("Building_Regulations"));
        assert_eq!(classifier.classify("Building"), None);
    }
}
