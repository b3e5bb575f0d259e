use std::collections::BTreeMap;
use std::fmt;

use crate::schema;

/// A partial, string-keyed record as produced by harvesting, by the
/// classification service or by reading a spreadsheet row.
pub type RawFields = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionRating {
    Good,
    Fair,
    Poor,
}

impl ConditionRating {
    /// Accepts `1`..`3`, also in the `2.0` form a numeric cell reads back as.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_end_matches(".0") {
            "1" => Some(ConditionRating::Good),
            "2" => Some(ConditionRating::Fair),
            "3" => Some(ConditionRating::Poor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionRating::Good => "1",
            ConditionRating::Fair => "2",
            ConditionRating::Poor => "3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyStyle {
    Any,
    Detached,
    SemiDetached,
    Terrace,
    Flat,
    Bungalow,
}

impl PropertyStyle {
    pub const ALL: [PropertyStyle; 6] = [
        PropertyStyle::Any,
        PropertyStyle::Detached,
        PropertyStyle::SemiDetached,
        PropertyStyle::Terrace,
        PropertyStyle::Flat,
        PropertyStyle::Bungalow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStyle::Any => schema::ANY,
            PropertyStyle::Detached => "Detached",
            PropertyStyle::SemiDetached => "Semi-Detached",
            PropertyStyle::Terrace => "Terrace",
            PropertyStyle::Flat => "Flat",
            PropertyStyle::Bungalow => "Bungalow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Any,
    Traditional,
    NonTraditional,
}

impl PropertyType {
    pub const ALL: [PropertyType; 3] = [
        PropertyType::Any,
        PropertyType::Traditional,
        PropertyType::NonTraditional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Any => schema::ANY,
            PropertyType::Traditional => "Traditional",
            PropertyType::NonTraditional => "Non-Traditional",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Construction age band, ordered oldest first (after `Any`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PropertyAge {
    Any,
    Pre1850,
    From1850To1899,
    From1900To1918,
    From1919To1945,
    From1946To1979,
    From1980To1999,
    From2000To2010,
    From2011,
}

impl PropertyAge {
    pub const ALL: [PropertyAge; 9] = [
        PropertyAge::Any,
        PropertyAge::Pre1850,
        PropertyAge::From1850To1899,
        PropertyAge::From1900To1918,
        PropertyAge::From1919To1945,
        PropertyAge::From1946To1979,
        PropertyAge::From1980To1999,
        PropertyAge::From2000To2010,
        PropertyAge::From2011,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyAge::Any => schema::ANY,
            PropertyAge::Pre1850 => "Pre-1850",
            PropertyAge::From1850To1899 => "1850-1899",
            PropertyAge::From1900To1918 => "1900-1918",
            PropertyAge::From1919To1945 => "1919-1945",
            PropertyAge::From1946To1979 => "1946-1979",
            PropertyAge::From1980To1999 => "1980-1999",
            PropertyAge::From2000To2010 => "2000-2010",
            PropertyAge::From2011 => "2011-Present",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// One standardized survey phrase, the only entity in the library.
///
/// `None` in a domain field renders as a blank cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseRecord {
    pub section: String,
    pub element: String,
    pub sub_section: String,
    pub content: String,
    pub condition_rating: Option<ConditionRating>,
    pub property_style: Option<PropertyStyle>,
    pub property_type: Option<PropertyType>,
    pub property_age: Option<PropertyAge>,
    pub source_file: String,
}

/// A value that fell outside its column's domain and was coerced during assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainViolation {
    pub column: &'static str,
    pub value: String,
}

impl fmt::Display for DomainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.column)
    }
}

/// Output of the Record Assembler.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub record: PhraseRecord,
    pub violations: Vec<DomainViolation>,
}

impl PhraseRecord {
    /// Record Assembler. Total over any string-keyed input: missing columns
    /// become blank, unknown keys are dropped, out-of-domain values are coerced
    /// (rating to blank, property fields to `Any`) and reported.
    pub fn assemble(fields: &RawFields) -> Assembled {
        let mut violations = Vec::new();
        let text = |column: &str| {
            fields
                .get(column)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let rating = text("Condition_Rating");
        let condition_rating = domain(
            &rating,
            "Condition_Rating",
            &mut violations,
            ConditionRating::parse,
            None,
        );
        let style = text("Property_Style");
        let property_style = domain(
            &style,
            "Property_Style",
            &mut violations,
            PropertyStyle::parse,
            Some(PropertyStyle::Any),
        );
        let ptype = text("Property_Type");
        let property_type = domain(
            &ptype,
            "Property_Type",
            &mut violations,
            PropertyType::parse,
            Some(PropertyType::Any),
        );
        let age = text("Property_Age");
        let property_age = domain(
            &age,
            "Property_Age",
            &mut violations,
            PropertyAge::parse,
            Some(PropertyAge::Any),
        );

        Assembled {
            record: PhraseRecord {
                section: text("Section"),
                element: text("Element"),
                sub_section: text("Sub_Section"),
                content: text("Content"),
                condition_rating,
                property_style,
                property_type,
                property_age,
                source_file: text("Source_File"),
            },
            violations,
        }
    }

    /// A content line harvested from a legacy document: unrated, every
    /// property domain `Any`.
    pub fn harvested(section: &str, element: &str, content: &str, source_file: &str) -> Self {
        PhraseRecord {
            section: section.to_string(),
            element: element.to_string(),
            sub_section: schema::HARVESTED_SUB_SECTION.to_string(),
            content: content.to_string(),
            condition_rating: None,
            property_style: Some(PropertyStyle::Any),
            property_type: Some(PropertyType::Any),
            property_age: Some(PropertyAge::Any),
            source_file: source_file.to_string(),
        }
    }

    /// Assembles a record from a spreadsheet row laid out under `header`.
    #[cfg(test)]
    pub fn from_row(header: &[String], row: &[String]) -> Assembled {
        let fields: RawFields = header
            .iter()
            .zip(row.iter())
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();
        Self::assemble(&fields)
    }

    /// Content is non-empty and at least `min_chars` long.
    pub fn is_writable(&self, min_chars: usize) -> bool {
        let len = self.content.chars().count();
        len > 0 && len >= min_chars
    }

    /// Cells in canonical column order.
    #[cfg(test)]
    pub fn to_row(&self) -> Vec<String> {
        schema::COLUMNS.iter().map(|column| self.field(column)).collect()
    }

    pub fn field(&self, column: &str) -> String {
        match column {
            "Section" => self.section.clone(),
            "Element" => self.element.clone(),
            "Sub_Section" => self.sub_section.clone(),
            "Content" => self.content.clone(),
            "Condition_Rating" => opt_str(self.condition_rating.map(|r| r.as_str())),
            "Property_Style" => opt_str(self.property_style.map(|s| s.as_str())),
            "Property_Type" => opt_str(self.property_type.map(|t| t.as_str())),
            "Property_Age" => opt_str(self.property_age.map(|a| a.as_str())),
            "Source_File" => self.source_file.clone(),
            _ => String::new(),
        }
    }
}

fn opt_str(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Blank input stays blank; anything else must parse or is coerced to `fallback`.
fn domain<T>(
    value: &str,
    column: &'static str,
    violations: &mut Vec<DomainViolation>,
    parse: impl Fn(&str) -> Option<T>,
    fallback: Option<T>,
) -> Option<T> {
    if value.is_empty() {
        return None;
    }
    match parse(value) {
        Some(v) => Some(v),
        None => {
            violations.push(DomainViolation {
                column,
                value: value.to_string(),
            });
            fallback
        }
    }
}
