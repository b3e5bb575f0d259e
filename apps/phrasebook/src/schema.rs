//! Schema Registry: the fixed column set, sheet names, value domains and
//! section keyword table shared by every stage.

/// Canonical column order. Every sheet's header row is exactly this list.
pub const COLUMNS: [&str; 9] = [
    "Section",
    "Element",
    "Sub_Section",
    "Content",
    "Condition_Rating",
    "Property_Style",
    "Property_Type",
    "Property_Age",
    "Source_File",
];

pub const MASTER_SHEET: &str = "Master";

/// Section sheets created by setup, in workbook order (after `Master`).
pub const SECTION_SHEETS: [&str; 6] = [
    "Section_D_External",
    "Section_E_Internal",
    "Section_F_Services",
    "Section_G_Grounds",
    "Sections_A-C_H_I_J_K",
    "Building_Regulations",
];

/// Bucket for harvested lines seen before any section-switching header.
pub const DEFAULT_SECTION: &str = "Sections_A-C_H_I_J_K";

/// Default element for lines seen before any header.
pub const DEFAULT_ELEMENT: &str = "General";

/// Sub-section stamped on every harvested legacy line.
pub const HARVESTED_SUB_SECTION: &str = "Standard Phrase";

/// Survey sections the classification service is asked to choose from.
pub const SURVEY_SECTIONS: [&str; 5] = ["External", "Internal", "Services", "Grounds", "Overall"];

/// Wildcard accepted by every property domain.
pub const ANY: &str = "Any";

pub const CONDITION_RATINGS: [&str; 3] = ["1", "2", "3"];

pub const PROPERTY_STYLES: [&str; 5] = ["Detached", "Semi-Detached", "Terrace", "Flat", "Bungalow"];

pub const PROPERTY_TYPES: [&str; 2] = ["Traditional", "Non-Traditional"];

/// Chronological, oldest first.
pub const PROPERTY_AGE_BANDS: [&str; 8] = [
    "Pre-1850",
    "1850-1899",
    "1900-1918",
    "1919-1945",
    "1946-1979",
    "1980-1999",
    "2000-2010",
    "2011-Present",
];

/// Header keyword → sheet name. Priority list: the first keyword contained in
/// a header wins, regardless of where it appears in the header text.
pub const SECTION_KEYWORDS: &[(&str, &str)] = &[
    ("EXTERNAL", "Section_D_External"),
    ("OUTSIDE", "Section_D_External"),
    ("INTERNAL", "Section_E_Internal"),
    ("INSIDE", "Section_E_Internal"),
    ("SERVICES", "Section_F_Services"),
    ("GROUNDS", "Section_G_Grounds"),
    ("GENERAL", "Sections_A-C_H_I_J_K"),
    ("LEGAL", "Sections_A-C_H_I_J_K"),
    ("SUMMARY", "Sections_A-C_H_I_J_K"),
    ("BUILDING REG", "Building_Regulations"),
];

/// Spreadsheet cell limit.
pub const MAX_CONTENT_LENGTH: usize = 32_767;

/// Display width for a column; unknown columns get 15.
pub fn column_width(column: &str) -> f64 {
    match column {
        "Section" => 15.0,
        "Element" => 25.0,
        "Sub_Section" => 20.0,
        "Content" => 50.0,
        "Condition_Rating" => 12.0,
        "Property_Style" => 18.0,
        "Property_Type" => 15.0,
        "Property_Age" => 18.0,
        "Source_File" => 25.0,
        _ => 15.0,
    }
}

/// Every sheet a freshly initialized database contains, `Master` first.
pub fn all_sheets() -> impl Iterator<Item = &'static str> {
    std::iter::once(MASTER_SHEET).chain(SECTION_SHEETS)
}

#[cfg(test)]
pub fn column_index(column: &str) -> Option<usize> {
    COLUMNS.iter().position(|c| *c == column)
}
