use rust_xlsxwriter::{
    Color, ColNum, DataValidation, Format, FormatAlign, FormatBorder, RowNum, Worksheet, XlsxError,
};

use crate::errors::PipelineError;
use crate::schema;

/// Last row index Excel supports; dropdowns apply down to it.
const LAST_ROW: RowNum = 1_048_575;

pub fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(11)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4472C4))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin)
}

/// Date cells carried over from an edited sheet.
pub fn date_format() -> Format {
    Format::new().set_num_format("yyyy-mm-dd hh:mm")
}

/// Allowed values per validated column. Property domains include `Any`,
/// which harvested rows carry.
fn dropdown_values(column: &str) -> Option<Vec<&'static str>> {
    let with_any = |values: &[&'static str]| {
        std::iter::once(schema::ANY)
            .chain(values.iter().copied())
            .collect::<Vec<_>>()
    };
    match column {
        "Condition_Rating" => Some(schema::CONDITION_RATINGS.to_vec()),
        "Property_Style" => Some(with_any(&schema::PROPERTY_STYLES)),
        "Property_Type" => Some(with_any(&schema::PROPERTY_TYPES)),
        "Property_Age" => Some(with_any(&schema::PROPERTY_AGE_BANDS)),
        _ => None,
    }
}

/// Column widths, a frozen header row and dropdown validation from row 2 down,
/// positioned by the sheet's own header.
pub fn apply_layout(worksheet: &mut Worksheet, header: &[String]) -> Result<(), PipelineError> {
    if !header.is_empty() {
        worksheet.set_freeze_panes(1, 0)?;
    }

    for (idx, column) in header.iter().enumerate() {
        let col = col_num(idx)?;
        worksheet.set_column_width(col, schema::column_width(column))?;

        if let Some(values) = dropdown_values(column) {
            let validation = dropdown(column, &values)?;
            worksheet.add_data_validation(1, col, LAST_ROW, col, &validation)?;
        }
    }
    Ok(())
}

fn dropdown(column: &str, values: &[&str]) -> Result<DataValidation, XlsxError> {
    DataValidation::new()
        .allow_list_strings(values)?
        .set_input_title(column)?
        .set_input_message(format!("Select from {column} list"))?
        .set_error_title("Invalid Entry")?
        .set_error_message(format!("Please select a valid {column}"))
}

pub fn row_num(idx: usize) -> Result<RowNum, PipelineError> {
    RowNum::try_from(idx)
        .ok()
        .filter(|row| *row <= LAST_ROW)
        .ok_or_else(|| PipelineError::Spreadsheet(format!("row {idx} exceeds the sheet limit")))
}

pub fn col_num(idx: usize) -> Result<ColNum, PipelineError> {
    ColNum::try_from(idx)
        .map_err(|_| PipelineError::Spreadsheet(format!("column {idx} exceeds the sheet limit")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropdowns_cover_domain_columns_only() {
        assert_eq!(dropdown_values("Condition_Rating").unwrap(), vec!["1", "2", "3"]);
        assert_eq!(dropdown_values("Property_Type").unwrap()[0], "Any");
        assert_eq!(dropdown_values("Property_Age").unwrap().len(), 9);
        assert!(dropdown_values("Content").is_none());
    }

    #[test]
    fn test_dropdown_lists_are_valid() {
        for column in schema::COLUMNS {
            if let Some(values) = dropdown_values(column) {
                assert!(dropdown(column, &values).is_ok(), "{column}");
            }
        }
    }

    #[test]
    fn test_row_limit() {
        assert_eq!(row_num(0).unwrap(), 0);
        assert!(row_num(LAST_ROW as usize + 1).is_err());
    }
}
