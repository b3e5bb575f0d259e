use std::path::PathBuf;

use thiserror::Error;

/// Pipeline-level error type.
/// Missing-precondition variants carry a remedy the operator can act on.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Database not initialized: {} does not exist", path.display())]
    DatabaseNotInitialized { path: PathBuf },

    #[error("Database already exists: {}", path.display())]
    DatabaseExists { path: PathBuf },

    #[error("Missing {what}: {} does not exist", path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("Required credential '{0}' is not set")]
    MissingCredential(&'static str),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Could not read {file}: {reason}")]
    Document { file: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    /// Instruction for the operator when a stage cannot start.
    /// `None` for failures that are not a missing precondition.
    pub fn remedy(&self) -> Option<String> {
        match self {
            PipelineError::DatabaseNotInitialized { .. } => {
                Some("Run `phrasebook setup` first to create the database.".to_string())
            }
            PipelineError::DatabaseExists { .. } => Some(
                "Remove the file or set PHRASEBOOK_OVERWRITE=true to recreate it.".to_string(),
            ),
            PipelineError::MissingInput { what, path } => Some(format!(
                "Create {} and add your {what} to it, then run this stage again.",
                path.display()
            )),
            PipelineError::MissingCredential(name) => Some(format!(
                "Set the environment variable: export {name}='your-key' (or add it to .env)."
            )),
            _ => None,
        }
    }

    pub fn is_precondition(&self) -> bool {
        self.remedy().is_some()
    }
}

impl From<calamine::XlsxError> for PipelineError {
    fn from(e: calamine::XlsxError) -> Self {
        PipelineError::Spreadsheet(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for PipelineError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        PipelineError::Spreadsheet(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_not_initialized_points_to_setup() {
        let err = PipelineError::DatabaseNotInitialized {
            path: PathBuf::from("Master_Phrase_Library.xlsx"),
        };
        assert!(err.is_precondition());
        assert!(err.remedy().unwrap().contains("phrasebook setup"));
        assert!(err.to_string().contains("Master_Phrase_Library.xlsx"));
    }

    #[test]
    fn test_missing_input_names_the_folder() {
        let err = PipelineError::MissingInput {
            what: "reference documents",
            path: PathBuf::from("USEFUL_DOCS"),
        };
        let remedy = err.remedy().unwrap();
        assert!(remedy.contains("USEFUL_DOCS"));
        assert!(remedy.contains("reference documents"));
    }

    #[test]
    fn test_spreadsheet_error_is_not_a_precondition() {
        let err = PipelineError::Spreadsheet("bad zip".to_string());
        assert!(!err.is_precondition());
    }
}
