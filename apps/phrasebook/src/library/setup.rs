use tracing::info;

use crate::config::Config;
use crate::errors::PipelineError;
use crate::library::Library;

/// Creates the blank library: `Master` plus one sheet per section, each with
/// the styled header row and dropdown validation.
pub fn run(config: &Config) -> Result<(), PipelineError> {
    initialize(&config.db_file, config.overwrite)
}

pub fn initialize(path: &std::path::Path, overwrite: bool) -> Result<(), PipelineError> {
    if path.exists() && !overwrite {
        return Err(PipelineError::DatabaseExists {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), "Creating phrase library");
    let library = Library::create(path);
    library.save()?;

    let size_kb = std::fs::metadata(path)?.len() as f64 / 1024.0;
    info!(
        "Created {} ({size_kb:.2} KB) with sheets: {}",
        path.display(),
        library.sheet_names().join(", ")
    );
    Ok(())
}
