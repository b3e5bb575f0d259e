use std::path::{Path, PathBuf};

use crate::errors::PipelineError;

/// Regular files in `dir` with one of `extensions` (case-insensitive, no dot),
/// sorted by name. Lock files (`~…`) and hidden files (`.…`) are skipped.
pub fn list_inputs(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || is_lock_or_hidden(&path) {
            continue;
        }
        if extension_of(&path).is_some_and(|ext| extensions.contains(&ext.as_str())) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Lowercased extension without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_lock_or_hidden(path: &Path) -> bool {
    let name = file_name(path);
    name.starts_with('~') || name.starts_with('.')
}
