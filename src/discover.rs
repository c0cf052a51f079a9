use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{PipelineError, Result},
    formats::SUPPORTED_EXTENSIONS,
};

pub const DEFAULT_MERGED_OUTPUT_NAME: &str = "merged_clean_data.csv";
pub const DEFAULT_RESULTS_NAME: &str = "results.csv";
pub const DEFAULT_EXCLUDED_NAMES: &[&str] = &[
    "__init__.py",
    DEFAULT_MERGED_OUTPUT_NAME,
    DEFAULT_RESULTS_NAME,
];

/// Lists the supported data files directly inside `directory`, skipping the
/// default exclusions and any file name in `excluded`. Paths are sorted.
pub fn discover_files<S: AsRef<str>>(directory: &Path, excluded: &[S]) -> Result<Vec<PathBuf>> {
    if !directory.exists() {
        return Err(PipelineError::Directory {
            path: directory.to_path_buf(),
            reason: "does not exist".to_string(),
        });
    }
    if !directory.is_dir() {
        return Err(PipelineError::Directory {
            path: directory.to_path_buf(),
            reason: "is not a directory".to_string(),
        });
    }

    let excluded: HashSet<&str> = DEFAULT_EXCLUDED_NAMES
        .iter()
        .copied()
        .chain(excluded.iter().map(|name| AsRef::<str>::as_ref(name)))
        .collect();

    let mut discovered = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() || !has_supported_extension(&path) {
            continue;
        }
        let excluded_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| excluded.contains(name));
        if !excluded_name {
            discovered.push(path);
        }
    }
    discovered.sort();
    Ok(discovered)
}

pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}
