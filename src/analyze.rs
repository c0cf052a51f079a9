use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    clean::{ColumnCleaner, ColumnReport},
    error::{PipelineError, Result},
    formats::{self, LoadOptions},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileReport {
    pub file: PathBuf,
    pub total_rows: usize,
    pub total_columns: usize,
    /// Only the columns that need at least one cleaning operation.
    pub columns: Vec<ColumnReport>,
}

impl FileReport {
    pub fn needs_cleaning(&self) -> bool {
        !self.columns.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DirectoryReport {
    pub directory: PathBuf,
    pub total_files: usize,
    pub files_needing_cleaning: usize,
    pub files: Vec<FileReport>,
}

pub fn analyze_file(path: &Path) -> Result<FileReport> {
    analyze_file_with(path, &LoadOptions::default(), &ColumnCleaner::default())
}

pub fn analyze_file_with(
    path: &Path,
    options: &LoadOptions,
    cleaner: &ColumnCleaner,
) -> Result<FileReport> {
    let table = formats::load_table(path, options)?;
    let columns = cleaner
        .analyze(&table)
        .into_iter()
        .filter(|report| report.needs_cleaning)
        .collect();
    Ok(FileReport {
        file: path.to_path_buf(),
        total_rows: table.row_count(),
        total_columns: table.column_count(),
        columns,
    })
}

pub fn analyze_directory(directory: &Path) -> Result<DirectoryReport> {
    analyze_directory_with(directory, &LoadOptions::default(), &ColumnCleaner::default())
}

/// Scans every `.csv` file directly inside `directory`, in path order.
/// `files` keeps only the reports with columns to clean; `total_files`
/// counts every scanned file.
pub fn analyze_directory_with(
    directory: &Path,
    options: &LoadOptions,
    cleaner: &ColumnCleaner,
) -> Result<DirectoryReport> {
    if !directory.is_dir() {
        return Err(PipelineError::Directory {
            path: directory.to_path_buf(),
            reason: "is not a directory".to_string(),
        });
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::new();
    for path in &paths {
        let report = analyze_file_with(path, options, cleaner)?;
        if report.needs_cleaning() {
            files.push(report);
        }
    }
    Ok(DirectoryReport {
        directory: directory.to_path_buf(),
        total_files: paths.len(),
        files_needing_cleaning: files.len(),
        files,
    })
}
