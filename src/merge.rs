//! Discovery, loading, cleaning, and outer-join merging of many files into
//! one table keyed by a customer identifier.
//!
//! Files are processed strictly in order. A file without an identifier
//! column, or one that fails anywhere between loading and folding, is skipped
//! and the merge moves on; only an empty input list or a run where no file
//! contributes is an error. Callers that need to know what was skipped use
//! [`DatasetMerger::merge_with_diagnostics`].

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    clean::ColumnCleaner,
    discover::discover_files,
    error::{PipelineError, Result},
    formats::{self, LoadOptions},
    identify::{DEFAULT_JOIN_KEY, IdentifierDetector},
    io_utils::{self, DEFAULT_CSV_DELIMITER},
    join::{self, is_duplicate_marker},
    table::Table,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeSource {
    Directory(PathBuf),
    Files(Vec<PathBuf>),
}

impl From<PathBuf> for MergeSource {
    fn from(path: PathBuf) -> Self {
        MergeSource::Directory(path)
    }
}

impl From<&Path> for MergeSource {
    fn from(path: &Path) -> Self {
        MergeSource::Directory(path.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for MergeSource {
    fn from(paths: Vec<PathBuf>) -> Self {
        MergeSource::Files(paths)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub output_path: Option<PathBuf>,
    pub clean: bool,
    pub join_key: String,
    pub excluded: Vec<String>,
    pub load: LoadOptions,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            output_path: None,
            clean: true,
            join_key: DEFAULT_JOIN_KEY.to_string(),
            excluded: Vec::new(),
            load: LoadOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoIdentifier,
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoIdentifier => f.write_str("no identifier column"),
            SkipReason::Failed(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: Table,
    pub contributed: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub dropped_columns: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DatasetMerger {
    options: MergeOptions,
    cleaner: ColumnCleaner,
    detector: IdentifierDetector,
}

impl DatasetMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            cleaner: ColumnCleaner::default(),
            detector: IdentifierDetector::default(),
        }
    }

    pub fn with_detector(mut self, detector: IdentifierDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn merge(&self, source: MergeSource) -> Result<Table> {
        self.merge_with_diagnostics(source).map(|outcome| outcome.table)
    }

    pub fn merge_with_diagnostics(&self, source: MergeSource) -> Result<MergeOutcome> {
        let paths = self.resolve_paths(source)?;
        if paths.is_empty() {
            return Err(PipelineError::Input);
        }

        let key = self.options.join_key.as_str();
        let mut merged: Option<Table> = None;
        let mut contributed = Vec::new();
        let mut skipped = Vec::new();

        for path in paths {
            let folded = self.prepare_file(&path).and_then(|prepared| match prepared {
                None => Ok(None),
                Some(table) => match merged.as_ref() {
                    None => Ok(Some(table)),
                    Some(current) => join::outer_join(current, &table, key).map(Some),
                },
            });
            match folded {
                Ok(Some(table)) => {
                    merged = Some(table);
                    contributed.push(path);
                }
                Ok(None) => {
                    debug!("Skipping {:?}: no identifier column", path);
                    skipped.push(SkippedFile {
                        path,
                        reason: SkipReason::NoIdentifier,
                    });
                }
                Err(err) => {
                    debug!("Skipping {:?}: {}", path, err);
                    skipped.push(SkippedFile {
                        path,
                        reason: SkipReason::Failed(err.to_string()),
                    });
                }
            }
        }

        let mut table = merged.ok_or(PipelineError::EmptyResult)?;
        let dropped_columns = table.drop_columns_where(is_duplicate_marker);
        if !dropped_columns.is_empty() {
            debug!("Dropped duplicate column(s): {}", dropped_columns.join(", "));
        }

        if let Some(output) = &self.options.output_path {
            write_output(output, &table)?;
        }

        Ok(MergeOutcome {
            table,
            contributed,
            skipped,
            dropped_columns,
        })
    }

    fn resolve_paths(&self, source: MergeSource) -> Result<Vec<PathBuf>> {
        match source {
            MergeSource::Directory(dir) => discover_files(&dir, &self.options.excluded),
            MergeSource::Files(paths) => Ok(paths),
        }
    }

    /// Loads one file and readies it for folding: cleaned when requested and
    /// with its identifier renamed to the join key. `None` means the file has
    /// no identifier column.
    fn prepare_file(&self, path: &Path) -> Result<Option<Table>> {
        let table = formats::load_table(path, &self.options.load)?;
        let Some(id_column) = self.detector.detect(&table).map(str::to_string) else {
            return Ok(None);
        };
        let mut table = if self.options.clean {
            self.cleaner.clean(&table)
        } else {
            table
        };
        table.rename_column(&id_column, &self.options.join_key)?;
        Ok(Some(table))
    }
}

fn write_output(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    io_utils::write_table(Some(path), DEFAULT_CSV_DELIMITER, table)
}

/// Merges every file of `source` with the given options.
pub fn merge_datasets(source: impl Into<MergeSource>, options: MergeOptions) -> Result<Table> {
    DatasetMerger::new(options).merge(source.into())
}
