//! YAML pipeline configuration.
//!
//! Every key is optional. `test_size` and `random_state` are not used by the
//! merge itself; they are carried for the training stage that consumes the
//! merged output.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    discover::DEFAULT_MERGED_OUTPUT_NAME,
    error::{PipelineError, Result},
    formats::LoadOptions,
    identify::DEFAULT_JOIN_KEY,
    io_utils::DEFAULT_CSV_DELIMITER,
    merge::MergeOptions,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub raw_dir: Option<PathBuf>,
    pub merged_output: Option<PathBuf>,
    pub join_key: String,
    pub clean: bool,
    pub exclude: Vec<String>,
    pub materialize: bool,
    pub delimiter: char,
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: None,
            merged_output: None,
            join_key: DEFAULT_JOIN_KEY.to_string(),
            clean: true,
            exclude: Vec::new(),
            materialize: true,
            delimiter: DEFAULT_CSV_DELIMITER as char,
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: PipelineConfig = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| PipelineError::Config(format!("{path:?}: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: PipelineConfig =
            serde_yaml::from_str(input).map_err(|err| PipelineError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.join_key.trim().is_empty() {
            return Err(PipelineError::Config("join_key cannot be empty".to_string()));
        }
        if !self.delimiter.is_ascii() {
            return Err(PipelineError::Config(format!(
                "delimiter '{}' must be ASCII",
                self.delimiter
            )));
        }
        if !(0.0..1.0).contains(&self.test_size) {
            return Err(PipelineError::Config(format!(
                "test_size {} must be in [0, 1)",
                self.test_size
            )));
        }
        Ok(())
    }

    /// Output path of the merge: `merged_output`, or the default file name
    /// inside `raw_dir` when only the directory is configured.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.merged_output.clone().or_else(|| {
            self.raw_dir
                .as_ref()
                .map(|dir| dir.join(DEFAULT_MERGED_OUTPUT_NAME))
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            materialize: self.materialize,
            delimiter: self.delimiter as u8,
            ..LoadOptions::default()
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            output_path: self.output_path(),
            clean: self.clean,
            join_key: self.join_key.clone(),
            excluded: self.exclude.clone(),
            load: self.load_options(),
        }
    }
}
