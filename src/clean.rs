//! Per-column heuristic cleaning.
//!
//! Each column is normalized independently and only when it holds at least
//! one non-missing value. Detection looks at the first [`DEFAULT_SAMPLE_SIZE`]
//! non-missing values rendered as text:
//!
//! 1. **Currency**: any sampled value containing `$` or `,` marks the column;
//!    string cells then lose `$`, `,` and `"` and are parsed as floats, keeping
//!    the original text when parsing fails.
//! 2. **Whitespace**: any sampled value with outer whitespace trims every
//!    string cell.
//! 3. **Categorical spellings**: when the column has between 2 and 50
//!    distinct values and its name selects a pattern table, every value is
//!    folded (lowercased and trimmed) and mapped to its canonical category.
//!
//! Cleaning never adds or removes rows.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::{
    data::Value,
    error::{PipelineError, Result},
    metadata::ColumnType,
    patterns,
    table::{Column, Table},
    transform::string_ops::{fold, has_outer_whitespace, lowercase, regex_replace},
};

pub const DEFAULT_SAMPLE_SIZE: usize = 100;
pub const MIN_CATEGORIES: usize = 2;
pub const MAX_CATEGORIES: usize = 50;
const REPORT_SAMPLE_VALUES: usize = 10;
const REPORT_UNIQUE_SAMPLE: usize = 20;
pub const CURRENCY_PATTERN: &str = r"[\$,]";

fn currency_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(CURRENCY_PATTERN).expect("currency pattern compiles"))
}

fn currency_symbols() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[\$,"]"#).expect("currency symbol pattern compiles"))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CleaningOperation {
    CurrencyRemoval {
        pattern: String,
        target_dtype: ColumnType,
    },
    CategoricalStandardization {
        distinct_values: usize,
        mapping: BTreeMap<String, String>,
        unique_values_sample: Vec<String>,
    },
    WhitespaceStrip,
    CaseStandardization {
        recommended: String,
    },
}

impl CleaningOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            CleaningOperation::CurrencyRemoval { .. } => "currency_removal",
            CleaningOperation::CategoricalStandardization { .. } => "categorical_standardization",
            CleaningOperation::WhitespaceStrip => "whitespace_strip",
            CleaningOperation::CaseStandardization { .. } => "case_standardization",
        }
    }

    pub fn description(&self) -> String {
        match self {
            CleaningOperation::CurrencyRemoval { .. } => {
                "Remove $ and commas from numeric values".to_string()
            }
            CleaningOperation::CategoricalStandardization {
                distinct_values,
                mapping,
                ..
            } => format!(
                "Merge similar categorical values (found {distinct_values} unique, can reduce to {})",
                mapping.len()
            ),
            CleaningOperation::WhitespaceStrip => "Remove leading/trailing whitespace".to_string(),
            CleaningOperation::CaseStandardization { .. } => {
                "Standardize text case (lowercase)".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnReport {
    pub column_name: String,
    pub needs_cleaning: bool,
    pub operations: Vec<CleaningOperation>,
    pub dtype: ColumnType,
    pub null_count: usize,
    pub unique_count: usize,
    pub sample_values: Vec<Value>,
}

impl ColumnReport {
    pub fn operation_kinds(&self) -> Vec<&'static str> {
        self.operations.iter().map(CleaningOperation::kind).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnCleaner {
    pub sample_size: usize,
}

impl Default for ColumnCleaner {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl ColumnCleaner {
    pub fn clean(&self, table: &Table) -> Table {
        table.map_columns(|column| self.clean_column(column))
    }

    pub fn analyze(&self, table: &Table) -> Vec<ColumnReport> {
        table
            .columns()
            .iter()
            .map(|column| self.analyze_column(column))
            .collect()
    }

    pub fn clean_column(&self, column: &Column) -> Column {
        if column.is_all_missing() {
            return column.clone();
        }
        let texts = column_texts(column);
        let sample = &texts[..texts.len().min(self.sample_size)];
        let mut values = column.values.clone();

        if has_currency_format(sample) {
            for value in values.iter_mut().flatten() {
                strip_currency(value);
            }
        }

        if has_whitespace_issues(sample) {
            for value in values.iter_mut().flatten() {
                if let Value::String(s) = value
                    && has_outer_whitespace(s)
                {
                    *s = s.trim().to_string();
                }
            }
        }

        let mapping = categorical_mapping(&texts, &column.name);
        if !mapping.is_empty() {
            for value in values.iter_mut().flatten() {
                let folded = fold(&value.as_display());
                let canonical = mapping.get(&folded).cloned().unwrap_or(folded);
                *value = Value::String(canonical);
            }
        }

        Column::new(column.name.clone(), values)
    }

    pub fn analyze_column(&self, column: &Column) -> ColumnReport {
        let texts = column_texts(column);
        let mut report = ColumnReport {
            column_name: column.name.clone(),
            needs_cleaning: false,
            operations: Vec::new(),
            dtype: column.data_type(),
            null_count: column.null_count(),
            unique_count: distinct_count(&texts),
            sample_values: column
                .non_missing()
                .take(REPORT_SAMPLE_VALUES)
                .cloned()
                .collect(),
        };
        if texts.is_empty() {
            return report;
        }
        let sample = &texts[..texts.len().min(self.sample_size)];

        if has_currency_format(sample) {
            report.operations.push(CleaningOperation::CurrencyRemoval {
                pattern: CURRENCY_PATTERN.to_string(),
                target_dtype: ColumnType::Float,
            });
        }
        if let Some(operation) = categorical_inconsistencies(&texts, &column.name) {
            report.operations.push(operation);
        }
        if has_whitespace_issues(sample) {
            report.operations.push(CleaningOperation::WhitespaceStrip);
        }
        if has_case_inconsistencies(&texts) {
            report.operations.push(CleaningOperation::CaseStandardization {
                recommended: "lowercase".to_string(),
            });
        }
        report.needs_cleaning = !report.operations.is_empty();
        report
    }
}

pub fn clean_table(table: &Table) -> Table {
    ColumnCleaner::default().clean(table)
}

pub fn analyze_table(table: &Table) -> Vec<ColumnReport> {
    ColumnCleaner::default().analyze(table)
}

/// Strips currency punctuation and parses what remains as a float.
pub fn parse_currency(raw: &str) -> Result<f64> {
    let stripped = regex_replace(raw, currency_symbols(), "");
    stripped
        .trim()
        .parse::<f64>()
        .map_err(|_| PipelineError::Parse {
            value: raw.to_string(),
        })
}

fn strip_currency(value: &mut Value) {
    let parsed = match value {
        Value::String(raw) => parse_currency(raw).ok(),
        _ => None,
    };
    if let Some(parsed) = parsed {
        *value = Value::Float(parsed);
    }
}

fn column_texts(column: &Column) -> Vec<String> {
    column.non_missing().map(Value::as_display).collect()
}

fn distinct_count(texts: &[String]) -> usize {
    texts.iter().collect::<HashSet<_>>().len()
}

pub fn has_currency_format(sample: &[String]) -> bool {
    sample.iter().any(|value| currency_marker().is_match(value))
}

pub fn has_whitespace_issues(sample: &[String]) -> bool {
    sample.iter().any(|value| has_outer_whitespace(value))
}

/// Two distinct raw values that collapse to the same lowercase spelling.
pub fn has_case_inconsistencies(texts: &[String]) -> bool {
    let unique = texts.iter().unique().collect::<Vec<_>>();
    if unique.len() > MAX_CATEGORIES {
        return false;
    }
    let mut seen = HashSet::new();
    unique
        .iter()
        .any(|value| !seen.insert(lowercase(value).into_owned()))
}

/// Folded-value to canonical-category map for a column, empty when the
/// distinct count is outside `MIN_CATEGORIES..=MAX_CATEGORIES` or no table
/// applies.
pub fn categorical_mapping(texts: &[String], column_name: &str) -> BTreeMap<String, String> {
    let unique = texts.iter().unique().collect::<Vec<_>>();
    if !(MIN_CATEGORIES..=MAX_CATEGORIES).contains(&unique.len()) {
        return BTreeMap::new();
    }
    patterns::standardization_map(unique.iter().map(|v| v.as_str()), column_name)
}

fn categorical_inconsistencies(texts: &[String], column_name: &str) -> Option<CleaningOperation> {
    let unique = texts.iter().unique().collect::<Vec<_>>();
    let mapping = categorical_mapping(texts, column_name);
    if mapping.is_empty() || mapping.len() >= unique.len() {
        return None;
    }
    Some(CleaningOperation::CategoricalStandardization {
        distinct_values: unique.len(),
        mapping,
        unique_values_sample: unique
            .iter()
            .take(REPORT_UNIQUE_SAMPLE)
            .map(|v| fold(v))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parse_currency_strips_symbols() {
        assert_eq!(parse_currency("$1,234.00").unwrap(), 1234.0);
        assert_eq!(parse_currency("\"$12\"").unwrap(), 12.0);
        assert!(matches!(
            parse_currency("N/A dollars"),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn case_inconsistency_needs_distinct_raw_values() {
        assert!(has_case_inconsistencies(&texts(&["Yes", "yes", "no"])));
        assert!(!has_case_inconsistencies(&texts(&["yes", "yes", "no"])));
    }

    #[test]
    fn categorical_mapping_respects_cardinality_bounds() {
        assert!(categorical_mapping(&texts(&["FT", "FT"]), "employment").is_empty());
        let many = (0..51).map(|i| format!("ft{i}")).collect::<Vec<_>>();
        assert!(categorical_mapping(&many, "employment").is_empty());
        assert_eq!(
            categorical_mapping(&texts(&["FT", "pt"]), "employment").len(),
            2
        );
    }

    #[test]
    fn categorical_report_requires_reduction() {
        let distinct = texts(&["ft", "pt"]);
        assert!(categorical_inconsistencies(&distinct, "employment").is_none());
        let redundant = texts(&["FT", "ft", "pt"]);
        let op = categorical_inconsistencies(&redundant, "employment").unwrap();
        assert_eq!(op.kind(), "categorical_standardization");
    }
}
