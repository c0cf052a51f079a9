use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{Value, is_missing_token, parse_boolean};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ColumnType {
    /// Integer and float keys can be matched against each other; everything
    /// else must agree exactly.
    pub fn joins_with(&self, other: &ColumnType) -> bool {
        match (self, other) {
            (ColumnType::Integer, ColumnType::Float) | (ColumnType::Float, ColumnType::Integer) => {
                true
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_integer: bool,
    possible_float: bool,
    possible_boolean: bool,
    observed: usize,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            possible_integer: true,
            possible_float: true,
            possible_boolean: true,
            observed: 0,
        }
    }

    fn observe(&mut self, raw: &str) {
        if is_missing_token(raw) {
            return;
        }
        self.observed += 1;
        let trimmed = raw.trim();
        if self.possible_integer && trimmed.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && trimmed.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_boolean && parse_boolean(trimmed).is_none() {
            self.possible_boolean = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if self.observed == 0 {
            ColumnType::Float
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else if self.possible_boolean {
            ColumnType::Boolean
        } else {
            ColumnType::String
        }
    }
}

/// Infers the type of a column of raw text cells. Columns with no
/// non-missing cell are float-typed.
pub fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidate = TypeCandidate::new();
    for cell in cells {
        candidate.observe(cell);
    }
    candidate.decide()
}

/// Reports the effective type of already-typed values. Mixed integer and
/// float columns are float; any other mix is string.
pub fn infer_value_type<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    let mut current: Option<ColumnType> = None;
    for value in values.into_iter().flatten() {
        let ty = value.column_type();
        current = Some(match current {
            None => ty,
            Some(seen) if seen == ty => seen,
            Some(seen) if seen.joins_with(&ty) => ColumnType::Float,
            Some(_) => return ColumnType::String,
        });
    }
    current.unwrap_or(ColumnType::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_prefers_integer_then_float_then_boolean() {
        assert_eq!(infer_column_type(["1", "2", ""]), ColumnType::Integer);
        assert_eq!(infer_column_type(["1", "2.5"]), ColumnType::Float);
        assert_eq!(infer_column_type(["True", "false"]), ColumnType::Boolean);
        assert_eq!(infer_column_type(["yes", "no"]), ColumnType::String);
        assert_eq!(infer_column_type(["$1,200", "3"]), ColumnType::String);
    }

    #[test]
    fn infer_all_missing_is_float() {
        assert_eq!(infer_column_type(["", "NA", "null"]), ColumnType::Float);
    }

    #[test]
    fn value_type_widens_numeric_mix() {
        let values = [Value::Integer(1), Value::Float(2.5)];
        assert_eq!(infer_value_type(values.iter().map(Some)), ColumnType::Float);
        let mixed = [Value::Integer(1), Value::String("x".into())];
        assert_eq!(infer_value_type(mixed.iter().map(Some)), ColumnType::String);
    }
}
