use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::ColumnType;

/// Cell spellings that load as a missing value.
pub const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::String(_) => ColumnType::String,
            Value::Integer(_) => ColumnType::Integer,
            Value::Float(_) => ColumnType::Float,
            Value::Boolean(_) => ColumnType::Boolean,
        }
    }

    /// Canonical text used to match join keys across tables. Whole floats
    /// collapse onto their integer spelling so `7` and `7.0` meet.
    pub fn key_text(&self) -> String {
        self.as_display()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

pub fn is_missing_token(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

pub fn parse_boolean(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Converts one text cell into a value of the column's inferred type.
/// Cells that do not fit the type fall back to their raw text.
pub fn parse_cell(raw: &str, ty: &ColumnType) -> Option<Value> {
    if is_missing_token(raw) {
        return None;
    }
    let trimmed = raw.trim();
    let parsed = match ty {
        ColumnType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
        ColumnType::Float => trimmed.parse::<f64>().ok().map(Value::Float),
        ColumnType::Boolean => parse_boolean(trimmed).map(Value::Boolean),
        ColumnType::String => None,
    };
    Some(parsed.unwrap_or_else(|| Value::String(raw.to_string())))
}

pub fn render_cell(value: Option<&Value>) -> String {
    value.map(Value::as_display).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(Value::Float(1234.0).as_display(), "1234");
        assert_eq!(Value::Float(12.5).as_display(), "12.5");
        assert_eq!(Value::Float(1e20).as_display(), "100000000000000000000");
    }

    #[test]
    fn parse_cell_respects_missing_tokens() {
        assert_eq!(parse_cell("", &ColumnType::Integer), None);
        assert_eq!(parse_cell("NA", &ColumnType::String), None);
        assert_eq!(parse_cell("null", &ColumnType::Float), None);
        assert_eq!(
            parse_cell(" ", &ColumnType::String),
            Some(Value::String(" ".to_string()))
        );
    }

    #[test]
    fn parse_cell_uses_column_type() {
        assert_eq!(parse_cell(" 42 ", &ColumnType::Integer), Some(Value::Integer(42)));
        assert_eq!(parse_cell("4.5", &ColumnType::Float), Some(Value::Float(4.5)));
        assert_eq!(parse_cell("TRUE", &ColumnType::Boolean), Some(Value::Boolean(true)));
        assert_eq!(
            parse_cell(" ft ", &ColumnType::String),
            Some(Value::String(" ft ".to_string()))
        );
    }

    #[test]
    fn key_text_aligns_integer_and_whole_float() {
        assert_eq!(Value::Integer(7).key_text(), Value::Float(7.0).key_text());
        assert_ne!(Value::Integer(7).key_text(), Value::Float(7.5).key_text());
    }
}
