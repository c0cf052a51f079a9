use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    data::Value,
    error::{PipelineError, Result},
    table::{Column, Table},
};

/// Suffix appended to a right-hand column whose name already exists on the
/// left side of a join.
pub const DUPLICATE_SUFFIX: &str = "_dup";

pub fn is_duplicate_marker(name: &str) -> bool {
    name.ends_with(DUPLICATE_SUFFIX)
}

/// Full outer join of `left` and `right` on the column `key`.
///
/// Every row of both sides survives. Left rows come first, in order, each
/// followed by its right-hand matches; unmatched right rows follow in their
/// original order. Rows are never sorted by key, unlike a pandas outer
/// merge, so the output follows file processing order. Missing keys match
/// each other. Right columns whose names clash with a left column are
/// renamed with [`DUPLICATE_SUFFIX`]; a clash on the suffixed name as well
/// discards the right copy.
pub fn outer_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let left_key = key_index(left, key)?;
    let right_key = key_index(right, key)?;
    validate_key_types(key, &left.columns()[left_key], &right.columns()[right_key])?;

    let right_lookup = build_right_lookup(&right.columns()[right_key]);
    let mut right_matched = vec![false; right.row_count()];
    let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
    let mut matched_rows = 0usize;

    for (left_row, value) in left.columns()[left_key].values.iter().enumerate() {
        match right_lookup.get(&key_text(value.as_ref())) {
            Some(bucket) => {
                for &right_row in bucket {
                    right_matched[right_row] = true;
                    matched_rows += 1;
                    pairs.push((Some(left_row), Some(right_row)));
                }
            }
            None => pairs.push((Some(left_row), None)),
        }
    }
    for (right_row, matched) in right_matched.iter().enumerate() {
        if !matched {
            pairs.push((None, Some(right_row)));
        }
    }

    let (right_names, right_columns) = build_right_headers(left, right, right_key);
    let mut columns = Vec::with_capacity(left.column_count() + right_columns.len());

    for (idx, column) in left.columns().iter().enumerate() {
        let values = pairs
            .iter()
            .map(|(left_row, right_row)| match (left_row, right_row) {
                (Some(l), _) => column.values[*l].clone(),
                (None, Some(r)) if idx == left_key => right.columns()[right_key].values[*r].clone(),
                _ => None,
            })
            .collect();
        columns.push(Column::new(column.name.clone(), values));
    }
    for (name, right_idx) in right_names.into_iter().zip(right_columns) {
        let source = &right.columns()[right_idx];
        let values = pairs
            .iter()
            .map(|(_, right_row)| right_row.and_then(|r| source.values[r].clone()))
            .collect();
        columns.push(Column::new(name, values));
    }

    debug!(
        "Outer join on '{}': {} output row(s), {} matched row(s)",
        key,
        pairs.len(),
        matched_rows
    );
    Table::from_columns(columns)
}

fn key_index(table: &Table, key: &str) -> Result<usize> {
    table
        .column_index(key)
        .ok_or_else(|| PipelineError::MissingColumn {
            name: key.to_string(),
        })
}

fn validate_key_types(key: &str, left: &Column, right: &Column) -> Result<()> {
    let left_type = left.data_type();
    let right_type = right.data_type();
    if left_type.joins_with(&right_type) {
        Ok(())
    } else {
        Err(PipelineError::KeyTypeMismatch {
            key: key.to_string(),
            left: left_type,
            right: right_type,
        })
    }
}

fn key_text(value: Option<&Value>) -> Option<String> {
    value.map(Value::key_text)
}

fn build_right_lookup(key_column: &Column) -> HashMap<Option<String>, Vec<usize>> {
    let mut map: HashMap<Option<String>, Vec<usize>> = HashMap::new();
    for (row, value) in key_column.values.iter().enumerate() {
        map.entry(key_text(value.as_ref())).or_default().push(row);
    }
    map
}

fn build_right_headers(left: &Table, right: &Table, right_key: usize) -> (Vec<String>, Vec<usize>) {
    let mut seen: HashSet<String> = left.column_names().into_iter().collect();
    let mut names = Vec::new();
    let mut indices = Vec::new();

    for (idx, column) in right.columns().iter().enumerate() {
        if idx == right_key {
            continue;
        }
        let mut candidate = column.name.clone();
        if seen.contains(&candidate) {
            candidate = format!("{candidate}{DUPLICATE_SUFFIX}");
            if seen.contains(&candidate) {
                continue;
            }
        }
        seen.insert(candidate.clone());
        names.push(candidate);
        indices.push(idx);
    }

    (names, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Option<Value>> {
        values.iter().map(|v| Some(Value::Integer(*v))).collect()
    }

    #[test]
    fn clashing_columns_get_suffix_once() {
        let left = Table::from_columns(vec![
            Column::new("id", ints(&[1])),
            Column::new("x", ints(&[10])),
            Column::new("x_dup", ints(&[11])),
        ])
        .unwrap();
        let right = Table::from_columns(vec![
            Column::new("id", ints(&[1])),
            Column::new("x", ints(&[20])),
            Column::new("y", ints(&[30])),
        ])
        .unwrap();
        let (names, indices) = build_right_headers(&left, &right, 0);
        assert_eq!(names, vec!["y".to_string()]);
        assert_eq!(indices, vec![2]);
    }

    #[test]
    fn many_to_many_keys_multiply_rows() {
        let left = Table::from_columns(vec![
            Column::new("id", ints(&[1, 1])),
            Column::new("a", ints(&[1, 2])),
        ])
        .unwrap();
        let right = Table::from_columns(vec![
            Column::new("id", ints(&[1, 1])),
            Column::new("b", ints(&[3, 4])),
        ])
        .unwrap();
        let joined = outer_join(&left, &right, "id").unwrap();
        assert_eq!(joined.row_count(), 4);
    }

    #[test]
    fn string_and_integer_keys_do_not_join() {
        let left = Table::from_columns(vec![Column::new("id", ints(&[1]))]).unwrap();
        let right =
            Table::from_columns(vec![Column::new("id", vec![Some(Value::from("C1"))])]).unwrap();
        assert!(matches!(
            outer_join(&left, &right, "id"),
            Err(PipelineError::KeyTypeMismatch { .. })
        ));
    }
}
