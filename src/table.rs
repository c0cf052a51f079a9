//! In-memory table model shared by every stage of the pipeline.
//!
//! A [`Table`] is an ordered list of uniquely named [`Column`]s whose values
//! are positionally aligned. Missing cells are `None`. Tables are built from
//! a grid of text cells (see [`Table::from_text_grid`]) so every source format
//! goes through the same typing rules.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::{
    data::{Value, parse_cell, render_cell},
    error::{PipelineError, Result},
    metadata::{ColumnType, infer_column_type, infer_value_type},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn non_missing(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().flatten()
    }

    pub fn data_type(&self) -> ColumnType {
        infer_value_type(self.values.iter().map(Option::as_ref))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Builds a typed table from a header row and text rows. Short rows are
    /// padded with missing cells; repeated header names get `.1`, `.2`, ...
    /// suffixes.
    pub fn from_text_grid(headers: &[String], rows: &[Vec<String>]) -> Result<Self> {
        let names = dedupe_headers(headers);
        let mut columns = Vec::with_capacity(names.len());
        for (idx, name) in names.into_iter().enumerate() {
            let cells = rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect::<Vec<_>>();
            let ty = infer_column_type(cells.iter().copied());
            let values = cells.iter().map(|cell| parse_cell(cell, &ty)).collect();
            columns.push(Column::new(name, values));
        }
        Table::from_columns(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column_index(&column.name).is_some() {
            return Err(PipelineError::DuplicateColumn { name: column.name });
        }
        if let Some(first) = self.columns.first()
            && first.len() != column.len()
        {
            return Err(PipelineError::RaggedColumn {
                rows: column.len(),
                expected: first.len(),
                name: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if self.column_index(to).is_some() {
            return Err(PipelineError::DuplicateColumn {
                name: to.to_string(),
            });
        }
        let idx = self
            .column_index(from)
            .ok_or_else(|| PipelineError::MissingColumn {
                name: from.to_string(),
            })?;
        self.columns[idx].name = to.to_string();
        Ok(())
    }

    /// Removes every column whose name satisfies `predicate`, returning the
    /// removed names in table order.
    pub fn drop_columns_where<F>(&mut self, mut predicate: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let mut dropped = Vec::new();
        self.columns.retain(|column| {
            if predicate(&column.name) {
                dropped.push(column.name.clone());
                false
            } else {
                true
            }
        });
        dropped
    }

    pub fn map_columns<F>(&self, mut f: F) -> Table
    where
        F: FnMut(&Column) -> Column,
    {
        Table {
            columns: self.columns.iter().map(|c| f(c)).collect(),
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.columns
            .get(column)
            .and_then(|c| c.values.get(row))
            .and_then(Option::as_ref)
    }

    pub fn text_rows(&self, limit: Option<usize>) -> Vec<Vec<String>> {
        let rows = limit
            .map(|l| l.min(self.row_count()))
            .unwrap_or(self.row_count());
        (0..rows)
            .map(|row| {
                (0..self.columns.len())
                    .map(|col| render_cell(self.cell(row, col)))
                    .collect()
            })
            .collect()
    }

    pub fn render(&self, limit: Option<usize>) -> String {
        render_table(&self.column_names(), &self.text_rows(limit))
    }
}

fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.clone()
        };
        let mut candidate = base.clone();
        let mut counter = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate().take(widths.len()) {
        let sanitized = sanitize_cell(value);
        let padding = widths[idx].saturating_sub(display_width(sanitized.as_ref()));
        let mut cell = sanitized.into_owned();
        cell.push_str(&" ".repeat(padding));
        cells.push(cell);
    }
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
