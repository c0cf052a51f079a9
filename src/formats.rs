//! Format normalization: every supported source becomes a [`Table`].
//!
//! Sources are dispatched by file extension. Spreadsheet, JSON Lines,
//! Parquet, and XML sources are first flattened into a grid of text cells.
//! By default that grid is written next to the source as a `.csv` file with
//! the same base name and re-read, so all formats share the delimited-text
//! typing path. With materialization disabled the grid is typed directly,
//! which yields the same table without touching the disk.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use calamine::{Data, DataType, Reader, Xlsx, open_workbook};
use chrono::NaiveDateTime;
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use parquet::{
    file::reader::{FileReader, SerializedFileReader},
    record::Field,
};

use crate::{
    data::Value,
    error::{PipelineError, Result},
    io_utils::{self, DEFAULT_CSV_DELIMITER},
    table::Table,
};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "parquet", "xml", "jsonl"];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    JsonLines,
    Parquet,
    Xml,
}

impl SourceFormat {
    /// Anything without a recognized extension is treated as delimited text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => SourceFormat::Xlsx,
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => SourceFormat::JsonLines,
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => SourceFormat::Parquet,
            Some(ext) if ext.eq_ignore_ascii_case("xml") => SourceFormat::Xml,
            _ => SourceFormat::Csv,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, SourceFormat::Csv)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub materialize: bool,
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            materialize: true,
            delimiter: DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TextGrid {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextGrid {
    fn column_slot(&mut self, name: &str) -> usize {
        match self.headers.iter().position(|h| h == name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        }
    }

    fn padded(mut self) -> Self {
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        self
    }
}

/// Row under construction for key-union formats (JSON Lines, XML).
#[derive(Default)]
struct RecordBuilder {
    cells: Vec<String>,
}

impl RecordBuilder {
    fn set(&mut self, grid: &mut TextGrid, name: &str, value: String) {
        let slot = grid.column_slot(name);
        if self.cells.len() <= slot {
            self.cells.resize(slot + 1, String::new());
        }
        self.cells[slot] = value;
    }
}

/// Sibling path used for the delimited-text intermediate of `path`.
pub fn intermediate_path(path: &Path) -> PathBuf {
    path.with_extension("csv")
}

pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let format = SourceFormat::from_path(path);
    if format.is_native() {
        return io_utils::read_csv_table(path, options.delimiter, options.encoding);
    }
    let grid = read_grid(path, format)?.padded();
    if options.materialize {
        let target = intermediate_path(path);
        io_utils::write_text_grid(
            Some(&target),
            DEFAULT_CSV_DELIMITER,
            &grid.headers,
            &grid.rows,
        )?;
        debug!("Materialized {:?} as {:?}", path, target);
        io_utils::read_csv_table(&target, DEFAULT_CSV_DELIMITER, UTF_8)
    } else {
        Table::from_text_grid(&grid.headers, &grid.rows)
    }
}

/// Converts a non-CSV source into its sibling `.csv` file and returns that
/// path. CSV sources are returned unchanged.
pub fn materialize_csv(path: &Path) -> Result<PathBuf> {
    let format = SourceFormat::from_path(path);
    if format.is_native() {
        return Ok(path.to_path_buf());
    }
    let grid = read_grid(path, format)?.padded();
    let target = intermediate_path(path);
    io_utils::write_text_grid(
        Some(&target),
        DEFAULT_CSV_DELIMITER,
        &grid.headers,
        &grid.rows,
    )?;
    Ok(target)
}

fn read_grid(path: &Path, format: SourceFormat) -> Result<TextGrid> {
    let grid = match format {
        SourceFormat::Xlsx => read_xlsx(path)?,
        SourceFormat::JsonLines => read_jsonl(path)?,
        SourceFormat::Parquet => read_parquet(path)?,
        SourceFormat::Xml => read_xml(path)?,
        SourceFormat::Csv => {
            let (headers, rows) = io_utils::read_text_grid(path, DEFAULT_CSV_DELIMITER, UTF_8)?;
            TextGrid { headers, rows }
        }
    };
    if grid.headers.is_empty() {
        return Err(PipelineError::format(path, "No columns to parse from file"));
    }
    Ok(grid)
}

fn read_xlsx(path: &Path) -> Result<TextGrid> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|err| PipelineError::format(path, err))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::format(path, "Workbook has no worksheets"))?
        .map_err(|err| PipelineError::format(path, err))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row.iter().map(excel_cell_text).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(excel_cell_text).collect())
        .collect();
    Ok(TextGrid { headers, rows })
}

fn excel_cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => Value::Float(*f).as_display(),
        Data::Bool(b) => b.to_string(),
        other => other
            .as_datetime()
            .map(datetime_text)
            .unwrap_or_else(|| other.to_string()),
    }
}

fn datetime_text(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn read_jsonl(path: &Path) -> Result<TextGrid> {
    let text = fs::read_to_string(path).map_err(|err| PipelineError::format(path, err))?;
    let mut grid = TextGrid::default();
    for (line_idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: serde_json::Value = serde_json::from_str(line).map_err(|err| {
            PipelineError::format(path, format!("Line {}: {err}", line_idx + 1))
        })?;
        let object = parsed.as_object().ok_or_else(|| {
            PipelineError::format(
                path,
                format!("Line {} is not a JSON object", line_idx + 1),
            )
        })?;
        let mut record = RecordBuilder::default();
        for (key, value) in object {
            record.set(&mut grid, key, json_cell_text(value));
        }
        grid.rows.push(record.cells);
    }
    if grid.rows.is_empty() {
        return Err(PipelineError::format(path, "No JSON records found"));
    }
    Ok(grid)
}

fn json_cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        nested => nested.to_string(),
    }
}

fn read_parquet(path: &Path) -> Result<TextGrid> {
    let file = File::open(path).map_err(|err| PipelineError::format(path, err))?;
    let reader = SerializedFileReader::new(file).map_err(|err| PipelineError::format(path, err))?;
    let headers = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    let iter = reader
        .get_row_iter(None)
        .map_err(|err| PipelineError::format(path, err))?;
    for row in iter {
        let row = row.map_err(|err| PipelineError::format(path, err))?;
        rows.push(
            row.get_column_iter()
                .map(|(_, field)| parquet_field_text(field))
                .collect(),
        );
    }
    Ok(TextGrid { headers, rows })
}

fn parquet_field_text(field: &Field) -> String {
    match field {
        Field::Null => String::new(),
        Field::Bool(b) => b.to_string(),
        Field::Str(s) => s.clone(),
        Field::Float(f) => f.to_string(),
        Field::Double(d) => Value::Float(*d).as_display(),
        other => other.to_string(),
    }
}

fn read_xml(path: &Path) -> Result<TextGrid> {
    let text = fs::read_to_string(path).map_err(|err| PipelineError::format(path, err))?;
    let document =
        roxmltree::Document::parse(&text).map_err(|err| PipelineError::format(path, err))?;
    let mut grid = TextGrid::default();
    for node in document.root_element().children().filter(|n| n.is_element()) {
        let mut record = RecordBuilder::default();
        for attribute in node.attributes() {
            record.set(&mut grid, attribute.name(), attribute.value().to_string());
        }
        for child in node.children().filter(|n| n.is_element()) {
            let has_elements = child.children().any(|n| n.is_element());
            let value = if has_elements {
                String::new()
            } else {
                child.text().unwrap_or_default().to_string()
            };
            record.set(&mut grid, child.tag_name().name(), value);
        }
        grid.rows.push(record.cells);
    }
    if grid.rows.is_empty() {
        return Err(PipelineError::format(path, "XML document has no record elements"));
    }
    Ok(grid)
}
