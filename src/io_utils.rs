//! CSV reading and writing helpers.
//!
//! Every delimited-text read and write in csv-fusion flows through this
//! module:
//!
//! - **Reading**: `read_csv_table` decodes a file with the requested encoding
//!   and types it through [`Table::from_text_grid`].
//! - **Writing**: `write_table` and `write_text_grid` emit a header row and
//!   minimally quoted cells, with no index column.
//! - **stdout**: the `-` path convention routes output through standard out.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use encoding_rs::{Encoding, UTF_8};

use crate::{
    error::{PipelineError, Result},
    table::Table,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| PipelineError::Config(format!("Unknown encoding '{value}'")))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let file = File::open(path).map_err(|err| PipelineError::format(path, err))?;
    let reader: Box<dyn Read> = Box::new(BufReader::new(file));
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(File::create(p)?)),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

/// Decodes `bytes`, returning `None` when they are malformed for `encoding`.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    (!had_errors).then(|| text.into_owned())
}

pub fn decode_record(
    path: &Path,
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| {
            decode_bytes(field, encoding).ok_or_else(|| {
                let line = record.position().map(|pos| pos.line()).unwrap_or(0);
                PipelineError::format(
                    path,
                    format!("Line {line} is not valid {} text", encoding.name()),
                )
            })
        })
        .collect()
}

/// Reads a whole delimited file into header and row cells.
pub fn read_text_grid(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let header_record = reader
        .byte_headers()
        .map_err(|err| PipelineError::format(path, err))?
        .clone();
    let headers = decode_record(path, &header_record, encoding)?;
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(PipelineError::format(path, "No columns to parse from file"));
    }
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|err| {
            PipelineError::format(path, format!("Reading row {}: {err}", row_idx + 2))
        })?;
        if record.len() > headers.len() {
            return Err(PipelineError::format(
                path,
                format!(
                    "Row {} has {} field(s) but the header has {}",
                    row_idx + 2,
                    record.len(),
                    headers.len()
                ),
            ));
        }
        rows.push(decode_record(path, &record, encoding)?);
    }
    Ok((headers, rows))
}

pub fn read_csv_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let (headers, rows) = read_text_grid(path, delimiter, encoding)?;
    Table::from_text_grid(&headers, &rows)
}

pub fn write_text_grid(
    path: Option<&Path>,
    delimiter: u8,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut writer = open_csv_writer(path, delimiter)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_table(path: Option<&Path>, delimiter: u8, table: &Table) -> Result<()> {
    write_text_grid(path, delimiter, &table.column_names(), &table.text_rows(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some("latin1")).unwrap().name(),
            "windows-1252"
        );
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
    }

    #[test]
    fn text_grid_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.csv");
        let headers = vec!["id".to_string(), "note".to_string()];
        let rows = vec![vec!["1".to_string(), "a, b".to_string()]];
        write_text_grid(Some(&path), b',', &headers, &rows).unwrap();
        let (read_headers, read_rows) = read_text_grid(&path, b',', UTF_8).unwrap();
        assert_eq!(read_headers, headers);
        assert_eq!(read_rows, rows);
    }

    #[test]
    fn decode_bytes_rejects_malformed_input() {
        assert_eq!(decode_bytes(b"caf\xc3\xa9", UTF_8).as_deref(), Some("café"));
        assert_eq!(decode_bytes(b"S\xe3o", UTF_8), None);
    }
}
