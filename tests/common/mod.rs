#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parquet::data_type::{ByteArray, ByteArrayType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use tempfile::{TempDir, tempdir};
use zip::write::FileOptions;

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Creates a subdirectory and returns its path.
    pub fn subdir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::create_dir_all(&path).expect("create subdir");
        path
    }

    /// Writes a single-sheet workbook. Numeric-looking cells are stored as
    /// numbers, everything else as inline strings; empty cells are omitted.
    pub fn write_xlsx(&self, name: &str, rows: &[&[&str]]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        write_xlsx(&path, rows);
        path
    }

    /// Writes a parquet file with one optional UTF-8 column per name in
    /// `string_columns` followed by one optional INT64 column per name in
    /// `int_columns`.
    pub fn write_parquet(
        &self,
        name: &str,
        string_columns: &[(&str, Vec<Option<&str>>)],
        int_columns: &[(&str, Vec<Option<i64>>)],
    ) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        write_parquet(&path, string_columns, int_columns);
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read workspace file")
    }
}

/// Parses CSV text into its header row and data rows.
pub fn parse_csv(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (headers, rows)
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

fn column_letter(idx: usize) -> String {
    let mut n = idx + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn sheet_xml(rows: &[&[&str]]) -> String {
    let mut body = String::new();
    for (row_idx, row) in rows.iter().enumerate() {
        body.push_str(&format!("<row r=\"{}\">", row_idx + 1));
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let reference = format!("{}{}", column_letter(col_idx), row_idx + 1);
            if cell.parse::<f64>().is_ok() {
                body.push_str(&format!("<c r=\"{reference}\"><v>{cell}</v></c>"));
            } else {
                body.push_str(&format!(
                    "<c r=\"{reference}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    escape_xml(cell)
                ));
            }
        }
        body.push_str("</row>");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
<sheetData>{body}</sheetData></worksheet>"
    )
}

pub fn write_xlsx(path: &Path, rows: &[&[&str]]) {
    let file = File::create(path).expect("create xlsx");
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", WORKBOOK.to_string()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];
    for (name, contents) in parts {
        zip.start_file(name, options).expect("start zip entry");
        zip.write_all(contents.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish xlsx");
}

pub fn write_parquet(
    path: &Path,
    string_columns: &[(&str, Vec<Option<&str>>)],
    int_columns: &[(&str, Vec<Option<i64>>)],
) {
    let fields = string_columns
        .iter()
        .map(|(name, _)| format!("OPTIONAL BYTE_ARRAY {name} (UTF8);"))
        .chain(
            int_columns
                .iter()
                .map(|(name, _)| format!("OPTIONAL INT64 {name};")),
        )
        .collect::<Vec<_>>()
        .join("\n");
    let message = format!("message schema {{\n{fields}\n}}");
    let schema = Arc::new(parse_message_type(&message).expect("parquet schema"));
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).expect("create parquet");
    let mut writer = SerializedFileWriter::new(file, schema, props).expect("parquet writer");
    let mut row_group = writer.next_row_group().expect("row group");

    for (_, values) in string_columns {
        let present = values
            .iter()
            .flatten()
            .map(|v| ByteArray::from(*v))
            .collect::<Vec<_>>();
        let levels = definition_levels(values);
        let mut column = row_group
            .next_column()
            .expect("next column")
            .expect("string column");
        column
            .typed::<ByteArrayType>()
            .write_batch(&present, Some(&levels), None)
            .expect("write strings");
        column.close().expect("close column");
    }
    for (_, values) in int_columns {
        let present = values.iter().flatten().copied().collect::<Vec<_>>();
        let levels = definition_levels(values);
        let mut column = row_group
            .next_column()
            .expect("next column")
            .expect("int column");
        column
            .typed::<Int64Type>()
            .write_batch(&present, Some(&levels), None)
            .expect("write ints");
        column.close().expect("close column");
    }

    row_group.close().expect("close row group");
    writer.close().expect("close parquet");
}

fn definition_levels<T>(values: &[Option<T>]) -> Vec<i16> {
    values
        .iter()
        .map(|v| if v.is_some() { 1 } else { 0 })
        .collect()
}
