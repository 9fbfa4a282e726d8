//! Fixture writers shared by the integration tests and benchmarks.
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Path of a committed file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A cell of an xlsx fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum XCell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl From<&str> for XCell {
    fn from(s: &str) -> Self {
        XCell::Text(s.to_string())
    }
}

impl From<f64> for XCell {
    fn from(n: f64) -> Self {
        XCell::Number(n)
    }
}

/// Spreadsheet column letters for a zero-based index (`0` -> `A`, `26` -> `AA`).
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Sheet XML with `rows` placed from absolute row `first_row` (0-based).
pub fn sheet_xml(rows: &[Vec<XCell>], first_row: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (i, row) in rows.iter().enumerate() {
        let r = first_row + i + 1;
        xml.push_str(&format!(r#"<row r="{r}">"#));
        for (c, cell) in row.iter().enumerate() {
            let addr = format!("{}{}", column_letters(c), r);
            match cell {
                XCell::Text(s) => xml.push_str(&format!(
                    r#"<c r="{addr}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape_xml(s)
                )),
                XCell::Number(n) => xml.push_str(&format!(r#"<c r="{addr}"><v>{n}</v></c>"#)),
                XCell::Bool(b) => xml.push_str(&format!(
                    r#"<c r="{addr}" t="b"><v>{}</v></c>"#,
                    u8::from(*b)
                )),
                XCell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Write a single-sheet xlsx workbook whose first row is the header.
pub fn write_xlsx(path: &Path, rows: &[Vec<XCell>]) {
    write_xlsx_sheet(path, &sheet_xml(rows, 0));
}

/// Write a single-sheet xlsx workbook from raw sheet XML.
pub fn write_xlsx_sheet(path: &Path, sheet: &str) {
    let parts: [(&str, &str); 5] = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, body) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Builder for dBASE III tables written byte by byte.
#[derive(Debug, Clone)]
pub struct DbfBuilder {
    version: u8,
    codepage: u8,
    fields: Vec<(String, u8, u8)>,
    records: Vec<Vec<u8>>,
    declared_records: Option<u32>,
    eof_marker: bool,
}

impl Default for DbfBuilder {
    fn default() -> Self {
        Self {
            version: 0x03,
            codepage: 0x00,
            fields: Vec::new(),
            records: Vec::new(),
            declared_records: None,
            eof_marker: true,
        }
    }
}

impl DbfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn codepage(mut self, id: u8) -> Self {
        self.codepage = id;
        self
    }

    pub fn field(mut self, name: &str, kind: char, length: u8) -> Self {
        self.fields.push((name.to_string(), kind as u8, length));
        self
    }

    /// Append a record of text values, each space-padded to its field width.
    pub fn record(self, values: &[&str]) -> Self {
        let raw: Vec<&[u8]> = values.iter().map(|v| v.as_bytes()).collect();
        self.record_bytes(&raw, false)
    }

    /// Append a record flagged as deleted.
    pub fn deleted_record(self, values: &[&str]) -> Self {
        let raw: Vec<&[u8]> = values.iter().map(|v| v.as_bytes()).collect();
        self.record_bytes(&raw, true)
    }

    /// Append a record from raw field bytes.
    pub fn record_bytes(mut self, values: &[&[u8]], deleted: bool) -> Self {
        let mut record = vec![if deleted { b'*' } else { b' ' }];
        for ((_, _, length), value) in self.fields.iter().zip(values) {
            let length = *length as usize;
            let mut cell = value.to_vec();
            cell.resize(length, b' ');
            record.extend_from_slice(&cell);
        }
        record.resize(self.record_len(), b' ');
        self.records.push(record);
        self
    }

    /// Override the record count stored in the header.
    pub fn declared_records(mut self, count: u32) -> Self {
        self.declared_records = Some(count);
        self
    }

    pub fn eof_marker(mut self, present: bool) -> Self {
        self.eof_marker = present;
        self
    }

    pub fn record_len(&self) -> usize {
        1 + self.fields.iter().map(|f| f.2 as usize).sum::<usize>()
    }

    pub fn header_len(&self) -> usize {
        32 + 32 * self.fields.len() + 1
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; 32];
        out[0] = self.version;
        out[1] = 124;
        out[2] = 1;
        out[3] = 15;
        let count = self
            .declared_records
            .unwrap_or(self.records.len() as u32);
        out[4..8].copy_from_slice(&count.to_le_bytes());
        out[8..10].copy_from_slice(&(self.header_len() as u16).to_le_bytes());
        out[10..12].copy_from_slice(&(self.record_len() as u16).to_le_bytes());
        out[29] = self.codepage;

        for (name, kind, length) in &self.fields {
            let mut d = [0u8; 32];
            let bytes = name.as_bytes();
            let n = bytes.len().min(10);
            d[..n].copy_from_slice(&bytes[..n]);
            d[11] = *kind;
            d[16] = *length;
            out.extend_from_slice(&d);
        }
        out.push(0x0D);

        for record in &self.records {
            out.extend_from_slice(record);
        }
        if self.eof_marker {
            out.push(0x1A);
        }
        out
    }

    pub fn write(&self, path: &Path) {
        fs::write(path, self.build()).unwrap();
    }
}

/// A one-column character table holding `values` in order.
pub fn single_column_dbf(name: &str, width: u8, values: &[&str]) -> DbfBuilder {
    values
        .iter()
        .fold(DbfBuilder::new().field(name, 'C', width), |b, v| {
            b.record(&[*v])
        })
}
