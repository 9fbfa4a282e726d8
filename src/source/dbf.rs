//! dBASE / FoxPro table reader.
//!
//! # Layout
//!
//! ```text
//! +--------------------+  0
//! | 32-byte header     |  version, record count, header length, record length,
//! |                    |  language driver (codepage) at offset 29
//! +--------------------+  32
//! | 32-byte field      |  name[11], type, (displacement), length, decimals, ...
//! | descriptors ...    |
//! | 0x0D terminator    |
//! +--------------------+  header length
//! | records ...        |  1 deletion-flag byte followed by fixed-width fields
//! | 0x1A (optional)    |
//! +--------------------+
//! ```
//!
//! Field decoding is lazy per cell: a malformed field only fails that cell.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use encoding_rs::{Encoding, WINDOWS_1252};

use super::encoding::{codepage, sniff_file, Codepage};
use super::{
    CellError, CellValue, DataRow, RowIter, SourceFormat, SourceReadError, TabularSource,
    FIRST_DATA_ROW,
};

const HEADER_SIZE: usize = 32;
const DESCRIPTOR_SIZE: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const DELETED: u8 = b'*';

/// Julian day number of 1970-01-01.
const UNIX_EPOCH_JULIAN_DAY: i64 = 2_440_588;

/// Version bytes written by dBASE, FoxBASE, FoxPro and Visual FoxPro.
const KNOWN_VERSIONS: &[u8] = &[
    0x02, 0x03, 0x05, 0x30, 0x31, 0x32, 0x43, 0x63, 0x83, 0x8B, 0x8E, 0xCB, 0xF5, 0xFB,
];

/// A field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfField {
    /// Field name as stored (or `FIELD<n>` when the stored name is blank).
    pub name: String,
    /// Type character (`C`, `N`, `D`, ...).
    pub kind: char,
    /// Byte offset inside a record, counting the deletion flag.
    pub offset: usize,
    /// Width in bytes.
    pub length: usize,
}

impl DbfField {
    /// Visual FoxPro hides its null-flag bitmap in a `0` field.
    fn is_hidden(&self) -> bool {
        self.kind == '0'
    }
}

/// An opened dBASE table.
#[derive(Debug)]
pub struct DbfSource {
    path: PathBuf,
    version: u8,
    record_count: usize,
    header_len: u64,
    record_len: usize,
    fields: Vec<DbfField>,
    columns: Vec<String>,
    encoding_label: String,
    decoder: &'static Encoding,
}

impl DbfSource {
    /// Read and validate the table header and field descriptors.
    ///
    /// # Errors
    ///
    /// Returns `SourceReadError` if the file cannot be read or its structure
    /// is not a valid dBASE table.
    pub fn open(path: &Path) -> Result<Self, SourceReadError> {
        let (head, descriptors, file_len) = {
            let mut file = File::open(path).map_err(|e| SourceReadError::io(path, e))?;
            let file_len = file
                .metadata()
                .map_err(|e| SourceReadError::io(path, e))?
                .len();

            let mut head = [0u8; HEADER_SIZE];
            read_structure(&mut file, &mut head, path, "header")?;
            if !KNOWN_VERSIONS.contains(&head[0]) {
                return Err(SourceReadError::dbf(
                    path,
                    format!("unrecognised version byte 0x{:02X}", head[0]),
                ));
            }

            let header_len = u16::from_le_bytes([head[8], head[9]]) as usize;
            if header_len < HEADER_SIZE + 1 {
                return Err(SourceReadError::dbf(
                    path,
                    format!("header length {header_len} is too small"),
                ));
            }
            let mut descriptors = vec![0u8; header_len - HEADER_SIZE];
            read_structure(&mut file, &mut descriptors, path, "field descriptors")?;
            (head, descriptors, file_len)
        };

        let version = head[0];
        let record_count = u32::from_le_bytes([head[4], head[5], head[6], head[7]]) as usize;
        let header_len = u16::from_le_bytes([head[8], head[9]]) as u64;
        let record_len = u16::from_le_bytes([head[10], head[11]]) as usize;

        let fields =
            parse_fields(&descriptors, record_len).map_err(|m| SourceReadError::dbf(path, m))?;

        let expected_len = header_len + (record_count * record_len) as u64;
        if file_len < expected_len {
            log::warn!(
                "{} is {} bytes but its header promises {}; trailing records are missing",
                path.display(),
                file_len,
                expected_len
            );
        }

        // A declared codepage keeps its label even when it has to be decoded
        // with a sniffed or fallback decoder.
        let (encoding_label, decoder) = match codepage(head[29]) {
            Some(Codepage {
                label,
                encoding: Some(encoding),
            }) => (label.to_string(), encoding),
            declared => {
                let sniffed = sniff_file(path, header_len);
                let decoder = Encoding::for_label(sniffed.as_bytes()).unwrap_or(WINDOWS_1252);
                let label = declared.map_or(sniffed, |cp| cp.label.to_string());
                (label, decoder)
            }
        };

        let columns = fields
            .iter()
            .filter(|f| !f.is_hidden())
            .map(|f| f.name.clone())
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            version,
            record_count,
            header_len,
            record_len,
            fields,
            columns,
            encoding_label,
            decoder,
        })
    }

    /// Visible field descriptors, in column order.
    fn fields(&self) -> impl Iterator<Item = &DbfField> {
        self.fields.iter().filter(|f| !f.is_hidden())
    }

    fn is_foxpro(&self) -> bool {
        matches!(self.version, 0x30 | 0x31 | 0x32)
    }
}

impl TabularSource for DbfSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Dbf
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.record_count
    }

    fn encoding(&self) -> &str {
        &self.encoding_label
    }

    fn rows(&mut self) -> Result<RowIter<'_>, SourceReadError> {
        let file = File::open(&self.path).map_err(|e| SourceReadError::io(&self.path, e))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(self.header_len))
            .map_err(|e| SourceReadError::io(&self.path, e))?;

        let buf = vec![0u8; self.record_len];
        Ok(Box::new(DbfRows {
            source: self,
            reader,
            buf,
            index: 0,
            finished: false,
        }))
    }
}

struct DbfRows<'a> {
    source: &'a DbfSource,
    reader: BufReader<File>,
    buf: Vec<u8>,
    index: usize,
    finished: bool,
}

impl Iterator for DbfRows<'_> {
    type Item = Result<DataRow, SourceReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.index >= self.source.record_count {
            return None;
        }

        let filled = match read_record(&mut self.reader, &mut self.buf) {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Some(Err(SourceReadError::io(&self.source.path, e)));
            }
        };

        if filled == 0 || self.buf[0] == END_OF_FILE {
            self.finished = true;
            if self.index < self.source.record_count {
                log::warn!(
                    "{}: data ended after {} of {} records",
                    self.source.path.display(),
                    self.index,
                    self.source.record_count
                );
            }
            return None;
        }

        let number = self.index + FIRST_DATA_ROW;
        self.index += 1;

        if self.buf[0] == DELETED {
            log::trace!("Record at row {} is flagged as deleted", number);
        }

        let record = &self.buf[..filled];
        if filled < self.buf.len() {
            self.finished = true;
        }
        let foxpro = self.source.is_foxpro();
        let cells = self
            .source
            .fields()
            .map(|field| match record.get(field.offset..field.offset + field.length) {
                Some(raw) => decode_field(field, raw, self.source.decoder, foxpro),
                None => Err(CellError::Truncated {
                    available: filled,
                    expected: self.buf.len(),
                }),
            })
            .collect();

        Some(Ok(DataRow::new(number, cells)))
    }
}

fn read_structure(
    file: &mut File,
    buf: &mut [u8],
    path: &Path,
    what: &str,
) -> Result<(), SourceReadError> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            SourceReadError::dbf(path, format!("file ends inside the {what}"))
        } else {
            SourceReadError::io(path, e)
        }
    })
}

/// Fill `buf` as far as the stream allows, returning the byte count.
fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Parse the descriptor array that follows the fixed header.
fn parse_fields(descriptors: &[u8], record_len: usize) -> Result<Vec<DbfField>, String> {
    let mut fields = Vec::new();
    let mut offset = 1;

    for chunk in descriptors.chunks(DESCRIPTOR_SIZE) {
        if chunk[0] == HEADER_TERMINATOR {
            break;
        }
        if chunk.len() < DESCRIPTOR_SIZE {
            return Err("field descriptor array is not terminated".to_string());
        }

        let kind = chunk[11] as char;
        let length = if kind == 'C' {
            u16::from_le_bytes([chunk[16], chunk[17]]) as usize
        } else {
            chunk[16] as usize
        };

        let raw_name = chunk[..11].split(|&b| b == 0).next().unwrap_or_default();
        let mut name = String::from_utf8_lossy(raw_name).trim().to_string();
        if name.is_empty() {
            name = format!("FIELD{}", fields.len() + 1);
        }

        if length == 0 {
            return Err(format!("field {name} has zero width"));
        }

        fields.push(DbfField {
            name,
            kind,
            offset,
            length,
        });
        offset += length;
    }

    if fields.is_empty() {
        return Err("table defines no fields".to_string());
    }
    if offset > record_len {
        return Err(format!(
            "fields need {offset} bytes per record but records are {record_len} bytes"
        ));
    }

    Ok(fields)
}

/// Decode one field of a record.
fn decode_field(
    field: &DbfField,
    raw: &[u8],
    decoder: &'static Encoding,
    foxpro: bool,
) -> Result<CellValue, CellError> {
    let malformed = |kind: &'static str| CellError::Malformed {
        field: field.name.clone(),
        kind,
        raw: String::from_utf8_lossy(raw).into_owned(),
    };

    match field.kind {
        'N' | 'F' => {
            let text = ascii_trimmed(raw);
            if text.is_empty() {
                return Ok(CellValue::Empty);
            }
            text.replace(',', ".")
                .parse::<f64>()
                .map(CellValue::Number)
                .map_err(|_| malformed("numeric"))
        }
        'L' => match ascii_trimmed(raw).bytes().next() {
            None | Some(b'?') => Ok(CellValue::Empty),
            Some(b'T' | b't' | b'Y' | b'y') => Ok(CellValue::Bool(true)),
            Some(b'F' | b'f' | b'N' | b'n') => Ok(CellValue::Bool(false)),
            Some(_) => Err(malformed("logical")),
        },
        'D' => {
            let text = ascii_trimmed(raw);
            if text.is_empty() || text.bytes().all(|b| b == b'0') {
                return Ok(CellValue::Empty);
            }
            NaiveDate::parse_from_str(&text, "%Y%m%d")
                .map(CellValue::Date)
                .map_err(|_| malformed("date"))
        }
        'I' if raw.len() == 4 => Ok(CellValue::Number(f64::from(i32::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3],
        ])))),
        'Y' if raw.len() == 8 => {
            let cents = i64::from_le_bytes(raw.try_into().map_err(|_| malformed("currency"))?);
            Ok(CellValue::Number(cents as f64 / 10_000.0))
        }
        'B' if foxpro && raw.len() == 8 => Ok(CellValue::Number(f64::from_le_bytes(
            raw.try_into().map_err(|_| malformed("double"))?,
        ))),
        'T' if raw.len() == 8 => {
            let day = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            let millis = i32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
            if day == 0 && millis == 0 {
                return Ok(CellValue::Empty);
            }
            julian_datetime(day, millis)
                .map(CellValue::DateTime)
                .ok_or_else(|| malformed("datetime"))
        }
        'M' | 'G' | 'P' | 'B' => Ok(memo_reference(raw)),
        _ => {
            let (text, _) = decoder.decode_without_bom_handling(raw);
            Ok(CellValue::Text(
                text.trim_end_matches([' ', '\0']).to_string(),
            ))
        }
    }
}

fn ascii_trimmed(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c == ' ' || c == '\0')
        .to_string()
}

/// Memo contents live in a companion file; report the block reference.
fn memo_reference(raw: &[u8]) -> CellValue {
    let block = if raw.len() == 4 {
        u64::from(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    } else {
        ascii_trimmed(raw).parse::<u64>().unwrap_or(0)
    };
    if block == 0 {
        CellValue::Empty
    } else {
        CellValue::Text(format!("memo block {block}"))
    }
}

fn julian_datetime(day: i32, millis: i32) -> Option<chrono::NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    let date = epoch.checked_add_signed(Duration::days(i64::from(day) - UNIX_EPOCH_JULIAN_DAY))?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(i64::from(millis)))
}
