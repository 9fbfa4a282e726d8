//! Best-effort text encoding detection.
//!
//! Results are informational only: they are shown in reports and used to pick
//! a decoder for dBASE character fields, never to change how values compare.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Label returned whenever no encoding can be determined.
pub const UNKNOWN: &str = "unknown";

/// Number of bytes sampled from a file for detection.
pub const SAMPLE_SIZE: usize = 10_000;

/// Guess the encoding of a byte sample.
///
/// Never fails: empty or binary samples yield [`UNKNOWN`].
///
/// ```
/// use tabdupe::source::encoding::sniff_encoding;
///
/// assert_eq!(sniff_encoding(b""), "unknown");
/// assert_eq!(sniff_encoding(b"plain words"), "ascii");
/// assert_eq!(sniff_encoding("привет, мир".as_bytes()), "UTF-8");
/// ```
#[must_use]
pub fn sniff_encoding(sample: &[u8]) -> String {
    sniff_sample(sample, true)
}

fn sniff_sample(sample: &[u8], complete: bool) -> String {
    if sample.is_empty() {
        return UNKNOWN.to_string();
    }
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding.name().to_string();
    }
    if looks_binary(sample) {
        return UNKNOWN.to_string();
    }
    if sample.is_ascii() {
        return "ascii".to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, complete);
    detector.guess(None, true).name().to_string()
}

/// NUL bytes, or more than one control byte in ten, mean this is not text.
fn looks_binary(sample: &[u8]) -> bool {
    if sample.contains(&0) {
        return true;
    }
    let controls = sample
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1A))
        .count();
    controls * 10 > sample.len()
}

/// Sniff up to [`SAMPLE_SIZE`] bytes of a file starting at `offset`.
///
/// I/O failures are logged and reported as [`UNKNOWN`].
#[must_use]
pub fn sniff_file(path: &Path, offset: u64) -> String {
    match read_sample(path, offset) {
        Ok((sample, complete)) => sniff_sample(&sample, complete),
        Err(e) => {
            log::debug!("Encoding detection failed for {}: {}", path.display(), e);
            UNKNOWN.to_string()
        }
    }
}

fn read_sample(path: &Path, offset: u64) -> std::io::Result<(Vec<u8>, bool)> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    file.take(SAMPLE_SIZE as u64 + 1).read_to_end(&mut sample)?;
    let complete = sample.len() <= SAMPLE_SIZE;
    sample.truncate(SAMPLE_SIZE);
    Ok((sample, complete))
}

/// Codepage declared by a dBASE language driver byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codepage {
    /// Conventional codepage label (`cp1251`, `cp866`, ...).
    pub label: &'static str,
    /// Decoder, when `encoding_rs` implements the codepage.
    pub encoding: Option<&'static Encoding>,
}

/// Look up a dBASE language driver ID (header byte 29).
///
/// Returns `None` for `0x00` (not declared) and unknown IDs.
///
/// ```
/// use tabdupe::source::encoding::codepage;
///
/// assert_eq!(codepage(0xC9).unwrap().label, "cp1251");
/// assert!(codepage(0x00).is_none());
/// ```
#[must_use]
pub fn codepage(driver_id: u8) -> Option<Codepage> {
    use encoding_rs::{
        BIG5, EUC_KR, GBK, IBM866, MACINTOSH, SHIFT_JIS, WINDOWS_1250, WINDOWS_1251,
        WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_1257,
        WINDOWS_874, X_MAC_CYRILLIC,
    };

    let (label, encoding): (&'static str, Option<&'static Encoding>) = match driver_id {
        0x01 | 0x0B | 0x0D | 0x0F | 0x11 | 0x15 | 0x18 | 0x19 | 0x1B => ("cp437", None),
        0x02 | 0x0A | 0x0E | 0x10 | 0x12 | 0x14 | 0x16 | 0x1A | 0x1D | 0x25 | 0x37 => {
            ("cp850", None)
        }
        0x03 | 0x57 | 0x58 | 0x59 => ("cp1252", Some(WINDOWS_1252)),
        0x04 => ("mac_roman", Some(MACINTOSH)),
        0x08 | 0x17 | 0x66 => ("cp865", None),
        0x13 | 0x7B => ("cp932", Some(SHIFT_JIS)),
        0x1C | 0x6C => ("cp863", None),
        0x1F | 0x22 | 0x23 | 0x40 | 0x64 => ("cp852", None),
        0x24 => ("cp860", None),
        0x26 | 0x65 => ("cp866", Some(IBM866)),
        0x4D | 0x7A => ("cp936", Some(GBK)),
        0x4E | 0x79 => ("cp949", Some(EUC_KR)),
        0x4F | 0x78 => ("cp950", Some(BIG5)),
        0x50 | 0x7C => ("cp874", Some(WINDOWS_874)),
        0x67 => ("cp861", None),
        0x6A => ("cp737", None),
        0x6B => ("cp857", None),
        0x7D => ("cp1255", Some(WINDOWS_1255)),
        0x7E => ("cp1256", Some(WINDOWS_1256)),
        0x96 => ("mac_cyrillic", Some(X_MAC_CYRILLIC)),
        0x97 => ("mac_latin2", None),
        0x98 => ("mac_greek", None),
        0xC8 => ("cp1250", Some(WINDOWS_1250)),
        0xC9 => ("cp1251", Some(WINDOWS_1251)),
        0xCA => ("cp1254", Some(WINDOWS_1254)),
        0xCB => ("cp1253", Some(WINDOWS_1253)),
        0xCC => ("cp1257", Some(WINDOWS_1257)),
        _ => return None,
    };

    Some(Codepage { label, encoding })
}
