//! CSV to JSON parser with encoding and delimiter auto-detection.
//!
//! Patent database exports come as UTF-8 (often with a BOM), Shift_JIS or
//! EUC-JP, with a comma or tab separator. Each row becomes a JSON object
//! keyed by header; interpreting the cells is left to the models.

use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Candidate separators, in tie-break order.
const SEPARATORS: [char; 4] = [',', ';', '\t', '|'];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed records as JSON objects
    pub records: Vec<Value>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers, in file order
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes.
///
/// A UTF-8 BOM or valid UTF-8 wins outright; anything else is left to chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if bytes.starts_with(UTF8_BOM) || std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let (charset, _confidence, _language) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "shift_jis" | "shift-jis" | "sjis" | "cp932" | "windows-31j" => "shift_jis".to_string(),
        "euc-jp" | "eucjp" => "euc-jp".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            String::from_utf8(bytes.to_vec())
                .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
        }
        "shift_jis" | "cp932" => strict_decode(encoding_rs::SHIFT_JIS, bytes)?,
        "euc-jp" => strict_decode(encoding_rs::EUC_JP, bytes)?,
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // Unknown charset: best-effort UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    Ok(decoded)
}

/// Decode a multi-byte Japanese encoding, failing on malformed sequences.
fn strict_decode(encoding: &'static encoding_rs::Encoding, bytes: &[u8]) -> CsvResult<String> {
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(CsvError::EncodingError(encoding.name().to_string()));
    }
    Ok(decoded.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to a comma when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &SEPARATORS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV into JSON objects with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use patdash::csv_to_json;
///
/// let rows = csv_to_json("出願日,FI\n2020-01-01,\"A01B,1,00\"", ',').unwrap();
/// assert_eq!(rows[0]["FI"], "A01B,1,00");
/// ```
pub fn csv_to_json(csv: &str, delimiter: char) -> CsvResult<Vec<Value>> {
    parse_csv(csv.as_bytes(), delimiter).map(|(_, rows)| rows)
}

/// Parse CSV from a reader into headers and JSON objects.
///
/// Quoted fields may contain the delimiter. Blank lines are skipped, short
/// rows are padded with empty strings and extra cells are ignored.
pub fn parse_csv<R: Read>(reader: R, delimiter: char) -> CsvResult<(Vec<String>, Vec<Value>)> {
    let delimiter = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 1,
        message: format!("Unsupported delimiter {:?}", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(parse_error)?;

        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("");
            obj.insert(header.clone(), Value::String(value.to_string()));
        }
        rows.push(Value::Object(obj));
    }

    Ok((headers, rows))
}

fn parse_error(err: csv::Error) -> CsvError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(io) => CsvError::IoError(io),
        kind => CsvError::ParseError {
            line,
            message: format!("{:?}", kind),
        },
    }
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse an already decoded CSV string and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let (headers, records) = parse_csv(content.as_bytes(), delimiter)?;

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}
