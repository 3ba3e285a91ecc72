//! Field normalisation.
//!
//! Derives the columns every later stage reads from:
//!
//! ```text
//! 出願日          "2020/04/01"          → year            2020
//! 出願人/権利者    "▲A社, B社▼"          → applicant_list  ["A社", "B社"]
//! FI              "A01B,1,00,B02C3/00"  → code_list       ["A01B", "1,00", "B02C3/00"]
//! ```
//!
//! A single unparseable date rejects the whole batch.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::error::DateParseError;
use crate::models::{NormalizedBatch, NormalizedRecord, Record, RecordBatch};

/// Decorative markers the source database puts around applicant names.
pub const APPLICANT_MARKERS: [char; 2] = ['▲', '▼'];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%Y年%m月%d日",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
];

/// Normalise every record of a batch, or reject the batch.
pub fn normalize(batch: RecordBatch) -> Result<NormalizedBatch, DateParseError> {
    let records = batch
        .records
        .into_iter()
        .map(normalize_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NormalizedBatch {
        columns: batch.columns,
        optional: batch.optional,
        records,
    })
}

/// Normalise a single record.
pub fn normalize_record(record: Record) -> Result<NormalizedRecord, DateParseError> {
    let year = parse_year(&record.application_date).ok_or_else(|| DateParseError {
        row: record.row,
        value: record.application_date.clone(),
    })?;

    let applicant = strip_markers(record.applicant.as_deref().unwrap_or(""));
    let applicant_list = split_applicants(&applicant);
    let code_list = split_codes(record.classification.as_deref().unwrap_or(""));

    Ok(NormalizedRecord {
        record,
        year,
        applicant,
        applicant_list,
        code_list,
    })
}

/// Parse a date cell and return its year.
pub fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.year());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.year());
        }
    }
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.year())
}

/// Remove the decorative applicant markers.
pub fn strip_markers(value: &str) -> String {
    value.replace(&APPLICANT_MARKERS[..], "")
}

/// Split an applicant field on every comma.
///
/// An empty field yields a single empty name.
pub fn split_applicants(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

/// Split a classification field on commas, except commas inside a numeric
/// sub-code.
///
/// A comma with a digit on both sides (`"A01B 1,00"`, `"A61K31/00,601"`)
/// is part of the code. Pieces are trimmed and empty pieces are dropped, so
/// an empty field yields an empty list.
pub fn split_codes(value: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = value.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == ',' {
            let next = chars.peek().map(|&(_, n)| n);
            let protected = prev.is_some_and(is_digit) && next.is_some_and(is_digit);
            if !protected {
                pieces.push(&value[start..i]);
                start = i + c.len_utf8();
            }
        }
        prev = Some(c);
    }
    pieces.push(&value[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// ASCII or full-width decimal digit.
fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionalColumns;

    fn record(row: usize, date: &str, applicant: Option<&str>, code: Option<&str>) -> Record {
        Record {
            row,
            application_date: date.to_string(),
            applicant: applicant.map(String::from),
            classification: code.map(String::from),
            problem_category: None,
            solution_category: None,
        }
    }

    #[test]
    fn test_split_codes_protects_digit_commas() {
        assert_eq!(
            split_codes("A01B,1,00,B02C3/00"),
            vec!["A01B", "1,00", "B02C3/00"]
        );
        assert_eq!(split_codes("A01B 1,00"), vec!["A01B 1,00"]);
    }

    #[test]
    fn test_split_codes_trims_and_drops_empty() {
        assert_eq!(split_codes(" G06F , ,H04L,"), vec!["G06F", "H04L"]);
        assert_eq!(split_codes("A,,B"), vec!["A", "B"]);
        assert!(split_codes("").is_empty());
        assert!(split_codes("  ").is_empty());
    }

    #[test]
    fn test_split_codes_keeps_fi_subdivisions() {
        assert_eq!(
            split_codes("A61K31/00,601A,A61P35/00"),
            vec!["A61K31/00,601A", "A61P35/00"]
        );
        assert_eq!(split_codes("G06F17/30,１２"), vec!["G06F17/30,１２"]);
    }

    #[test]
    fn test_split_codes_comma_after_letter_splits() {
        assert_eq!(split_codes("H04L,9/00"), vec!["H04L", "9/00"]);
        assert_eq!(split_codes("1,2,3"), vec!["1,2,3"]);
    }

    #[test]
    fn test_split_applicants() {
        assert_eq!(split_applicants("X, Y"), vec!["X", "Y"]);
        assert_eq!(split_applicants("X,1"), vec!["X", "1"]);
        assert_eq!(split_applicants(""), vec![""]);
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("▲トヨタ自動車株式会社▼"), "トヨタ自動車株式会社");
        assert_eq!(strip_markers("A▲,B▼"), "A,B");
    }

    #[test]
    fn test_parse_year_formats() {
        assert_eq!(parse_year("2020-04-01"), Some(2020));
        assert_eq!(parse_year("2019/12/31"), Some(2019));
        assert_eq!(parse_year("2018/1/5"), Some(2018));
        assert_eq!(parse_year("20170102"), Some(2017));
        assert_eq!(parse_year("2016年3月4日"), Some(2016));
        assert_eq!(parse_year("2015-06-07 00:00:00"), Some(2015));
        assert_eq!(parse_year("2014-06-07T10:00:00+09:00"), Some(2014));
        assert_eq!(parse_year(" 2013-01-01 "), Some(2013));
    }

    #[test]
    fn test_parse_year_rejects_garbage() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year("2020-13-45"), None);
    }

    #[test]
    fn test_normalize_record() {
        let normalized =
            normalize_record(record(1, "2020-01-01", Some("▲X, Y▼"), Some("A,B"))).unwrap();

        assert_eq!(normalized.year, 2020);
        assert_eq!(normalized.applicant, "X, Y");
        assert_eq!(normalized.applicant_list, vec!["X", "Y"]);
        assert_eq!(normalized.code_list, vec!["A", "B"]);
        // Source columns are kept
        assert_eq!(normalized.record.applicant.as_deref(), Some("▲X, Y▼"));
    }

    #[test]
    fn test_normalize_absent_fields() {
        let normalized = normalize_record(record(1, "2020-01-01", None, None)).unwrap();
        assert_eq!(normalized.applicant_list, vec![""]);
        assert!(normalized.code_list.is_empty());
    }

    #[test]
    fn test_normalize_rejects_batch_on_first_bad_date() {
        let batch = RecordBatch {
            columns: vec!["出願日".into()],
            optional: OptionalColumns::default(),
            records: vec![
                record(1, "2020-01-01", Some("X"), Some("A")),
                record(2, "not a date", Some("Y"), Some("B")),
                record(3, "also bad", Some("Z"), Some("C")),
            ],
        };

        let err = normalize(batch).unwrap_err();
        assert_eq!(err.row, 2);
        assert_eq!(err.value, "not a date");
    }
}
