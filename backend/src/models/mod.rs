//! Domain models for the analysis pipeline.
//!
//! - [`Record`] - One input row, as read from the export
//! - [`RecordBatch`] - All rows of one export plus its column layout
//! - [`NormalizedRecord`] - A record with derived year and split list fields
//! - [`NormalizedBatch`] - The normalised batch every later stage reads from
//! - [`table`] - Frequency, top-N and cross tables produced by aggregation

pub mod table;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::config::ColumnNames;
use crate::error::BatchContext;

pub use table::{CrossEntry, CrossTable, FrequencyEntry, FrequencyTable, ShareEntry, TopN};

// =============================================================================
// Input Records
// =============================================================================

/// One input row.
///
/// Cells are kept raw; parsing and splitting happen in the normaliser.
/// Blank optional cells are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// 1-based data row number (header excluded).
    pub row: usize,
    /// Raw application date.
    pub application_date: String,
    /// Raw applicant / rights holder field (comma-joined, may carry markers).
    pub applicant: Option<String>,
    /// Raw classification field (comma-joined, digit-protected commas).
    pub classification: Option<String>,
    /// Problem category.
    pub problem_category: Option<String>,
    /// Solution category.
    pub solution_category: Option<String>,
}

impl Record {
    /// Build a record from a parsed row object.
    pub fn from_row(row: &Value, row_number: usize, columns: &ColumnNames) -> Self {
        Self {
            row: row_number,
            application_date: cell(row, &columns.application_date).unwrap_or_default(),
            applicant: cell(row, &columns.applicant),
            classification: cell(row, &columns.classification),
            problem_category: cell(row, &columns.problem_category),
            solution_category: cell(row, &columns.solution_category),
        }
    }
}

/// Read a non-blank cell as a string.
fn cell(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Which optional category columns a batch carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalColumns {
    pub problem_category: bool,
    pub solution_category: bool,
}

impl OptionalColumns {
    /// Both category columns are present.
    pub fn both(&self) -> bool {
        self.problem_category && self.solution_category
    }
}

/// All rows of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    /// Source headers, in file order.
    pub columns: Vec<String>,
    /// Which optional columns exist.
    pub optional: OptionalColumns,
    /// Rows, in file order.
    pub records: Vec<Record>,
}

impl RecordBatch {
    /// Map parsed row objects to records.
    ///
    /// Column presence must already be validated; missing cells read as blank.
    pub fn from_rows(
        rows: &[Value],
        headers: Vec<String>,
        optional: OptionalColumns,
        columns: &ColumnNames,
    ) -> Self {
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, row)| Record::from_row(row, i + 1, columns))
            .collect();

        Self {
            columns: headers,
            optional,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Diagnostic context for batch-level errors.
    pub fn context(&self) -> BatchContext {
        BatchContext {
            row_count: self.records.len(),
            columns: self.columns.clone(),
        }
    }
}

// =============================================================================
// Normalised Records
// =============================================================================

/// A record with its derived columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// The source record, unchanged.
    pub record: Record,
    /// Application year.
    pub year: i32,
    /// Applicant field with decorative markers removed.
    pub applicant: String,
    /// Trimmed applicant names, in field order.
    pub applicant_list: Vec<String>,
    /// Trimmed, non-empty classification codes, in field order.
    pub code_list: Vec<String>,
}

impl NormalizedRecord {
    pub fn problem_category(&self) -> Option<&str> {
        self.record.problem_category.as_deref()
    }

    pub fn solution_category(&self) -> Option<&str> {
        self.record.solution_category.as_deref()
    }

    /// The raw classification field, blank when absent.
    pub fn classification(&self) -> &str {
        self.record.classification.as_deref().unwrap_or("")
    }
}

/// The normalised batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub columns: Vec<String>,
    pub optional: OptionalColumns,
    pub records: Vec<NormalizedRecord>,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct application years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Diagnostic context for batch-level errors.
    pub fn context(&self) -> BatchContext {
        BatchContext {
            row_count: self.records.len(),
            columns: self.columns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_row() {
        let columns = ColumnNames::default();
        let row = json!({
            "出願日": "2020-04-01",
            "出願人/権利者": "▲A社,B社",
            "FI": "G06F,H04L",
            "課題分類": "  ",
        });

        let record = Record::from_row(&row, 7, &columns);
        assert_eq!(record.row, 7);
        assert_eq!(record.application_date, "2020-04-01");
        assert_eq!(record.applicant.as_deref(), Some("▲A社,B社"));
        assert_eq!(record.classification.as_deref(), Some("G06F,H04L"));
        // Blank and missing cells are both absent
        assert_eq!(record.problem_category, None);
        assert_eq!(record.solution_category, None);
    }

    #[test]
    fn test_batch_context() {
        let columns = ColumnNames::default();
        let rows = vec![json!({"出願日": "2020-01-01"}), json!({"出願日": "2021-01-01"})];
        let batch = RecordBatch::from_rows(
            &rows,
            vec!["出願日".into()],
            OptionalColumns::default(),
            &columns,
        );

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records[1].row, 2);
        let ctx = batch.context();
        assert_eq!(ctx.row_count, 2);
        assert_eq!(ctx.columns, vec!["出願日"]);
    }

    #[test]
    fn test_optional_columns_both() {
        let mut optional = OptionalColumns::default();
        assert!(!optional.both());
        optional.problem_category = true;
        assert!(!optional.both());
        optional.solution_category = true;
        assert!(optional.both());
    }
}
