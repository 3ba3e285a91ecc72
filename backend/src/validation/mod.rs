//! Column layout validation.
//!
//! A batch must carry the three required columns (application date,
//! applicant, classification code). The two category columns are optional;
//! together they enable the category analysis.
//!
//! # Example
//!
//! ```rust,ignore
//! use patdash::{validate_columns, ColumnNames};
//!
//! let headers = vec!["出願日".into(), "出願人/権利者".into(), "FI".into()];
//! let set = validate_columns(&headers, &ColumnNames::default()).unwrap();
//! assert!(!set.optional.both());
//! assert_eq!(set.missing_optional(), vec!["課題分類", "解決手段分類"]);
//! ```

use crate::config::ColumnNames;
use crate::error::ValidationError;
use crate::models::OptionalColumns;

/// Outcome of a successful column check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    /// Which optional columns exist.
    pub optional: OptionalColumns,
    names: ColumnNames,
}

impl ColumnSet {
    /// Header names of the optional columns that are absent.
    pub fn missing_optional(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.optional.problem_category {
            missing.push(self.names.problem_category.clone());
        }
        if !self.optional.solution_category {
            missing.push(self.names.solution_category.clone());
        }
        missing
    }
}

/// Check that `headers` contain every required column.
///
/// Returns every missing column at once, not just the first.
pub fn validate_columns(
    headers: &[String],
    columns: &ColumnNames,
) -> Result<ColumnSet, ValidationError> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    let missing: Vec<String> = columns
        .required()
        .into_iter()
        .filter(|name| !has(name))
        .map(String::from)
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns {
            missing,
            available: headers.to_vec(),
        });
    }

    Ok(ColumnSet {
        optional: OptionalColumns {
            problem_category: has(&columns.problem_category),
            solution_category: has(&columns.solution_category),
        },
        names: columns.clone(),
    })
}
