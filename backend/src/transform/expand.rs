//! Record expansion.
//!
//! Turns list-valued fields into one row per element, the way counting
//! needs them:
//!
//! ```text
//! Normalised (1 record)                  Joint expansion (2 × 2 rows)
//! ┌──────────────────────────────┐       ┌──────────────┐
//! │ applicants: [X, Y]           │       │ X │ A        │
//! │ codes:      [A, B]           │  →    │ X │ B        │
//! └──────────────────────────────┘       │ Y │ A        │
//!                                        │ Y │ B        │
//!                                        └──────────────┘
//! ```
//!
//! Rows borrow from the [`NormalizedBatch`]; nothing is copied. A record
//! whose list is empty contributes no rows to that table.

use serde::Serialize;

use crate::error::{AggregateError, AggregateResult};
use crate::models::{NormalizedBatch, NormalizedRecord, OptionalColumns};

/// Which list-valued field a table was expanded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    /// One row per applicant.
    Applicant,
    /// One row per classification code.
    Code,
    /// One row per (applicant, code) pair.
    Joint,
}

impl Expansion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Code => "code",
            Self::Joint => "joint",
        }
    }

    /// Number of rows one record contributes.
    pub fn rows_for(&self, record: &NormalizedRecord) -> usize {
        match self {
            Self::Applicant => record.applicant_list.len(),
            Self::Code => record.code_list.len(),
            Self::Joint => record.applicant_list.len() * record.code_list.len(),
        }
    }
}

/// Categorical columns an exploded row can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Applicant,
    Code,
    ProblemCategory,
    SolutionCategory,
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Code => "code",
            Self::ProblemCategory => "problem category",
            Self::SolutionCategory => "solution category",
        }
    }
}

/// One expanded row: a record with one or both list fields replaced by a
/// single element.
#[derive(Debug, Clone, Copy)]
pub struct ExplodedRow<'a> {
    pub record: &'a NormalizedRecord,
    /// Applicant scalar, or the whole (marker-free) applicant field when the
    /// table was not expanded on applicants.
    pub applicant: &'a str,
    /// Code scalar, or the raw classification field when the table was not
    /// expanded on codes.
    pub code: &'a str,
}

impl<'a> ExplodedRow<'a> {
    pub fn year(&self) -> i32 {
        self.record.year
    }

    /// Value of a categorical column. Missing categories are `None`.
    pub fn value(&self, dimension: Dimension) -> Option<&'a str> {
        match dimension {
            Dimension::Applicant => Some(self.applicant),
            Dimension::Code => Some(self.code),
            Dimension::ProblemCategory => self.record.problem_category(),
            Dimension::SolutionCategory => self.record.solution_category(),
        }
    }
}

/// The rows produced by one expansion.
#[derive(Debug, Clone)]
pub struct ExplodedTable<'a> {
    expansion: Expansion,
    optional: OptionalColumns,
    rows: Vec<ExplodedRow<'a>>,
}

impl<'a> ExplodedTable<'a> {
    pub fn expansion(&self) -> Expansion {
        self.expansion
    }

    pub fn rows(&self) -> &[ExplodedRow<'a>] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExplodedRow<'a>> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table carries a column at all.
    pub fn carries(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Applicant | Dimension::Code => true,
            Dimension::ProblemCategory => self.optional.problem_category,
            Dimension::SolutionCategory => self.optional.solution_category,
        }
    }

    /// Fail with [`AggregateError::MissingColumn`] unless the column exists.
    pub fn require(&self, dimension: Dimension) -> AggregateResult<()> {
        if self.carries(dimension) {
            Ok(())
        } else {
            Err(AggregateError::MissingColumn(dimension.name().to_string()))
        }
    }

    /// Check that this table was expanded from `batch`.
    pub fn check_shape(&self, batch: &NormalizedBatch) -> AggregateResult<()> {
        let expected: usize = batch
            .records
            .iter()
            .map(|r| self.expansion.rows_for(r))
            .sum();

        if expected != self.rows.len() {
            return Err(AggregateError::ShapeMismatch {
                table: self.expansion.name(),
                expected,
                actual: self.rows.len(),
            });
        }
        Ok(())
    }
}

/// One row per applicant; the code column is copied unchanged.
pub fn expand_applicants(batch: &NormalizedBatch) -> ExplodedTable<'_> {
    let rows = batch
        .records
        .iter()
        .flat_map(|record| {
            record.applicant_list.iter().map(move |applicant| ExplodedRow {
                record,
                applicant: applicant.trim(),
                code: record.classification(),
            })
        })
        .collect();

    ExplodedTable {
        expansion: Expansion::Applicant,
        optional: batch.optional,
        rows,
    }
}

/// One row per classification code; the applicant column is copied unchanged.
pub fn expand_codes(batch: &NormalizedBatch) -> ExplodedTable<'_> {
    let rows = batch
        .records
        .iter()
        .flat_map(|record| {
            record.code_list.iter().map(move |code| ExplodedRow {
                record,
                applicant: &record.applicant,
                code: code.trim(),
            })
        })
        .collect();

    ExplodedTable {
        expansion: Expansion::Code,
        optional: batch.optional,
        rows,
    }
}

/// One row per (applicant, code) pair of each record.
///
/// Every pair carries a full count of 1, so a record with 3 applicants and
/// 4 codes contributes 12 rows.
pub fn expand_joint(batch: &NormalizedBatch) -> ExplodedTable<'_> {
    let rows = batch
        .records
        .iter()
        .flat_map(|record| {
            record.applicant_list.iter().flat_map(move |applicant| {
                record.code_list.iter().map(move |code| ExplodedRow {
                    record,
                    applicant: applicant.trim(),
                    code: code.trim(),
                })
            })
        })
        .collect();

    ExplodedTable {
        expansion: Expansion::Joint,
        optional: batch.optional,
        rows,
    }
}

/// The three expansions of one batch.
#[derive(Debug, Clone)]
pub struct Expanded<'a> {
    applicants: ExplodedTable<'a>,
    codes: ExplodedTable<'a>,
    joint: ExplodedTable<'a>,
}

impl<'a> Expanded<'a> {
    pub fn applicants(&self) -> &ExplodedTable<'a> {
        &self.applicants
    }

    pub fn codes(&self) -> &ExplodedTable<'a> {
        &self.codes
    }

    pub fn joint(&self) -> &ExplodedTable<'a> {
        &self.joint
    }
}

/// Run all three expansions.
pub fn expand_all(batch: &NormalizedBatch) -> Expanded<'_> {
    Expanded {
        applicants: expand_applicants(batch),
        codes: expand_codes(batch),
        joint: expand_joint(batch),
    }
}
