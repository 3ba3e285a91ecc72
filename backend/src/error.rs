//! Error types for the patdash analysis pipeline.
//!
//! One error type per stage, from ingestion to aggregation:
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`ValidationError`] - Missing required columns
//! - [`DateParseError`] - Unparseable application date
//! - [`AggregateError`] - Grouping/counting failures
//! - [`ConfigError`] - Invalid configuration values
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Conversion into [`PipelineError`] is automatic via `From` where no batch
//! context is needed, so `?` works across stage boundaries. Normalisation and
//! aggregation failures are wrapped with a [`BatchContext`] by the pipeline.

use std::fmt;

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading a tabular export.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the detected encoding.
    #[error("Failed to decode content as {0}")]
    EncodingError(String),

    /// Malformed CSV record.
    #[error("Invalid CSV at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Column Validation Errors
// =============================================================================

/// Errors while checking the column layout of a batch.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more required columns are absent.
    #[error("Missing required columns: {} (available: {})", missing.join(", "), available.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },
}

// =============================================================================
// Normalisation Errors
// =============================================================================

/// An application date that could not be parsed.
///
/// Raised for the first offending row; the whole batch is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cannot parse application date '{value}' (row {row})")]
pub struct DateParseError {
    /// 1-based data row number (header excluded).
    pub row: usize,
    /// The raw cell value.
    pub value: String,
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Errors while grouping or counting exploded tables.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// A grouping dimension is not carried by the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// An exploded table does not match the batch it is aggregated with.
    #[error("Shape mismatch in {table} table: expected {expected} rows, found {actual}")]
    ShapeMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting could not be parsed.
    #[error("Invalid value for {key}: '{value}' (expected a positive integer)")]
    InvalidNumber { key: String, value: String },

    /// A label or column name was set to an empty string.
    #[error("{0} must not be empty")]
    Empty(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Row count and column list of the batch that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchContext {
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl fmt::Display for BatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows, columns: [{}]",
            self.row_count,
            self.columns.join(", ")
        )
    }
}

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::transform::pipeline::analyze_batch`]
/// and friends. Every variant is fatal for the whole batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV ingestion error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Column validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Date parsing failed during normalisation.
    #[error("Normalisation failed: {source} ({context})")]
    Normalize {
        source: DateParseError,
        context: BatchContext,
    },

    /// Aggregation failed.
    #[error("Aggregation failed: {source} ({context})")]
    Aggregate {
        source: AggregateError,
        context: BatchContext,
    },

    /// No records to analyse.
    #[error("No records to analyse")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for aggregation operations.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
