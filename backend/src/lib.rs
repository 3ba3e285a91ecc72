//! # patdash - Patent application analytics
//!
//! patdash turns a patent database export (one row per application) into
//! the ranked, grouped and pivoted tables a dashboard draws its charts from.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Normalize  │────▶│   Expand    │
//! │ (SJIS/UTF8) │     │  (auto-enc) │     │ (year/split)│     │ (explode)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                     ┌─────────────┐     ┌─────────────┐     ┌──────▼──────┐
//!                     │ JSON Report │◀────│  Heatmaps / │◀────│  Aggregate  │
//!                     │             │     │ Categories  │     │  (top-N)    │
//!                     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use patdash::{analyze_csv, AnalysisConfig, AnalysisReport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = analyze_csv("export.csv", &AnalysisConfig::default())?;
//!     let report = AnalysisReport::from(output);
//!     println!("{}", report.to_json(true)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Cutoffs and column names
//! - [`logs`] - Progress log broadcaster
//! - [`models`] - Records and count tables
//! - [`parser`] - CSV parsing with auto-detection
//! - [`validation`] - Column layout checks
//! - [`transform`] - Normalisation, expansion, aggregation and pipeline
//! - [`report`] - JSON report for the presentation layer

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregateError, BatchContext, ConfigError, CsvError, DateParseError, PipelineError,
    PipelineResult, ValidationError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{AnalysisConfig, ColumnNames};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CrossEntry, CrossTable, FrequencyEntry, FrequencyTable, NormalizedBatch, NormalizedRecord,
    OptionalColumns, Record, RecordBatch, ShareEntry, TopN,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    csv_to_json, decode_content, detect_delimiter, detect_encoding, parse_bytes_auto,
    parse_csv, parse_csv_file_auto, ParseResult,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{validate_columns, ColumnSet};

// =============================================================================
// Re-exports - Stages
// =============================================================================

pub use transform::{
    aggregate, analyze_categories, build_matrix, crosstab, expand_all, normalize, split_codes,
    Aggregates, CategoryAnalysis, DenseMatrix, Dimension, Expanded, ExplodedTable,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    analyze_batch, analyze_bytes, analyze_csv, analyze_records, AnalysisOutput, BatchSummary,
    CsvInfo, Heatmaps,
};

// =============================================================================
// Re-exports - Report
// =============================================================================

pub use report::{AnalysisReport, ReportStatus};
