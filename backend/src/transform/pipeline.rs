//! High-level pipeline API.
//!
//! Chains every stage on one in-memory batch:
//!
//! ```text
//! parse → validate columns → normalise → expand → aggregate → heatmaps
//!                                                           → categories
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use patdash::{analyze_csv, AnalysisConfig};
//!
//! let output = analyze_csv("export.csv", &AnalysisConfig::default())?;
//! println!("{} records, {} years", output.summary.total_records, output.summary.year_span);
//! ```

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::aggregate::{aggregate, Aggregates};
use super::categories::{analyze_categories, CategoryAnalysis};
use super::expand::expand_all;
use super::matrix::{build_matrix, DenseMatrix};
use super::normalize::normalize;
use crate::config::AnalysisConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{NormalizedBatch, RecordBatch};
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseResult};
use crate::validation::validate_columns;

/// CSV file information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Headline figures of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_records: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    /// Number of distinct application years.
    pub year_span: usize,
    /// Records per distinct year, rounded down.
    pub average_per_year: usize,
    pub distinct_codes: usize,
}

impl BatchSummary {
    pub fn from_batch(batch: &NormalizedBatch, aggregates: &Aggregates) -> Self {
        let years = batch.years();
        let total_records = batch.len();
        let average_per_year = if years.is_empty() {
            0
        } else {
            total_records / years.len()
        };

        Self {
            total_records,
            first_year: years.first().copied(),
            last_year: years.last().copied(),
            year_span: years.len(),
            average_per_year,
            distinct_codes: aggregates.code_counts.len(),
        }
    }
}

/// Heatmap inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmaps {
    /// Top applicants × every year, ascending.
    pub applicant_year: DenseMatrix<String, i32>,
    /// Top codes × every year, ascending.
    pub code_year: DenseMatrix<String, i32>,
    /// Top applicants × top codes.
    pub applicant_code: DenseMatrix<String, String>,
}

impl Heatmaps {
    pub fn build(batch: &NormalizedBatch, aggregates: &Aggregates) -> Self {
        let years = batch.years();
        let applicants = aggregates.top_applicants.names();
        let codes = aggregates.top_codes.names();

        Self {
            applicant_year: build_matrix(&aggregates.year_applicant.transposed(), &applicants, &years),
            code_year: build_matrix(&aggregates.year_code.transposed(), &codes, &years),
            applicant_code: build_matrix(&aggregates.applicant_code, &applicants, &codes),
        }
    }
}

/// Everything the analysis produces for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub csv_info: CsvInfo,
    pub summary: BatchSummary,
    pub aggregates: Aggregates,
    pub heatmaps: Heatmaps,
    /// `None` when the category columns are missing.
    pub categories: Option<CategoryAnalysis>,
    /// Optional column headers absent from the input.
    pub missing_optional: Vec<String>,
}

/// Analyse a CSV export.
pub fn analyze_csv<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> PipelineResult<AnalysisOutput> {
    log_info(format!("📖 Reading {}...", path.as_ref().display()));
    let parse_result = parse_csv_file_auto(path)?;
    analyze_parsed(parse_result, config)
}

/// Analyse raw CSV bytes.
///
/// Same as [`analyze_csv`] but accepts bytes instead of a file path.
pub fn analyze_bytes(bytes: &[u8], config: &AnalysisConfig) -> PipelineResult<AnalysisOutput> {
    let parse_result = parse_bytes_auto(bytes)?;
    analyze_parsed(parse_result, config)
}

/// Analyse already-parsed rows.
///
/// Useful when the rows come from somewhere other than a CSV file.
pub fn analyze_records(
    records: Vec<Value>,
    headers: Vec<String>,
    config: &AnalysisConfig,
) -> PipelineResult<AnalysisOutput> {
    let parse_result = ParseResult {
        records,
        encoding: "utf-8".to_string(),
        delimiter: ',',
        headers,
    };
    analyze_parsed(parse_result, config)
}

fn analyze_parsed(parse_result: ParseResult, config: &AnalysisConfig) -> PipelineResult<AnalysisOutput> {
    log_success(format!("Detected encoding: {}", parse_result.encoding));
    log_success(format!(
        "Detected separator: '{}'",
        format_delimiter(parse_result.delimiter)
    ));
    log_success(format!("Read {} rows", parse_result.records.len()));

    let csv_info = CsvInfo {
        encoding: parse_result.encoding.clone(),
        delimiter: parse_result.delimiter,
        headers: parse_result.headers.clone(),
        row_count: parse_result.records.len(),
    };

    log_info("📋 Checking columns...");
    let column_set = validate_columns(&parse_result.headers, &config.columns)?;
    let missing_optional = column_set.missing_optional();
    if !missing_optional.is_empty() {
        log_info(format!(
            "Category analysis unavailable (missing: {})",
            missing_optional.join(", ")
        ));
    }

    let batch = RecordBatch::from_rows(
        &parse_result.records,
        parse_result.headers,
        column_set.optional,
        &config.columns,
    );

    let output = analyze_batch(batch, config)?;
    Ok(AnalysisOutput {
        csv_info,
        missing_optional,
        ..output
    })
}

/// Run every stage after ingestion on a batch.
///
/// The returned `csv_info` describes the batch itself; `missing_optional`
/// is derived from the batch's optional column flags.
pub fn analyze_batch(batch: RecordBatch, config: &AnalysisConfig) -> PipelineResult<AnalysisOutput> {
    if batch.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let csv_info = CsvInfo {
        encoding: "utf-8".to_string(),
        delimiter: ',',
        headers: batch.columns.clone(),
        row_count: batch.len(),
    };
    let missing_optional = missing_optional(&batch, config);

    log_info("🔄 Normalising records...");
    let context = batch.context();
    let batch = normalize(batch).map_err(|source| PipelineError::Normalize { source, context })?;
    log_success(format!("{} records normalised", batch.len()));

    log_info("📦 Expanding list fields...");
    let expanded = expand_all(&batch);
    log_info_indent(format!("applicant rows: {}", expanded.applicants().len()), 1);
    log_info_indent(format!("code rows: {}", expanded.codes().len()), 1);
    log_info_indent(format!("applicant × code rows: {}", expanded.joint().len()), 1);

    let excluded = batch.records.iter().filter(|r| r.code_list.is_empty()).count();
    if excluded > 0 {
        log_warning(format!(
            "{} records have no classification code and are excluded from code counts",
            excluded
        ));
    }

    log_info("📊 Aggregating...");
    let aggregates = aggregate(&batch, &expanded, config).map_err(|source| {
        PipelineError::Aggregate {
            source,
            context: batch.context(),
        }
    })?;
    log_success(format!(
        "{} applicants, {} codes, {} years",
        aggregates.applicant_counts.len(),
        aggregates.code_counts.len(),
        aggregates.year_counts.len()
    ));

    let heatmaps = Heatmaps::build(&batch, &aggregates);
    let summary = BatchSummary::from_batch(&batch, &aggregates);

    let categories = if batch.optional.both() {
        log_info("🎯 Analysing problem / solution categories...");
        analyze_categories(&batch, Some(expanded.applicants()), config)
    } else {
        None
    };

    log_success("Analysis complete");

    Ok(AnalysisOutput {
        csv_info,
        summary,
        aggregates,
        heatmaps,
        categories,
        missing_optional,
    })
}

fn missing_optional(batch: &RecordBatch, config: &AnalysisConfig) -> Vec<String> {
    let mut missing = Vec::new();
    if !batch.optional.problem_category {
        missing.push(config.columns.problem_category.clone());
    }
    if !batch.optional.solution_category {
        missing.push(config.columns.solution_category.clone());
    }
    missing
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
