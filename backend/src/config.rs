//! Analysis configuration.
//!
//! Defaults mirror the layout of the patent database exports the dashboard
//! was built for. Every value can be overridden from the environment
//! (see [`AnalysisConfig::from_env`]) or from the command line.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{ConfigError, ConfigResult};

/// Number of applicants/codes kept in primary rankings.
pub const DEFAULT_TOP_N: usize = 10;

/// Number of applicants kept for the applicant × category cross-tabs.
pub const DEFAULT_CATEGORY_TOP_APPLICANTS: usize = 15;

/// Maximum number of problem × solution combinations reported.
pub const DEFAULT_TOP_COMBINATIONS: usize = 20;

/// Label of the residual bucket in share tables.
pub const DEFAULT_OTHERS_LABEL: &str = "others";

/// Source header names for each logical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnNames {
    /// Application date (required).
    pub application_date: String,
    /// Applicant / rights holder, comma-joined (required).
    pub applicant: String,
    /// Classification code, comma-joined (required).
    pub classification: String,
    /// Problem category (optional).
    pub problem_category: String,
    /// Solution category (optional).
    pub solution_category: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            application_date: "出願日".to_string(),
            applicant: "出願人/権利者".to_string(),
            classification: "FI".to_string(),
            problem_category: "課題分類".to_string(),
            solution_category: "解決手段分類".to_string(),
        }
    }
}

impl ColumnNames {
    /// Columns every batch must carry.
    pub fn required(&self) -> [&str; 3] {
        [&self.application_date, &self.applicant, &self.classification]
    }

    /// Columns that enable the category analysis when both are present.
    pub fn optional(&self) -> [&str; 2] {
        [&self.problem_category, &self.solution_category]
    }
}

/// Tunables for a single analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Top-N cutoff for applicant and code rankings.
    pub top_n: usize,
    /// Applicant cap for the category cross-tabs.
    pub category_top_applicants: usize,
    /// Maximum problem × solution combinations in the ranking.
    pub top_combinations: usize,
    /// Label used for the residual share bucket.
    pub others_label: String,
    /// Header names.
    pub columns: ColumnNames,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            category_top_applicants: DEFAULT_CATEGORY_TOP_APPLICANTS,
            top_combinations: DEFAULT_TOP_COMBINATIONS,
            others_label: DEFAULT_OTHERS_LABEL.to_string(),
            columns: ColumnNames::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from `PATDASH_*` environment variables.
    ///
    /// Unset variables keep their default. Call `dotenvy::dotenv()` first if
    /// a `.env` file should be honoured.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("PATDASH_TOP_N") {
            config.top_n = parse_count("PATDASH_TOP_N", &v)?;
        }
        if let Some(v) = lookup("PATDASH_CATEGORY_TOP_APPLICANTS") {
            config.category_top_applicants = parse_count("PATDASH_CATEGORY_TOP_APPLICANTS", &v)?;
        }
        if let Some(v) = lookup("PATDASH_TOP_COMBINATIONS") {
            config.top_combinations = parse_count("PATDASH_TOP_COMBINATIONS", &v)?;
        }
        if let Some(v) = lookup("PATDASH_OTHERS_LABEL") {
            config.others_label = non_empty("PATDASH_OTHERS_LABEL", v)?;
        }

        let columns = &mut config.columns;
        let overrides: [(&str, &mut String); 5] = [
            ("PATDASH_COL_DATE", &mut columns.application_date),
            ("PATDASH_COL_APPLICANT", &mut columns.applicant),
            ("PATDASH_COL_CODE", &mut columns.classification),
            ("PATDASH_COL_PROBLEM", &mut columns.problem_category),
            ("PATDASH_COL_SOLUTION", &mut columns.solution_category),
        ];
        for (key, slot) in overrides {
            if let Some(v) = lookup(key) {
                *slot = non_empty(key, v)?;
            }
        }

        Ok(config)
    }
}

fn parse_count(key: &str, value: &str) -> ConfigResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn non_empty(key: &str, value: String) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(key.to_string()));
    }
    Ok(trimmed.to_string())
}
