//! JSON report handed to the presentation layer.
//!
//! Group tables are flattened into named rows so a chart can bind to them
//! directly.

use serde::Serialize;

use crate::models::{CrossTable, FrequencyTable, TopN};
use crate::transform::categories::CategoryAnalysis;
use crate::transform::pipeline::{AnalysisOutput, BatchSummary, CsvInfo, Heatmaps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Every view is available.
    Ready,
    /// Category views are missing or partial.
    Warning,
}

/// `(year, entity, count)` row of a trend table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearEntityRow {
    pub year: i32,
    pub entity: String,
    pub count: u64,
}

/// `(applicant, code, count)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantCodeRow {
    pub applicant: String,
    pub code: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub applicants: FrequencyTable<String>,
    pub codes: FrequencyTable<String>,
    pub top_applicants: TopN,
    pub top_codes: TopN,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    /// Records per year, ascending.
    pub years: FrequencyTable<i32>,
    pub year_applicant: Vec<YearEntityRow>,
    pub year_code: Vec<YearEntityRow>,
    pub applicant_code: Vec<ApplicantCodeRow>,
}

/// Complete analysis of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub status: ReportStatus,
    pub warnings: Vec<String>,
    pub csv_info: CsvInfo,
    pub summary: BatchSummary,
    pub rankings: Rankings,
    pub trends: Trends,
    pub heatmaps: Heatmaps,
    pub categories: Option<CategoryAnalysis>,
}

impl AnalysisReport {
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl From<AnalysisOutput> for AnalysisReport {
    fn from(output: AnalysisOutput) -> Self {
        let mut warnings = Vec::new();
        match &output.categories {
            None => warnings.push(format!(
                "Category analysis unavailable (missing: {})",
                output.missing_optional.join(", ")
            )),
            Some(categories) => warnings.extend(categories.warnings.iter().cloned()),
        }

        let status = if warnings.is_empty() {
            ReportStatus::Ready
        } else {
            ReportStatus::Warning
        };

        let aggregates = output.aggregates;

        Self {
            status,
            warnings,
            csv_info: output.csv_info,
            summary: output.summary,
            rankings: Rankings {
                applicants: aggregates.applicant_counts,
                codes: aggregates.code_counts,
                top_applicants: aggregates.top_applicants,
                top_codes: aggregates.top_codes,
            },
            trends: Trends {
                years: aggregates.year_counts,
                year_applicant: year_rows(&aggregates.year_applicant),
                year_code: year_rows(&aggregates.year_code),
                applicant_code: aggregates
                    .applicant_code
                    .iter()
                    .map(|e| ApplicantCodeRow {
                        applicant: e.row.clone(),
                        code: e.col.clone(),
                        count: e.count,
                    })
                    .collect(),
            },
            heatmaps: output.heatmaps,
            categories: output.categories,
        }
    }
}

fn year_rows(table: &CrossTable<i32, String>) -> Vec<YearEntityRow> {
    table
        .iter()
        .map(|e| YearEntityRow {
            year: e.row,
            entity: e.col.clone(),
            count: e.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::transform::pipeline::analyze_records;
    use serde_json::json;

    fn run(with_categories: bool) -> AnalysisReport {
        let mut headers = vec!["出願日".to_string(), "出願人/権利者".into(), "FI".into()];
        let mut row = json!({"出願日": "2020-01-01", "出願人/権利者": "X", "FI": "A"});
        if with_categories {
            headers.push("課題分類".into());
            headers.push("解決手段分類".into());
            row["課題分類"] = json!("cost");
            row["解決手段分類"] = json!("ai");
        }
        analyze_records(vec![row], headers, &AnalysisConfig::default())
            .unwrap()
            .into()
    }

    #[test]
    fn test_status_ready_with_categories() {
        let report = run(true);
        assert_eq!(report.status, ReportStatus::Ready);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_status_warning_without_categories() {
        let report = run(false);
        assert_eq!(report.status, ReportStatus::Warning);
        assert!(report.warnings[0].contains("課題分類"));
    }

    #[test]
    fn test_json_shape() {
        let report = run(false);
        let value: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();

        assert_eq!(value["status"], "warning");
        assert_eq!(value["summary"]["totalRecords"], 1);
        assert_eq!(value["trends"]["years"][0]["entity"], 2020);
        assert_eq!(value["trends"]["yearApplicant"][0]["entity"], "X");
        assert_eq!(value["rankings"]["topApplicants"]["withOthers"][0]["count"], 1);
        assert_eq!(value["heatmaps"]["applicantYear"]["colKeys"][0], 2020);
        assert!(value["categories"].is_null());
    }
}
