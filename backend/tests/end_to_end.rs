use std::io::Write;

use patdash::{
    analyze_csv, expand_all, normalize, AnalysisConfig, AnalysisReport, OptionalColumns,
    PipelineError, RecordBatch, ReportStatus,
};
use serde_json::json;
use tempfile::NamedTempFile;

fn csv_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

const SCENARIO: &str = "出願日,出願人/権利者,FI\n\
2020-02-01,\"X, Y\",A\n\
2020-08-15,X,\"A,B\"\n\
2021-01-20,Z,B\n";

#[test]
fn scenario_row_counts_and_year_table() {
    let file = csv_file(SCENARIO.as_bytes());
    let output = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap();

    let years: Vec<(i32, u64)> = output
        .aggregates
        .year_counts
        .iter()
        .map(|e| (e.entity, e.count))
        .collect();
    assert_eq!(years, vec![(2020, 2), (2021, 1)]);

    // Applicant rows: 2 + 1 + 1, code rows: 1 + 2 + 1
    assert_eq!(output.aggregates.applicant_counts.total(), 4);
    assert_eq!(output.aggregates.code_counts.total(), 4);
    assert_eq!(output.aggregates.top_applicants.names(), vec!["X", "Y", "Z"]);
    assert_eq!(output.aggregates.top_applicants.others, 0);
}

#[test]
fn scenario_exploded_tables_from_rows() {
    let rows = vec![
        json!({"出願日": "2020-02-01", "出願人/権利者": "X, Y", "FI": "A"}),
        json!({"出願日": "2020-08-15", "出願人/権利者": "X", "FI": "A,B"}),
        json!({"出願日": "2021-01-20", "出願人/権利者": "Z", "FI": "B"}),
    ];
    let config = AnalysisConfig::default();
    let batch = RecordBatch::from_rows(
        &rows,
        vec!["出願日".into(), "出願人/権利者".into(), "FI".into()],
        OptionalColumns::default(),
        &config.columns,
    );
    let batch = normalize(batch).unwrap();
    let expanded = expand_all(&batch);

    assert_eq!(expanded.applicants().len(), 4);
    assert_eq!(expanded.codes().len(), 4);
    // 2×1 + 1×2 + 1×1
    assert_eq!(expanded.joint().len(), 5);
}

#[test]
fn shift_jis_export_with_categories() {
    let source = "出願日,出願人/権利者,FI,課題分類,解決手段分類\n\
2019/04/01,▲トヨタ自動車株式会社▼,\"B60W30/00,301\",安全性,センサ\n\
2020/04/01,\"トヨタ自動車株式会社,デンソー株式会社\",G08G1/16,安全性,制御\n\
2020/05/01,本田技研工業株式会社,G08G1/16,,制御\n";
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(source);
    let file = csv_file(&bytes);

    let output = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap();
    assert_eq!(output.csv_info.encoding, "shift_jis");
    assert_eq!(
        output.aggregates.top_applicants.names()[0],
        "トヨタ自動車株式会社"
    );
    assert_eq!(output.aggregates.top_codes.names(), vec!["G08G1/16", "B60W30/00,301"]);

    let categories = output.categories.as_ref().unwrap();
    assert_eq!(categories.total_records, 2);
    assert_eq!(categories.num_problems(), 1);
    assert_eq!(categories.num_solutions(), 2);
    let breakdown = categories.applicants.as_ref().unwrap();
    assert_eq!(breakdown.top_applicants.len(), 2);

    let report = AnalysisReport::from(output);
    assert_eq!(report.status, ReportStatus::Ready);
}

#[test]
fn categories_absent_without_both_columns() {
    let file = csv_file("出願日,出願人/権利者,FI,課題分類\n2020-01-01,X,A,cost\n".as_bytes());
    let output = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap();

    assert!(output.categories.is_none());
    assert_eq!(output.missing_optional, vec!["解決手段分類"]);
    assert_eq!(AnalysisReport::from(output).status, ReportStatus::Warning);
}

#[test]
fn categories_with_no_complete_row_warn() {
    let file = csv_file(
        "出願日,出願人/権利者,FI,課題分類,解決手段分類\n\
2020-01-01,X,A,cost,\n\
2021-01-01,Y,B,,ai\n"
            .as_bytes(),
    );
    let output = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap();

    let categories = output.categories.as_ref().unwrap();
    assert_eq!(categories.total_records, 0);
    assert!(!categories.warnings.is_empty());
    assert_eq!(AnalysisReport::from(output).status, ReportStatus::Warning);
}

#[test]
fn record_without_codes_is_excluded_from_code_views_only() {
    let file = csv_file("出願日,出願人/権利者,FI\n2020-01-01,X,\n2021-01-01,Y,B\n".as_bytes());
    let output = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap();

    assert_eq!(output.summary.total_records, 2);
    assert_eq!(output.aggregates.applicant_counts.total(), 2);
    assert_eq!(output.aggregates.code_counts.total(), 1);
    assert_eq!(output.heatmaps.code_year.col_keys, vec![2020, 2021]);
    assert_eq!(output.heatmaps.code_year.values, vec![vec![0, 1]]);
}

#[test]
fn unparseable_date_rejects_batch() {
    let file = csv_file("出願日,出願人/権利者,FI\n2020-01-01,X,A\nunknown,Y,B\n".as_bytes());
    let err = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Normalize { .. }));
    let message = err.to_string();
    assert!(message.contains("unknown"));
    assert!(message.contains("2 rows"));
}

#[test]
fn missing_required_column_is_fatal() {
    let file = csv_file("出願日,FI\n2020-01-01,A\n".as_bytes());
    let err = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap_err();
    assert!(err.to_string().contains("出願人/権利者"));
}

#[test]
fn report_serializes_to_camel_case_json() {
    let file = csv_file(SCENARIO.as_bytes());
    let output = analyze_csv(file.path(), &AnalysisConfig::default()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&AnalysisReport::from(output).to_json(true).unwrap()).unwrap();

    assert_eq!(json["summary"]["yearSpan"], 2);
    assert_eq!(json["heatmaps"]["applicantCode"]["rowKeys"], json!(["X", "Y", "Z"]));
    assert_eq!(json["trends"]["applicantCode"][0]["applicant"], "X");
}
