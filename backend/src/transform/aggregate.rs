//! Frequency and group aggregation.
//!
//! Produces every ranking and grouping the primary views need from one
//! normalised batch and its three expansions:
//!
//! | Output             | Source table | Grouped by        | Filter                  |
//! |--------------------|--------------|-------------------|-------------------------|
//! | `year_counts`      | records      | year              | -                       |
//! | `applicant_counts` | applicant    | applicant         | -                       |
//! | `code_counts`      | code         | code              | -                       |
//! | `year_applicant`   | applicant    | (year, applicant) | applicant in top N      |
//! | `year_code`        | code         | (year, code)      | code in top N           |
//! | `applicant_code`   | joint        | (applicant, code) | both in their top N     |
//!
//! Any failure aborts the whole aggregation; no partial result is returned.

use serde::Serialize;

use super::expand::{Dimension, Expanded, ExplodedTable};
use crate::config::AnalysisConfig;
use crate::error::AggregateResult;
use crate::models::{CrossTable, FrequencyTable, NormalizedBatch, TopN};

/// All primary aggregates of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    /// Records per application year, ascending by year.
    pub year_counts: FrequencyTable<i32>,
    /// Applicant ranking.
    pub applicant_counts: FrequencyTable<String>,
    /// Classification code ranking.
    pub code_counts: FrequencyTable<String>,
    /// Top applicants, plain and with "others".
    pub top_applicants: TopN,
    /// Top codes, plain and with "others".
    pub top_codes: TopN,
    /// (year, applicant) counts for top applicants.
    pub year_applicant: CrossTable<i32, String>,
    /// (year, code) counts for top codes.
    pub year_code: CrossTable<i32, String>,
    /// (applicant, code) counts for top applicants × top codes.
    pub applicant_code: CrossTable<String, String>,
}

/// Count records per application year, ascending by year.
pub fn year_counts(batch: &NormalizedBatch) -> FrequencyTable<i32> {
    FrequencyTable::tally(batch.records.iter().map(|r| r.year)).sorted_by_key()
}

/// Rank the values of a categorical column, count descending.
///
/// Rows where the value is missing are not counted.
pub fn entity_counts(
    table: &ExplodedTable<'_>,
    dimension: Dimension,
) -> AggregateResult<FrequencyTable<String>> {
    table.require(dimension)?;
    Ok(FrequencyTable::tally(
        table
            .iter()
            .filter_map(|row| row.value(dimension))
            .map(String::from),
    ))
}

/// Count rows per (year, value), sorted by year then value.
pub fn year_entity_counts(
    table: &ExplodedTable<'_>,
    dimension: Dimension,
) -> AggregateResult<CrossTable<i32, String>> {
    table.require(dimension)?;
    Ok(CrossTable::tally(table.iter().filter_map(|row| {
        row.value(dimension).map(|v| (row.year(), v.to_string()))
    })))
}

/// Count rows per (row value, column value), sorted by both.
///
/// Rows missing either value are not counted.
pub fn pair_counts(
    table: &ExplodedTable<'_>,
    rows: Dimension,
    cols: Dimension,
) -> AggregateResult<CrossTable<String, String>> {
    table.require(rows)?;
    table.require(cols)?;
    Ok(CrossTable::tally(table.iter().filter_map(|row| {
        match (row.value(rows), row.value(cols)) {
            (Some(r), Some(c)) => Some((r.to_string(), c.to_string())),
            _ => None,
        }
    })))
}

/// Compute every primary aggregate.
pub fn aggregate(
    batch: &NormalizedBatch,
    expanded: &Expanded<'_>,
    config: &AnalysisConfig,
) -> AggregateResult<Aggregates> {
    expanded.applicants().check_shape(batch)?;
    expanded.codes().check_shape(batch)?;
    expanded.joint().check_shape(batch)?;

    let applicant_counts = entity_counts(expanded.applicants(), Dimension::Applicant)?;
    let code_counts = entity_counts(expanded.codes(), Dimension::Code)?;

    let top_applicants = TopN::from_ranking(&applicant_counts, config.top_n, &config.others_label);
    let top_codes = TopN::from_ranking(&code_counts, config.top_n, &config.others_label);

    // Membership is tested against the literal top N, never the "others" bucket
    let year_applicant = year_entity_counts(expanded.applicants(), Dimension::Applicant)?
        .filter(|_, applicant| top_applicants.contains(applicant));
    let year_code = year_entity_counts(expanded.codes(), Dimension::Code)?
        .filter(|_, code| top_codes.contains(code));
    let applicant_code = pair_counts(expanded.joint(), Dimension::Applicant, Dimension::Code)?
        .filter(|applicant, code| top_applicants.contains(applicant) && top_codes.contains(code));

    Ok(Aggregates {
        year_counts: year_counts(batch),
        applicant_counts,
        code_counts,
        top_applicants,
        top_codes,
        year_applicant,
        year_code,
        applicant_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AggregateError;
    use crate::models::{NormalizedRecord, OptionalColumns, Record};
    use crate::transform::expand::{expand_all, expand_applicants};

    fn normalized(year: i32, applicants: &[&str], codes: &[&str]) -> NormalizedRecord {
        NormalizedRecord {
            record: Record {
                row: 1,
                application_date: format!("{}-01-01", year),
                applicant: Some(applicants.join(",")),
                classification: Some(codes.join(",")),
                problem_category: None,
                solution_category: None,
            },
            year,
            applicant: applicants.join(","),
            applicant_list: applicants.iter().map(|s| s.to_string()).collect(),
            code_list: codes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn batch(records: Vec<NormalizedRecord>) -> NormalizedBatch {
        NormalizedBatch {
            columns: vec![],
            optional: OptionalColumns::default(),
            records,
        }
    }

    fn config(top_n: usize) -> AnalysisConfig {
        AnalysisConfig {
            top_n,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_year_counts_sorted_by_year() {
        let batch = batch(vec![
            normalized(2021, &["X"], &["A"]),
            normalized(2020, &["X"], &["A"]),
            normalized(2021, &["X"], &["A"]),
            normalized(2019, &["X"], &["A"]),
        ]);

        let counts = year_counts(&batch);
        let rows: Vec<(i32, u64)> = counts.iter().map(|e| (e.entity, e.count)).collect();
        assert_eq!(rows, vec![(2019, 1), (2020, 1), (2021, 2)]);
    }

    #[test]
    fn test_year_entity_filter_uses_literal_top_n() {
        // A: 3, B: 2, C: 1, D: 1 → top 2 = [A, B]
        let batch = batch(vec![
            normalized(2020, &["A", "B"], &["x"]),
            normalized(2020, &["A", "C"], &["x"]),
            normalized(2021, &["A", "B", "D"], &["x"]),
        ]);
        let expanded = expand_all(&batch);
        let result = aggregate(&batch, &expanded, &config(2)).unwrap();

        assert_eq!(result.top_applicants.names(), vec!["A", "B"]);
        assert_eq!(result.top_applicants.others, 2);

        let kept: Vec<(i32, &str, u64)> = result
            .year_applicant
            .iter()
            .map(|e| (e.row, e.col.as_str(), e.count))
            .collect();
        assert_eq!(kept, vec![(2020, "A", 2), (2020, "B", 1), (2021, "A", 1), (2021, "B", 1)]);
        assert!(result.year_applicant.iter().all(|e| e.col != "others"));
    }

    #[test]
    fn test_applicant_code_is_intersection_filter() {
        // Applicants: P 3, Q 1 → top1 = [P]. Codes: c1 3, c2 1 → top1 = [c1]
        let batch = batch(vec![
            normalized(2020, &["P"], &["c1"]),
            normalized(2020, &["P"], &["c1", "c2"]),
            normalized(2020, &["P", "Q"], &["c1"]),
        ]);
        let expanded = expand_all(&batch);
        let result = aggregate(&batch, &expanded, &config(1)).unwrap();

        let cells: Vec<(&str, &str, u64)> = result
            .applicant_code
            .iter()
            .map(|e| (e.row.as_str(), e.col.as_str(), e.count))
            .collect();
        // (P, c2) and (Q, c1) each match only one side of the filter
        assert_eq!(cells, vec![("P", "c1", 3)]);
    }

    #[test]
    fn test_others_bucket_balances_totals() {
        // Applicant i appears (i + 1) times in its record
        let names: Vec<String> = (0..13).map(|i| format!("co{:02}", i)).collect();
        let batch = batch(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| normalized(2020, &vec![name.as_str(); i + 1], &["x"]))
                .collect(),
        );

        let expanded = expand_all(&batch);
        let result = aggregate(&batch, &expanded, &AnalysisConfig::default()).unwrap();

        let total = result.applicant_counts.total();
        assert_eq!(result.top_applicants.top.len(), 10);
        assert_eq!(result.top_applicants.others, total - result.top_applicants.top.total());
        let share_total: u64 = result.top_applicants.with_others.iter().map(|e| e.count).sum();
        assert_eq!(share_total, total);
        // Three smallest applicants (1 + 2 + 3 rows) fall into "others"
        assert_eq!(result.top_applicants.others, 6);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let batch = batch(vec![
            normalized(2020, &["late"], &["z"]),
            normalized(2020, &["early"], &["y"]),
            normalized(2020, &["late"], &["y"]),
            normalized(2020, &["early"], &["z"]),
        ]);
        let expanded = expand_all(&batch);
        let result = aggregate(&batch, &expanded, &config(10)).unwrap();

        assert_eq!(result.top_applicants.names(), vec!["late", "early"]);
        assert_eq!(result.top_codes.names(), vec!["z", "y"]);
    }

    #[test]
    fn test_mismatched_tables_abort() {
        let small = batch(vec![normalized(2020, &["X"], &["A"])]);
        let big = batch(vec![
            normalized(2020, &["X"], &["A"]),
            normalized(2021, &["Y"], &["B"]),
        ]);
        let expanded = expand_all(&small);

        let err = aggregate(&big, &expanded, &config(10)).unwrap_err();
        assert!(matches!(err, AggregateError::ShapeMismatch { table: "applicant", .. }));
    }

    #[test]
    fn test_missing_category_column_is_reported() {
        let batch = batch(vec![normalized(2020, &["X"], &["A"])]);
        let table = expand_applicants(&batch);

        let err = entity_counts(&table, Dimension::ProblemCategory).unwrap_err();
        assert_eq!(err, AggregateError::MissingColumn("problem category".into()));
    }
}
