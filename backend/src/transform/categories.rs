//! Problem / solution category analysis.
//!
//! Runs only when the batch carries both category columns. Everything here is
//! best-effort: insufficient data produces a partial result with warnings,
//! never an error.

use serde::Serialize;
use std::collections::HashSet;

use super::expand::{Dimension, ExplodedRow, ExplodedTable};
use super::matrix::{crosstab, DenseMatrix};
use crate::config::AnalysisConfig;
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{CrossEntry, CrossTable, FrequencyTable, NormalizedBatch, NormalizedRecord};

/// Category breakdown of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAnalysis {
    /// Records carrying both categories.
    pub total_records: usize,
    pub problem_counts: FrequencyTable<String>,
    pub solution_counts: FrequencyTable<String>,
    /// Problem × solution, over sorted keys.
    pub cross_tab: DenseMatrix<String, String>,
    pub year_problem: CrossTable<i32, String>,
    pub year_solution: CrossTable<i32, String>,
    /// Per-applicant breakdown, when an applicant table was available.
    pub applicants: Option<ApplicantCategoryBreakdown>,
    /// Most frequent problem × solution pairs, count descending.
    pub top_combinations: Vec<CrossEntry<String, String>>,
    /// Non-fatal conditions met during the analysis.
    pub warnings: Vec<String>,
}

impl CategoryAnalysis {
    pub fn num_problems(&self) -> usize {
        self.problem_counts.len()
    }

    pub fn num_solutions(&self) -> usize {
        self.solution_counts.len()
    }

    /// No record carried both categories.
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Applicant × category counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantCategoryBreakdown {
    /// Highest-volume applicants the cross-tabs are restricted to.
    pub top_applicants: FrequencyTable<String>,
    /// (applicant, problem) counts over every applicant.
    pub problem_counts: CrossTable<String, String>,
    /// (applicant, solution) counts over every applicant.
    pub solution_counts: CrossTable<String, String>,
    /// Applicant × problem over the top applicants only.
    pub problem_cross: DenseMatrix<String, String>,
    /// Applicant × solution over the top applicants only.
    pub solution_cross: DenseMatrix<String, String>,
}

/// Analyse the category columns of a batch.
///
/// Returns `None` when either category column is missing. `applicants`
/// is the applicant-expanded table of the same batch, if available.
pub fn analyze_categories(
    batch: &NormalizedBatch,
    applicants: Option<&ExplodedTable<'_>>,
    config: &AnalysisConfig,
) -> Option<CategoryAnalysis> {
    if !batch.optional.both() {
        return None;
    }

    let mut warnings = Vec::new();

    let filtered: Vec<(&NormalizedRecord, &str, &str)> = batch
        .records
        .iter()
        .filter_map(|r| Some((r, r.problem_category()?, r.solution_category()?)))
        .collect();

    if filtered.is_empty() {
        warn(&mut warnings, "No record has both a problem and a solution category");
    }

    let problem_counts = FrequencyTable::tally(filtered.iter().map(|(_, p, _)| p.to_string()));
    let solution_counts = FrequencyTable::tally(filtered.iter().map(|(_, _, s)| s.to_string()));
    let pairs = CrossTable::tally(
        filtered
            .iter()
            .map(|(_, p, s)| (p.to_string(), s.to_string())),
    );
    let cross_tab = crosstab(&pairs);

    let year_problem = CrossTable::tally(filtered.iter().map(|(r, p, _)| (r.year, p.to_string())));
    let year_solution =
        CrossTable::tally(filtered.iter().map(|(r, _, s)| (r.year, s.to_string())));

    let applicants = match applicants {
        Some(table) if carries_categories(table) => {
            applicant_breakdown(table, config.category_top_applicants, &mut warnings)
        }
        Some(_) => {
            warn(&mut warnings, "Applicant table has no category columns");
            None
        }
        None => None,
    };

    let top_combinations = top_combinations(&cross_tab, config.top_combinations);

    if !filtered.is_empty() {
        log_success(format!(
            "{} records categorised ({} problems, {} solutions)",
            filtered.len(),
            problem_counts.len(),
            solution_counts.len()
        ));
    }

    Some(CategoryAnalysis {
        total_records: filtered.len(),
        problem_counts,
        solution_counts,
        cross_tab,
        year_problem,
        year_solution,
        applicants,
        top_combinations,
        warnings,
    })
}

fn carries_categories(table: &ExplodedTable<'_>) -> bool {
    table.carries(Dimension::ProblemCategory) && table.carries(Dimension::SolutionCategory)
}

/// Cross-tab applicants against both categories.
///
/// Rows missing a category or the applicant are dropped first. The dense
/// cross-tabs cover at most `cap` applicants, ranked by row count.
fn applicant_breakdown(
    table: &ExplodedTable<'_>,
    cap: usize,
    warnings: &mut Vec<String>,
) -> Option<ApplicantCategoryBreakdown> {
    let rows: Vec<(&str, &str, &str)> = table.iter().filter_map(categorised).collect();

    if rows.is_empty() {
        warn(warnings, "No applicant row has both categories");
        return None;
    }

    let ranking = FrequencyTable::tally(rows.iter().map(|(a, _, _)| a.to_string()));
    let top_applicants = FrequencyTable::from_entries(ranking.iter().take(cap).cloned().collect());
    let top: HashSet<&str> = top_applicants.keys().map(String::as_str).collect();

    let problem_counts = CrossTable::tally(rows.iter().map(|(a, p, _)| (a.to_string(), p.to_string())));
    let solution_counts =
        CrossTable::tally(rows.iter().map(|(a, _, s)| (a.to_string(), s.to_string())));

    let restricted: Vec<&(&str, &str, &str)> =
        rows.iter().filter(|row| top.contains(&row.0)).collect();
    let problem_cross = crosstab(&CrossTable::tally(
        restricted.iter().map(|(a, p, _)| (a.to_string(), p.to_string())),
    ));
    let solution_cross = crosstab(&CrossTable::tally(
        restricted.iter().map(|(a, _, s)| (a.to_string(), s.to_string())),
    ));

    log_info(format!(
        "Category cross-tabs restricted to top {} applicants",
        top_applicants.len()
    ));

    Some(ApplicantCategoryBreakdown {
        top_applicants,
        problem_counts,
        solution_counts,
        problem_cross,
        solution_cross,
    })
}

/// (applicant, problem, solution) of a row, if all three are present.
fn categorised<'a>(row: &ExplodedRow<'a>) -> Option<(&'a str, &'a str, &'a str)> {
    let applicant = row.value(Dimension::Applicant).filter(|a| !a.is_empty())?;
    let problem = row.value(Dimension::ProblemCategory)?;
    let solution = row.value(Dimension::SolutionCategory)?;
    Some((applicant, problem, solution))
}

/// The `limit` largest cells of a cross-tab, zero cells excluded.
///
/// Cells are visited column by column; equal counts keep that order.
pub fn top_combinations(
    cross_tab: &DenseMatrix<String, String>,
    limit: usize,
) -> Vec<CrossEntry<String, String>> {
    let mut cells = cross_tab.melt();
    cells.sort_by(|a, b| b.count.cmp(&a.count));
    cells.truncate(limit);
    cells.retain(|c| c.count > 0);
    cells
}

fn warn(warnings: &mut Vec<String>, message: &str) {
    log_warning(message);
    warnings.push(message.to_string());
}
