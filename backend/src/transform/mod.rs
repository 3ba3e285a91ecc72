//! Transformation module.
//!
//! The analysis stages, leaves first:
//! - Normalize: year extraction, marker stripping, list splitting
//! - Expand: one row per applicant, per code, per (applicant, code)
//! - Aggregate: rankings, top-N, year and pair group counts
//! - Matrix: dense heatmap matrices over explicit key orderings
//! - Categories: optional problem / solution analysis
//! - Pipeline: chains every stage on one batch

pub mod aggregate;
pub mod categories;
pub mod expand;
pub mod matrix;
pub mod normalize;
pub mod pipeline;

pub use aggregate::{aggregate, Aggregates};
pub use categories::{analyze_categories, ApplicantCategoryBreakdown, CategoryAnalysis};
pub use expand::{expand_all, Dimension, Expanded, Expansion, ExplodedRow, ExplodedTable};
pub use matrix::{build_matrix, crosstab, DenseMatrix};
pub use normalize::{normalize, parse_year, split_applicants, split_codes, strip_markers};
pub use pipeline::*;
