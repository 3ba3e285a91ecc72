//! Dense matrix construction for heatmaps.
//!
//! A [`DenseMatrix`] is laid out exactly along the caller's key orderings:
//! keys missing from the cross table produce zero rows/columns, and cells
//! whose keys are not in the orderings are dropped.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{CrossEntry, CrossTable};

/// A fully populated count matrix over two explicit key orderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenseMatrix<R, C> {
    pub row_keys: Vec<R>,
    pub col_keys: Vec<C>,
    /// `values[i][j]` is the count for `(row_keys[i], col_keys[j])`.
    pub values: Vec<Vec<u64>>,
}

impl<R, C> DenseMatrix<R, C> {
    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_keys.len(), self.col_keys.len())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u64> {
        self.values.get(row)?.get(col).copied()
    }

    /// Largest cell, 0 for an empty matrix.
    pub fn max(&self) -> u64 {
        self.values.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.values.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() || self.col_keys.is_empty()
    }
}

impl<R: Clone, C: Clone> DenseMatrix<R, C> {
    /// Every cell as a `(row, col, count)` triple, column by column.
    pub fn melt(&self) -> Vec<CrossEntry<R, C>> {
        let mut cells = Vec::with_capacity(self.row_keys.len() * self.col_keys.len());
        for (j, col) in self.col_keys.iter().enumerate() {
            for (i, row) in self.row_keys.iter().enumerate() {
                cells.push(CrossEntry {
                    row: row.clone(),
                    col: col.clone(),
                    count: self.values[i][j],
                });
            }
        }
        cells
    }
}

impl<R: PartialEq, C: PartialEq> DenseMatrix<R, C> {
    /// Count for a pair of keys, if both are on the axes.
    pub fn lookup(&self, row: &R, col: &C) -> Option<u64> {
        let i = self.row_keys.iter().position(|k| k == row)?;
        let j = self.col_keys.iter().position(|k| k == col)?;
        self.get(i, j)
    }
}

/// Lay a cross table out along `rows` × `cols`.
///
/// The output shape is always `rows.len() × cols.len()`, in the given order.
pub fn build_matrix<R, C>(table: &CrossTable<R, C>, rows: &[R], cols: &[C]) -> DenseMatrix<R, C>
where
    R: Eq + Hash + Clone,
    C: Eq + Hash + Clone,
{
    let mut cells: HashMap<(&R, &C), u64> = HashMap::with_capacity(table.len());
    for entry in table.iter() {
        *cells.entry((&entry.row, &entry.col)).or_insert(0) += entry.count;
    }

    let values = rows
        .iter()
        .map(|row| {
            cols.iter()
                .map(|col| cells.get(&(row, col)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    DenseMatrix {
        row_keys: rows.to_vec(),
        col_keys: cols.to_vec(),
        values,
    }
}

/// Lay a cross table out along its own sorted keys (a plain cross-tab).
pub fn crosstab<R, C>(table: &CrossTable<R, C>) -> DenseMatrix<R, C>
where
    R: Eq + Hash + Ord + Clone,
    C: Eq + Hash + Ord + Clone,
{
    build_matrix(table, &table.row_keys(), &table.col_keys())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    fn sample() -> CrossTable<String, i32> {
        CrossTable::tally(vec![
            (s("X"), 2020),
            (s("X"), 2020),
            (s("X"), 2021),
            (s("Y"), 2021),
            (s("Z"), 2019),
        ])
    }

    #[test]
    fn test_cells_match_lookup_or_zero() {
        let table = sample();
        let rows = vec![s("Y"), s("X")];
        let cols = vec![2021, 2020];
        let matrix = build_matrix(&table, &rows, &cols);

        assert_eq!(matrix.values, vec![vec![1, 0], vec![1, 2]]);
        for (i, r) in rows.iter().enumerate() {
            for (j, c) in cols.iter().enumerate() {
                assert_eq!(matrix.get(i, j), Some(table.get(r, c)));
            }
        }
    }

    #[test]
    fn test_shape_follows_orderings_not_table() {
        let table = sample();
        // "W" and 2030 are absent from the table; "Z" and 2019 are omitted
        let rows = vec![s("W"), s("X"), s("Y")];
        let cols = vec![2020, 2021, 2030, 2031];
        let matrix = build_matrix(&table, &rows, &cols);

        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(matrix.values[0], vec![0, 0, 0, 0]);
        assert_eq!(matrix.lookup(&s("X"), &2030), Some(0));
        // Z's contribution is dropped, not folded anywhere
        assert_eq!(matrix.total(), table.total() - 1);
    }

    #[test]
    fn test_empty_orderings() {
        let table = sample();
        let matrix = build_matrix(&table, &[], &[2020]);
        assert_eq!(matrix.shape(), (0, 1));
        assert!(matrix.is_empty());
        assert_eq!(matrix.max(), 0);
    }

    #[test]
    fn test_crosstab_uses_sorted_keys() {
        let matrix = crosstab(&sample());
        assert_eq!(matrix.row_keys, vec![s("X"), s("Y"), s("Z")]);
        assert_eq!(matrix.col_keys, vec![2019, 2020, 2021]);
        assert_eq!(matrix.max(), 2);
    }

    #[test]
    fn test_melt_is_column_major() {
        let table = CrossTable::tally(vec![(s("a"), s("p")), (s("b"), s("q"))]);
        let matrix = crosstab(&table);
        let melted = matrix.melt();
        let cells: Vec<(&str, &str, u64)> = melted
            .iter()
            .map(|e| (e.row.as_str(), e.col.as_str(), e.count))
            .collect();
        assert_eq!(
            cells,
            vec![("a", "p", 1), ("b", "p", 0), ("a", "q", 0), ("b", "q", 1)]
        );
    }
}
