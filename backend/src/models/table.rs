//! Count tables produced by aggregation.
//!
//! ```text
//! FrequencyTable  entity → count        ranked, count descending
//! TopN            first N + "others"    share views
//! CrossTable      (row, col) → count    sorted by (row, col)
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

// =============================================================================
// Frequency Table
// =============================================================================

/// One `(entity, count)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry<K> {
    pub entity: K,
    pub count: u64,
}

/// Ordered entity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable<K> {
    entries: Vec<FrequencyEntry<K>>,
}

impl<K> FrequencyTable<K> {
    /// Wrap entries that are already in the wanted order.
    pub fn from_entries(entries: Vec<FrequencyEntry<K>>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FrequencyEntry<K>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencyEntry<K>> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|e| &e.entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    /// Count keys and rank them by count, descending.
    ///
    /// Ties keep the order in which keys were first seen.
    pub fn tally<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut entries: Vec<FrequencyEntry<K>> = Vec::new();

        for key in keys {
            match index.get(&key) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push(FrequencyEntry { entity: key, count: 1 });
                }
            }
        }

        // sort_by is stable
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        Self { entries }
    }

    /// Count for `key`, if it was seen.
    pub fn get(&self, key: &K) -> Option<u64> {
        self.entries.iter().find(|e| &e.entity == key).map(|e| e.count)
    }
}

impl<K: Ord> FrequencyTable<K> {
    /// Reorder by key ascending (used for time axes).
    pub fn sorted_by_key(mut self) -> Self {
        self.entries.sort_by(|a, b| a.entity.cmp(&b.entity));
        self
    }
}

// =============================================================================
// Top-N
// =============================================================================

/// One slice of a share view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareEntry {
    pub entity: String,
    pub count: u64,
    /// `true` for the synthetic residual bucket.
    pub others: bool,
}

/// The first N entities of a ranking, with and without a residual bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopN {
    /// The literal top N, without "others".
    pub top: FrequencyTable<String>,
    /// The top N followed by the "others" bucket when anything remains.
    pub with_others: Vec<ShareEntry>,
    /// Sum of all counts beyond the top N.
    pub others: u64,
}

impl TopN {
    /// Cut `ranking` after `n` entries.
    pub fn from_ranking(ranking: &FrequencyTable<String>, n: usize, others_label: &str) -> Self {
        let top: Vec<FrequencyEntry<String>> = ranking.entries.iter().take(n).cloned().collect();
        let others: u64 = ranking.entries.iter().skip(n).map(|e| e.count).sum();

        let mut with_others: Vec<ShareEntry> = top
            .iter()
            .map(|e| ShareEntry {
                entity: e.entity.clone(),
                count: e.count,
                others: false,
            })
            .collect();

        if others > 0 {
            with_others.push(ShareEntry {
                entity: others_label.to_string(),
                count: others,
                others: true,
            });
        }

        Self {
            top: FrequencyTable::from_entries(top),
            with_others,
            others,
        }
    }

    /// Names of the top N, in rank order.
    pub fn names(&self) -> Vec<String> {
        self.top.keys().cloned().collect()
    }

    /// Whether `name` is one of the literal top N.
    pub fn contains(&self, name: &str) -> bool {
        self.top.keys().any(|k| k == name)
    }
}

// =============================================================================
// Cross Table
// =============================================================================

/// One `(row, col, count)` cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossEntry<R, C> {
    pub row: R,
    pub col: C,
    pub count: u64,
}

/// Sparse counts keyed by a pair of dimensions, sorted by `(row, col)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CrossTable<R, C> {
    entries: Vec<CrossEntry<R, C>>,
}

impl<R, C> CrossTable<R, C> {
    pub fn entries(&self) -> &[CrossEntry<R, C>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CrossEntry<R, C>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Keep only the cells matching `keep`.
    pub fn filter<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&R, &C) -> bool,
    {
        self.entries.retain(|e| keep(&e.row, &e.col));
        self
    }
}

impl<R: Ord + Clone, C: Ord + Clone> CrossTable<R, C> {
    /// Count `(row, col)` pairs.
    pub fn tally<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, C)>,
    {
        let mut counts: BTreeMap<(R, C), u64> = BTreeMap::new();
        for pair in pairs {
            *counts.entry(pair).or_insert(0) += 1;
        }

        Self {
            entries: counts
                .into_iter()
                .map(|((row, col), count)| CrossEntry { row, col, count })
                .collect(),
        }
    }

    /// Swap the row and column dimensions.
    pub fn transposed(&self) -> CrossTable<C, R> {
        let mut entries: Vec<CrossEntry<C, R>> = self
            .entries
            .iter()
            .map(|e| CrossEntry {
                row: e.col.clone(),
                col: e.row.clone(),
                count: e.count,
            })
            .collect();
        entries.sort_by(|a, b| (&a.row, &a.col).cmp(&(&b.row, &b.col)));
        CrossTable { entries }
    }

    /// Distinct row keys, ascending.
    pub fn row_keys(&self) -> Vec<R> {
        let mut keys: Vec<R> = self.entries.iter().map(|e| e.row.clone()).collect();
        keys.dedup();
        keys
    }

    /// Distinct column keys, ascending.
    pub fn col_keys(&self) -> Vec<C> {
        let mut keys: Vec<C> = self.entries.iter().map(|e| e.col.clone()).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Count for a cell, 0 when absent.
    pub fn get(&self, row: &R, col: &C) -> u64 {
        self.entries
            .binary_search_by(|e| (&e.row, &e.col).cmp(&(row, col)))
            .map(|i| self.entries[i].count)
            .unwrap_or(0)
    }
}
