//! User-item interaction matrices
//!
//! `UserItemMatrix` is the dense count pivot of the filtered transactions and
//! the authoritative basis for id mapping: rows follow sorted user ids and
//! columns follow sorted item ids. `CsrMatrix` is its compressed sparse row
//! form, used for weighting and model fitting.

use crate::error::{RecommenderError, Result};
use crate::types::EnrichedTransaction;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Dense user x item purchase counts with their row and column labels
#[derive(Debug, Clone)]
pub struct UserItemMatrix {
    counts: Array2<f32>,
    user_ids: Vec<u64>,
    item_ids: Vec<u64>,
}

impl UserItemMatrix {
    /// Pivot transactions into a count matrix
    ///
    /// Each cell holds the number of rows for the (user, item) pair; missing
    /// pairs are zero.
    pub fn from_transactions(rows: &[EnrichedTransaction]) -> Result<Self> {
        Self::from_pairs(rows.iter().map(|r| (r.user_id(), r.item_id())))
    }

    /// Pivot raw `(user_id, item_id)` pairs into a count matrix
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, u64)>) -> Result<Self> {
        let pairs: Vec<(u64, u64)> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Err(RecommenderError::EmptyInput(
                "cannot build a user-item matrix from zero transactions".to_string(),
            ));
        }

        let user_ids: Vec<u64> = pairs
            .iter()
            .map(|(u, _)| *u)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_ids: Vec<u64> = pairs
            .iter()
            .map(|(_, i)| *i)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let user_pos: HashMap<u64, usize> =
            user_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let item_pos: HashMap<u64, usize> =
            item_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut counts = Array2::<f32>::zeros((user_ids.len(), item_ids.len()));
        for (user_id, item_id) in &pairs {
            counts[[user_pos[user_id], item_pos[item_id]]] += 1.0;
        }

        tracing::debug!(
            users = user_ids.len(),
            items = item_ids.len(),
            interactions = pairs.len(),
            "Built user-item matrix"
        );

        Ok(Self {
            counts,
            user_ids,
            item_ids,
        })
    }

    pub fn counts(&self) -> &Array2<f32> {
        &self.counts
    }

    /// Row labels, in row order
    pub fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    /// Column labels, in column order
    pub fn item_ids(&self) -> &[u64] {
        &self.item_ids
    }

    pub fn num_users(&self) -> usize {
        self.counts.nrows()
    }

    pub fn num_items(&self) -> usize {
        self.counts.ncols()
    }

    pub fn to_csr(&self) -> CsrMatrix {
        CsrMatrix::from_dense(&self.counts)
    }
}

/// Compressed sparse row matrix
///
/// Stored entries define the sparsity pattern; an entry whose value becomes
/// zero after reweighting stays stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl CsrMatrix {
    /// Store every nonzero cell of `dense`
    pub fn from_dense(dense: &Array2<f32>) -> Self {
        let (nrows, ncols) = dense.dim();
        let mut indptr = Vec::with_capacity(nrows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);
        for row in dense.rows() {
            for (col, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and values stored in row `r`
    pub fn row(&self, r: usize) -> (&[usize], &[f32]) {
        let span = self.indptr[r]..self.indptr[r + 1];
        (&self.indices[span.clone()], &self.data[span])
    }

    /// Value at `(r, c)`, zero when not stored
    pub fn get(&self, r: usize, c: usize) -> f32 {
        let (cols, values) = self.row(r);
        cols.binary_search(&c).map(|pos| values[pos]).unwrap_or(0.0)
    }

    /// Iterate stored entries as `(row, col, value)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.nrows).flat_map(move |r| {
            let (cols, values) = self.row(r);
            cols.iter().zip(values.iter()).map(move |(&c, &v)| (r, c, v))
        })
    }

    pub fn transpose(&self) -> CsrMatrix {
        let mut counts = vec![0usize; self.ncols + 1];
        for &c in &self.indices {
            counts[c + 1] += 1;
        }
        for c in 0..self.ncols {
            counts[c + 1] += counts[c];
        }
        let indptr = counts.clone();

        let mut next = counts;
        let mut indices = vec![0usize; self.nnz()];
        let mut data = vec![0f32; self.nnz()];
        for (r, c, v) in self.iter() {
            let dest = next[c];
            indices[dest] = r;
            data[dest] = v;
            next[c] += 1;
        }

        CsrMatrix {
            nrows: self.ncols,
            ncols: self.nrows,
            indptr,
            indices,
            data,
        }
    }

    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::<f32>::zeros((self.nrows, self.ncols));
        for (r, c, v) in self.iter() {
            dense[[r, c]] = v;
        }
        dense
    }

    /// Same pattern, new values computed from `(row, col, value)`
    fn map_values(&self, f: impl Fn(usize, usize, f32) -> f32) -> CsrMatrix {
        let data = self.iter().map(|(r, c, v)| f(r, c, v)).collect();
        CsrMatrix {
            data,
            ..self.clone()
        }
    }
}

/// BM25 weighting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Config {
    /// Term frequency saturation (default: 100)
    pub k1: f32,
    /// Length normalization strength in [0, 1] (default: 0.8)
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 100.0, b: 0.8 }
    }
}

/// Apply BM25 weighting treating rows as documents and columns as terms
///
/// `idf = ln(N) - ln(1 + df)` where `N` is the row count and `df` the number
/// of stored entries in the column; each value is scaled by
/// `(k1 + 1) / (k1 * length_norm + value) * idf` with
/// `length_norm = (1 - b) + b * row_sum / mean_row_sum`.
pub fn bm25_weight(x: &CsrMatrix, config: &Bm25Config) -> CsrMatrix {
    if x.nnz() == 0 {
        return x.clone();
    }

    let k1 = f64::from(config.k1);
    let b = f64::from(config.b);
    let n = x.nrows() as f64;

    let mut df = vec![0usize; x.ncols()];
    for &c in &x.indices {
        df[c] += 1;
    }
    let idf: Vec<f64> = df
        .iter()
        .map(|&d| n.ln() - (d as f64).ln_1p())
        .collect();

    let row_sums: Vec<f64> = (0..x.nrows())
        .map(|r| x.row(r).1.iter().map(|&v| f64::from(v)).sum())
        .collect();
    let average_length = row_sums.iter().sum::<f64>() / n;
    let length_norm: Vec<f64> = row_sums
        .iter()
        .map(|&s| (1.0 - b) + b * s / average_length)
        .collect();

    x.map_values(|r, c, v| {
        let v = f64::from(v);
        (v * (k1 + 1.0) / (k1 * length_norm[r] + v) * idf[c]) as f32
    })
}
