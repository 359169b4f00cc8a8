//! Matrix Factorization using Alternating Least Squares (ALS)
//!
//! Decomposes an item x user interaction matrix into item and user latent
//! factors. Each iteration solves every item row with the user factors held
//! fixed, then every user row with the item factors held fixed; each row is
//! a regularized least squares problem over that row's stored entries.

use crate::error::{IdKind, RecommenderError, Result};
use crate::matrix::CsrMatrix;
use crate::ranking::top_k;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// ALS configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlsConfig {
    /// Number of latent factors (embedding dimension)
    pub factors: usize,
    /// Regularization parameter (lambda)
    pub regularization: f32,
    /// Number of full alternations
    pub iterations: usize,
    /// Confidence scaling: each stored entry is weighted by `1 + alpha * value`
    pub alpha: f32,
    /// Worker threads used for the row solves
    pub num_threads: usize,
    /// Seed for factor initialization
    pub seed: u64,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            factors: 20,
            regularization: 0.001,
            iterations: 15,
            alpha: 1.0,
            num_threads: 4,
            seed: 42,
        }
    }
}

/// Trained latent factor model
///
/// Indexed by internal ids: item rows follow the rows of the training matrix,
/// user rows follow its columns.
#[derive(Debug, Clone)]
pub struct FactorModel {
    config: AlsConfig,
    /// User latent factors: [num_users x factors]
    user_factors: Array2<f32>,
    /// Item latent factors: [num_items x factors]
    item_factors: Array2<f32>,
    user_norms: Array1<f32>,
    item_norms: Array1<f32>,
    loss: f32,
}

impl FactorModel {
    /// Train ALS on an item x user matrix
    pub fn fit(item_user: &CsrMatrix, config: &AlsConfig) -> Result<Self> {
        let k = config.factors;
        let lambda = f64::from(config.regularization);
        let alpha = config.alpha;
        let user_item = item_user.transpose();

        // Random initialization
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut user_factors = Array2::<f32>::zeros((item_user.ncols(), k));
        let mut item_factors = Array2::<f32>::zeros((item_user.nrows(), k));
        for v in user_factors.iter_mut() {
            *v = rng.gen_range(-0.1..0.1);
        }
        for v in item_factors.iter_mut() {
            *v = rng.gen_range(-0.1..0.1);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()
            .map_err(|e| RecommenderError::ThreadPool(e.to_string()))?;

        pool.install(|| -> Result<()> {
            for iteration in 0..config.iterations {
                item_factors = solve_factors(item_user, &user_factors, lambda, alpha)?;
                user_factors = solve_factors(&user_item, &item_factors, lambda, alpha)?;

                if iteration % 2 == 0 {
                    let loss = compute_loss(item_user, &user_factors, &item_factors);
                    tracing::debug!("ALS iteration {}: loss = {:.4}", iteration, loss);
                }
            }
            Ok(())
        })?;

        let loss = compute_loss(item_user, &user_factors, &item_factors);
        tracing::info!(
            items = item_user.nrows(),
            users = item_user.ncols(),
            factors = k,
            iterations = config.iterations,
            loss = loss,
            "Trained ALS model"
        );

        Ok(Self {
            config: config.clone(),
            user_norms: row_norms(&user_factors),
            item_norms: row_norms(&item_factors),
            user_factors,
            item_factors,
            loss,
        })
    }

    /// Items ranked by cosine similarity of their factors to `item`
    ///
    /// The query item itself is included. `n` is clamped to the item count;
    /// ties go to the smaller index.
    pub fn similar_items(&self, item: usize, n: usize) -> Result<Vec<(usize, f32)>> {
        if item >= self.num_items() {
            return Err(RecommenderError::key_not_found(IdKind::ItemIndex, item));
        }
        let scores = cosine_scores(&self.item_factors, &self.item_norms, item);
        Ok(top_k(&scores, n))
    }

    /// Users ranked by cosine similarity of their factors to `user`
    pub fn similar_users(&self, user: usize, n: usize) -> Result<Vec<(usize, f32)>> {
        if user >= self.num_users() {
            return Err(RecommenderError::key_not_found(IdKind::UserIndex, user));
        }
        let scores = cosine_scores(&self.user_factors, &self.user_norms, user);
        Ok(top_k(&scores, n))
    }

    pub fn user_factors(&self) -> &Array2<f32> {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &Array2<f32> {
        &self.item_factors
    }

    pub fn num_users(&self) -> usize {
        self.user_factors.nrows()
    }

    pub fn num_items(&self) -> usize {
        self.item_factors.nrows()
    }

    /// Mean squared reconstruction error over stored entries after training
    pub fn loss(&self) -> f32 {
        self.loss
    }

    pub fn config(&self) -> &AlsConfig {
        &self.config
    }
}

/// Solve every row of `matrix` against the fixed factors of the other side
fn solve_factors(
    matrix: &CsrMatrix,
    fixed: &Array2<f32>,
    lambda: f64,
    alpha: f32,
) -> Result<Array2<f32>> {
    let k = fixed.ncols();
    let rows = (0..matrix.nrows())
        .into_par_iter()
        .map(|r| {
            let (cols, values) = matrix.row(r);
            if cols.is_empty() {
                // no observations: the regularized optimum is the zero vector
                return Ok(Array1::<f32>::zeros(k));
            }
            solve_row(cols, values, fixed, lambda, alpha)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut factors = Array2::<f32>::zeros((matrix.nrows(), k));
    for (r, row) in rows.into_iter().enumerate() {
        factors.row_mut(r).assign(&row);
    }
    Ok(factors)
}

/// Solve one row's factors (least squares)
fn solve_row(
    cols: &[usize],
    values: &[f32],
    fixed: &Array2<f32>,
    lambda: f64,
    alpha: f32,
) -> Result<Array1<f32>> {
    let k = fixed.ncols();
    let mut a = Array2::<f64>::zeros((k, k));
    let mut b = Array1::<f64>::zeros(k);

    // Build A and b for least squares: A * x = b
    for (&c, &value) in cols.iter().zip(values) {
        let vec = fixed.row(c);
        let confidence = f64::from((1.0 + alpha * value).max(0.0));
        let value = f64::from(value);

        // A += confidence * vec^T * vec, b += confidence * value * vec
        for i in 0..k {
            let vi = f64::from(vec[i]);
            for j in 0..k {
                a[[i, j]] += confidence * vi * f64::from(vec[j]);
            }
            b[i] += confidence * value * vi;
        }
    }

    // Add regularization: A += lambda * I
    for i in 0..k {
        a[[i, i]] += lambda;
    }

    let x = solve_least_squares(&a, &b)?;
    Ok(x.mapv(|v| v as f32))
}

/// Solve least squares system A * x = b using Cholesky decomposition
/// For positive definite matrix A (which we guarantee by adding regularization)
fn solve_least_squares(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();

    // Perform Cholesky decomposition: A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return Err(RecommenderError::Numerical(
                        "ALS system is not positive definite".to_string(),
                    ));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Ok(x)
}

/// Mean squared reconstruction error over the stored entries
fn compute_loss(
    item_user: &CsrMatrix,
    user_factors: &Array2<f32>,
    item_factors: &Array2<f32>,
) -> f32 {
    let mut loss = 0.0;
    let mut count = 0;

    for (i, u, value) in item_user.iter() {
        let prediction = item_factors.row(i).dot(&user_factors.row(u));
        loss += (value - prediction).powi(2);
        count += 1;
    }

    if count > 0 {
        loss / count as f32
    } else {
        0.0
    }
}

fn row_norms(factors: &Array2<f32>) -> Array1<f32> {
    factors.map_axis(Axis(1), |row| row.dot(&row).sqrt())
}

/// Cosine similarity of every row to row `target`; zero-norm rows score 0
fn cosine_scores(factors: &Array2<f32>, norms: &Array1<f32>, target: usize) -> Vec<f32> {
    let dots = factors.dot(&factors.row(target));
    let target_norm = norms[target];
    dots.iter()
        .zip(norms.iter())
        .map(|(&dot, &norm)| {
            let denom = norm * target_norm;
            if denom == 0.0 {
                0.0
            } else {
                dot / denom
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_config() -> AlsConfig {
        AlsConfig {
            factors: 4,
            regularization: 0.1,
            iterations: 5,
            alpha: 1.0,
            num_threads: 2,
            seed: 7,
        }
    }

    /// Two disjoint clusters: items 0-1 bought by users 0-2, items 2-3 by users 3-5
    fn clustered() -> CsrMatrix {
        CsrMatrix::from_dense(&array![
            [1.0f32, 1.0, 1.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            [0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        ])
    }

    #[test]
    fn test_als_fit_shapes() {
        let model = FactorModel::fit(&clustered(), &small_config()).unwrap();
        assert_eq!(model.item_factors().dim(), (4, 4));
        assert_eq!(model.user_factors().dim(), (6, 4));
        assert_eq!(model.num_items(), 4);
        assert_eq!(model.num_users(), 6);
        assert!(model.loss().is_finite());
    }

    #[test]
    fn test_default_config() {
        let config = AlsConfig::default();
        assert_eq!(config.factors, 20);
        assert_eq!(config.regularization, 0.001);
        assert_eq!(config.iterations, 15);
        assert_eq!(config.num_threads, 4);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let first = FactorModel::fit(&clustered(), &small_config()).unwrap();
        let second = FactorModel::fit(&clustered(), &small_config()).unwrap();
        assert_eq!(first.item_factors(), second.item_factors());
        assert_eq!(first.user_factors(), second.user_factors());
    }

    #[test]
    fn test_similar_items_within_cluster() {
        let model = FactorModel::fit(&clustered(), &small_config()).unwrap();

        let similar = model.similar_items(0, 2).unwrap();
        let mut ids: Vec<usize> = similar.iter().map(|(i, _)| *i).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1]);

        let similar = model.similar_items(3, 2).unwrap();
        let ids: Vec<usize> = similar.iter().map(|(i, _)| *i).collect();
        assert!(ids.contains(&2));
        assert!(ids.contains(&3));
    }

    #[test]
    fn test_similar_users_within_cluster() {
        let model = FactorModel::fit(&clustered(), &small_config()).unwrap();
        let similar = model.similar_users(4, 3).unwrap();
        let mut ids: Vec<usize> = similar.iter().map(|(u, _)| *u).collect();
        ids.sort();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(similar.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_top_k_is_clamped() {
        let model = FactorModel::fit(&clustered(), &small_config()).unwrap();
        assert_eq!(model.similar_items(0, 100).unwrap().len(), 4);
        assert_eq!(model.similar_users(0, 100).unwrap().len(), 6);
    }

    #[test]
    fn test_out_of_range_ids() {
        let model = FactorModel::fit(&clustered(), &small_config()).unwrap();
        assert!(matches!(
            model.similar_items(4, 2),
            Err(RecommenderError::KeyNotFound { kind: IdKind::ItemIndex, .. })
        ));
        assert!(matches!(
            model.similar_users(6, 2),
            Err(RecommenderError::KeyNotFound { kind: IdKind::UserIndex, .. })
        ));
    }

    #[test]
    fn test_all_zero_matrix_degrades_gracefully() {
        let empty = CsrMatrix::from_dense(&Array2::zeros((3, 4)));
        let model = FactorModel::fit(&empty, &small_config()).unwrap();
        let similar = model.similar_items(1, 2).unwrap();
        assert_eq!(similar.len(), 2);
        assert!(similar.iter().all(|(_, score)| *score == 0.0));
        assert_eq!(model.loss(), 0.0);
    }

    #[test]
    fn test_solve_least_squares() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = solve_least_squares(&a, &b).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);

        let singular = array![[0.0, 0.0], [0.0, 1.0]];
        assert!(matches!(
            solve_least_squares(&singular, &b),
            Err(RecommenderError::Numerical(_))
        ));
    }
}
