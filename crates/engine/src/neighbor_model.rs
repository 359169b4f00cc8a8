//! Item-item nearest neighbour model (K = 1)
//!
//! Similarity between two items is the dot product of their user columns.
//! Only each item's single most similar other item is kept, alongside the
//! item's similarity with itself.

use crate::error::{IdKind, RecommenderError, Result};
use crate::matrix::CsrMatrix;
use crate::ranking::top_k;
use ndarray::ArrayView1;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct NeighborModel {
    /// `neighbors[i]` is item `i`'s nearest other item and its similarity
    neighbors: Vec<Option<(usize, f32)>>,
    /// `self_similarity[i]` is the squared norm of item `i`'s user column
    self_similarity: Vec<f32>,
}

impl NeighborModel {
    /// Fit on an item x user matrix
    pub fn fit(item_user: &CsrMatrix, num_threads: usize) -> Result<Self> {
        let user_item = item_user.transpose();
        let num_items = item_user.nrows();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| RecommenderError::ThreadPool(e.to_string()))?;

        let neighbors: Vec<Option<(usize, f32)>> = pool.install(|| {
            (0..num_items)
                .into_par_iter()
                .map(|item| nearest_neighbor(item, item_user, &user_item))
                .collect()
        });

        let self_similarity: Vec<f32> = (0..num_items)
            .map(|item| item_user.row(item).1.iter().map(|v| v * v).sum::<f32>())
            .collect();

        tracing::info!(
            items = num_items,
            linked = neighbors.iter().filter(|n| n.is_some()).count(),
            "Fitted item-item neighbour model"
        );

        Ok(Self {
            neighbors,
            self_similarity,
        })
    }

    /// Nearest other item of `item`, if it shares any user with one
    pub fn nearest(&self, item: usize) -> Result<Option<(usize, f32)>> {
        self.neighbors
            .get(item)
            .copied()
            .ok_or_else(|| RecommenderError::key_not_found(IdKind::ItemIndex, item))
    }

    /// Rank the items a user already bought
    ///
    /// A purchased item `j` scores `r_uj * s(j, j)` plus `r_ui * s(i, j)` from
    /// every purchased item `i` whose neighbour is `j`. Items outside the
    /// user's row never appear.
    pub fn recommend(&self, user_row: ArrayView1<'_, f32>, n: usize) -> Vec<(usize, f32)> {
        let mut scores = vec![0f32; self.neighbors.len()];
        let mut purchased = vec![false; self.neighbors.len()];
        for (item, &r) in user_row.iter().enumerate() {
            if r == 0.0 || item >= scores.len() {
                continue;
            }
            purchased[item] = true;
            scores[item] += r * self.self_similarity[item];
            if let Some((neighbor, similarity)) = self.neighbors[item] {
                scores[neighbor] += r * similarity;
            }
        }

        for (score, owned) in scores.iter_mut().zip(&purchased) {
            if !owned {
                *score = 0.0;
            }
        }

        top_k(&scores, n)
            .into_iter()
            .filter(|(item, score)| purchased[*item] && *score != 0.0)
            .collect()
    }

    pub fn num_items(&self) -> usize {
        self.neighbors.len()
    }
}

fn nearest_neighbor(
    item: usize,
    item_user: &CsrMatrix,
    user_item: &CsrMatrix,
) -> Option<(usize, f32)> {
    let mut scores = std::collections::HashMap::new();
    let (users, values) = item_user.row(item);
    for (&user, &x_iu) in users.iter().zip(values) {
        let (items, others) = user_item.row(user);
        for (&other, &x_ju) in items.iter().zip(others) {
            if other != item {
                *scores.entry(other).or_insert(0f32) += x_iu * x_ju;
            }
        }
    }

    scores
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// item x user counts
    fn matrix() -> CsrMatrix {
        CsrMatrix::from_dense(&array![
            [1.0f32, 1.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 0.0],
            [0.0, 0.0, 2.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 2.0, 0.0, 0.0],
        ])
    }

    #[test]
    fn test_single_nearest_neighbor() {
        let model = NeighborModel::fit(&matrix(), 2).unwrap();
        // item 0 overlaps item 1 with 2.0 and item 4 with 2.0; tie goes to the smaller index
        assert_eq!(model.nearest(0).unwrap(), Some((1, 2.0)));
        assert_eq!(model.nearest(1).unwrap(), Some((0, 2.0)));
        assert_eq!(model.nearest(2).unwrap(), Some((1, 2.0)));
        assert_eq!(model.nearest(4).unwrap(), Some((0, 2.0)));
    }

    #[test]
    fn test_isolated_item_has_no_neighbor() {
        let model = NeighborModel::fit(&matrix(), 2).unwrap();
        assert_eq!(model.nearest(3).unwrap(), None);
        assert!(model.nearest(5).is_err());
        assert_eq!(model.num_items(), 5);
    }

    #[test]
    fn test_recommend_ranks_only_purchased_items() {
        let model = NeighborModel::fit(&matrix(), 1).unwrap();
        // item 0 (self 2.0) once, item 2 (self 4.0) three times; both link to unbought item 1
        let user_row = array![1.0f32, 0.0, 3.0, 0.0, 0.0];
        let recs = model.recommend(user_row.view(), 5);
        assert_eq!(recs, vec![(2, 12.0), (0, 2.0)]);
    }

    #[test]
    fn test_recommend_adds_links_between_purchased_items() {
        let model = NeighborModel::fit(&matrix(), 1).unwrap();
        // items 0 and 1 link to each other with 2.0; self similarities 2.0 and 3.0
        let user_row = array![1.0f32, 3.0, 0.0, 0.0, 0.0];
        assert_eq!(model.recommend(user_row.view(), 5), vec![(1, 11.0), (0, 8.0)]);
        assert_eq!(model.recommend(user_row.view(), 1), vec![(1, 11.0)]);
    }

    #[test]
    fn test_recommend_for_empty_row() {
        let model = NeighborModel::fit(&matrix(), 1).unwrap();
        let user_row = array![0.0f32, 0.0, 0.0, 0.0, 0.0];
        assert!(model.recommend(user_row.view(), 3).is_empty());
    }
}
