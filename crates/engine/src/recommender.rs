//! Recommender orchestration
//!
//! Builds the whole pipeline in one step (filter, matrix, id index, optional
//! BM25 weighting, ALS, item-item neighbours) and serves the recommendation
//! strategies on top of it. A `Recommender` only exists fully trained:
//! any failure during construction is returned and no instance is produced.

use crate::config::RecommenderConfig;
use crate::error::{RecommenderError, Result};
use crate::factor_model::FactorModel;
use crate::filter::prefilter_items;
use crate::index::IdIndex;
use crate::matrix::{bm25_weight, CsrMatrix, UserItemMatrix};
use crate::neighbor_model::NeighborModel;
use crate::ranking::top_k;
use crate::types::{ItemFeature, Transaction};
use basket_rec_core::ConfigLoader;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

/// Default number of recommendations per query
pub const DEFAULT_N: usize = 5;

pub struct Recommender {
    config: RecommenderConfig,
    /// Raw purchase counts with their id labels
    matrix: UserItemMatrix,
    /// User x item matrix the factor model was trained on
    weighted: CsrMatrix,
    index: IdIndex,
    factor_model: FactorModel,
    neighbor_model: NeighborModel,
    rng: StdRng,
}

impl Recommender {
    pub fn new(
        transactions: &[Transaction],
        item_features: &[ItemFeature],
        config: RecommenderConfig,
    ) -> Result<Self> {
        config.validate()?;

        let filtered = prefilter_items(transactions, item_features, &config.filter);
        tracing::info!(
            input = transactions.len(),
            kept = filtered.len(),
            "Prefiltered transactions"
        );
        if filtered.is_empty() {
            return Err(RecommenderError::EmptyInput(
                "no transactions left after filtering".to_string(),
            ));
        }

        let matrix = UserItemMatrix::from_transactions(&filtered)?;
        let index = IdIndex::from_matrix(&matrix);

        let counts = matrix.to_csr();
        let weighted = if config.weighting {
            bm25_weight(&counts.transpose(), &config.bm25).transpose()
        } else {
            counts.clone()
        };

        let factor_model = FactorModel::fit(&weighted.transpose(), &config.als)?;
        let neighbor_model = NeighborModel::fit(&counts.transpose(), config.als.num_threads)?;

        let rng = match config.sampling_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tracing::info!(
            users = matrix.num_users(),
            items = matrix.num_items(),
            weighting = config.weighting,
            "Recommender ready"
        );

        Ok(Self {
            config,
            matrix,
            weighted,
            index,
            factor_model,
            neighbor_model,
            rng,
        })
    }

    /// Recommend items similar to the user's most purchased items
    ///
    /// Takes the user's top `n` items by purchase count (ties to the smaller
    /// index) and contributes at most one factor-space neighbour per seed.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` for an unknown user, `RecommendationCount` when the
    /// seeds do not yield exactly `n` items.
    pub fn similar_items_recommendation(&self, user_id: u64, n: usize) -> Result<Vec<u64>> {
        let user = self.index.internal_user(user_id)?;
        let seeds = self.top_purchased(user, n);

        let mut similar_items = Vec::with_capacity(n);
        for (seed, _) in seeds {
            let neighbour = self
                .factor_model
                .similar_items(seed, 2)?
                .into_iter()
                .map(|(item, _)| item)
                .find(|&item| item != seed);
            if let Some(item) = neighbour {
                similar_items.push(self.index.external_item(item)?);
            }
        }

        tracing::debug!(user_id, requested = n, found = similar_items.len(), "Similar items");

        if similar_items.len() != n {
            return Err(RecommenderError::RecommendationCount {
                expected: n,
                actual: similar_items.len(),
            });
        }
        Ok(similar_items)
    }

    /// Recommend items sampled from what similar users bought most
    ///
    /// The candidate pool is the union of the top `n` purchased items of each
    /// of the `n` most similar users (the user itself included); exactly `n`
    /// distinct items are drawn from it without replacement.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` for an unknown user, `InsufficientCandidates` when the
    /// pool holds fewer than `n` items.
    pub fn similar_users_recommendation(&mut self, user_id: u64, n: usize) -> Result<Vec<u64>> {
        let user = self.index.internal_user(user_id)?;
        let similar_users = self.factor_model.similar_users(user, n)?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for (similar_user, _) in similar_users {
            for (item, count) in self.top_purchased(similar_user, n) {
                if count > 0.0 && seen.insert(item) {
                    candidates.push(item);
                }
            }
        }

        tracing::debug!(user_id, requested = n, candidates = candidates.len(), "Similar users");

        if candidates.len() < n {
            return Err(RecommenderError::InsufficientCandidates {
                requested: n,
                available: candidates.len(),
            });
        }

        let sampled: Vec<usize> = candidates
            .choose_multiple(&mut self.rng, n)
            .copied()
            .collect();
        sampled
            .into_iter()
            .map(|item| self.index.external_item(item))
            .collect()
    }

    /// Rank the user's own purchases through the item-item neighbour model
    ///
    /// Only items the user bought are returned, so fewer than `n` items may
    /// come back.
    pub fn own_items_recommendation(&self, user_id: u64, n: usize) -> Result<Vec<u64>> {
        let user = self.index.internal_user(user_id)?;
        self.neighbor_model
            .recommend(self.matrix.counts().row(user), n)
            .into_iter()
            .map(|(item, _)| self.index.external_item(item))
            .collect()
    }

    /// The user's `n` most purchased items by raw count
    fn top_purchased(&self, user: usize, n: usize) -> Vec<(usize, f32)> {
        let row = self.matrix.counts().row(user);
        let counts: Vec<f32> = row.iter().copied().collect();
        top_k(&counts, n)
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn matrix(&self) -> &UserItemMatrix {
        &self.matrix
    }

    /// User x item matrix used for ALS training (BM25-weighted when enabled)
    pub fn weighted_matrix(&self) -> &CsrMatrix {
        &self.weighted
    }

    pub fn index(&self) -> &IdIndex {
        &self.index
    }

    pub fn factor_model(&self) -> &FactorModel {
        &self.factor_model
    }

    pub fn neighbor_model(&self) -> &NeighborModel {
        &self.neighbor_model
    }
}
