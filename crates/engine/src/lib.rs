//! # basket-rec engine
//!
//! Collaborative-filtering recommendations over retail transaction logs.
//!
//! ## Pipeline
//!
//! 1. `filter`: prefilter transactions by popularity, recency, department and price
//! 2. `matrix`: pivot into a user x item count matrix, optional BM25 weighting
//! 3. `index`: map external user/item ids to matrix positions and back
//! 4. `factor_model`: implicit-feedback ALS latent factors
//! 5. `neighbor_model`: item-item nearest neighbour (K = 1)
//! 6. `recommender`: similar-items and similar-users strategies
//!
//! ```no_run
//! use basket_rec_core::ConfigLoader;
//! use basket_rec_engine::{Recommender, RecommenderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RecommenderConfig::load()?;
//! let mut recommender = Recommender::new(&[], &[], config)?;
//! let items = recommender.similar_items_recommendation(42, 5)?;
//! let sampled = recommender.similar_users_recommendation(42, 5)?;
//! # let _ = (items, sampled);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod factor_model;
pub mod filter;
pub mod index;
pub mod matrix;
pub mod neighbor_model;
pub mod recommender;
pub mod types;

mod ranking;

pub use config::RecommenderConfig;
pub use error::{IdKind, RecommenderError, Result};
pub use factor_model::{AlsConfig, FactorModel};
pub use filter::{prefilter_items, FilterConfig, EXCLUDED_DEPARTMENTS};
pub use index::IdIndex;
pub use matrix::{bm25_weight, Bm25Config, CsrMatrix, UserItemMatrix};
pub use neighbor_model::NeighborModel;
pub use recommender::{Recommender, DEFAULT_N};
pub use types::{EnrichedTransaction, ItemFeature, Transaction};
