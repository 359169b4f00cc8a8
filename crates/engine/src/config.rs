//! Recommender configuration
//!
//! # Environment Variables
//!
//! All optional; unset variables keep the defaults shown.
//!
//! - `BASKET_REC_FILTER_MAX_POPULARITY` (0.5), `BASKET_REC_FILTER_MIN_POPULARITY` (0.01)
//! - `BASKET_REC_FILTER_STALE_WEEKS` (48)
//! - `BASKET_REC_FILTER_EXCLUDED_DEPARTMENTS`: comma separated list
//! - `BASKET_REC_FILTER_MIN_PRICE` (5), `BASKET_REC_FILTER_MAX_PRICE` (100)
//! - `BASKET_REC_ALS_FACTORS` (20), `BASKET_REC_ALS_REGULARIZATION` (0.001),
//!   `BASKET_REC_ALS_ITERATIONS` (15), `BASKET_REC_ALS_ALPHA` (1.0),
//!   `BASKET_REC_ALS_NUM_THREADS` (4), `BASKET_REC_ALS_SEED` (42)
//! - `BASKET_REC_WEIGHTING` (true), `BASKET_REC_BM25_K1` (100), `BASKET_REC_BM25_B` (0.8)
//! - `BASKET_REC_SAMPLING_SEED`: seed for similar-users sampling (unset: entropy)

use crate::factor_model::AlsConfig;
use crate::filter::FilterConfig;
use crate::matrix::Bm25Config;
use basket_rec_core::config::{parse_env_var, parse_optional_env_var, ConfigLoader};
use basket_rec_core::{CoreError, Result as CoreResult};
use serde::{Deserialize, Serialize};

/// Top-level recommender configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    pub filter: FilterConfig,
    pub als: AlsConfig,
    /// Apply BM25 weighting before ALS training
    pub weighting: bool,
    pub bm25: Bm25Config,
    /// Seed for similar-users sampling; `None` draws from entropy
    pub sampling_seed: Option<u64>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            als: AlsConfig::default(),
            weighting: true,
            bm25: Bm25Config::default(),
            sampling_seed: None,
        }
    }
}

impl ConfigLoader for FilterConfig {
    fn from_env() -> CoreResult<Self> {
        let defaults = FilterConfig::default();

        let excluded_departments = match std::env::var("BASKET_REC_FILTER_EXCLUDED_DEPARTMENTS") {
            Ok(list) => list
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
            Err(_) => defaults.excluded_departments,
        };

        Ok(Self {
            max_popularity: parse_env_var(
                "BASKET_REC_FILTER_MAX_POPULARITY",
                defaults.max_popularity,
            )?,
            min_popularity: parse_env_var(
                "BASKET_REC_FILTER_MIN_POPULARITY",
                defaults.min_popularity,
            )?,
            stale_weeks: parse_env_var("BASKET_REC_FILTER_STALE_WEEKS", defaults.stale_weeks)?,
            excluded_departments,
            min_price: parse_env_var("BASKET_REC_FILTER_MIN_PRICE", defaults.min_price)?,
            max_price: parse_env_var("BASKET_REC_FILTER_MAX_PRICE", defaults.max_price)?,
        })
    }

    fn validate(&self) -> CoreResult<()> {
        for (value, key) in [
            (self.max_popularity, "BASKET_REC_FILTER_MAX_POPULARITY"),
            (self.min_popularity, "BASKET_REC_FILTER_MIN_POPULARITY"),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::config(
                    format!("popularity bound {} must be within [0, 1]", value),
                    key,
                ));
            }
        }

        if self.min_popularity > self.max_popularity {
            return Err(CoreError::config(
                format!(
                    "min_popularity ({}) cannot exceed max_popularity ({})",
                    self.min_popularity, self.max_popularity
                ),
                "BASKET_REC_FILTER_MIN_POPULARITY",
            ));
        }

        if self.min_price > self.max_price {
            return Err(CoreError::config(
                format!(
                    "min_price ({}) cannot exceed max_price ({})",
                    self.min_price, self.max_price
                ),
                "BASKET_REC_FILTER_MIN_PRICE",
            ));
        }

        Ok(())
    }
}

impl ConfigLoader for AlsConfig {
    fn from_env() -> CoreResult<Self> {
        let defaults = AlsConfig::default();
        Ok(Self {
            factors: parse_env_var("BASKET_REC_ALS_FACTORS", defaults.factors)?,
            regularization: parse_env_var(
                "BASKET_REC_ALS_REGULARIZATION",
                defaults.regularization,
            )?,
            iterations: parse_env_var("BASKET_REC_ALS_ITERATIONS", defaults.iterations)?,
            alpha: parse_env_var("BASKET_REC_ALS_ALPHA", defaults.alpha)?,
            num_threads: parse_env_var("BASKET_REC_ALS_NUM_THREADS", defaults.num_threads)?,
            seed: parse_env_var("BASKET_REC_ALS_SEED", defaults.seed)?,
        })
    }

    fn validate(&self) -> CoreResult<()> {
        if self.factors == 0 {
            return Err(CoreError::config(
                "factors must be greater than 0",
                "BASKET_REC_ALS_FACTORS",
            ));
        }

        if self.iterations == 0 {
            return Err(CoreError::config(
                "iterations must be greater than 0",
                "BASKET_REC_ALS_ITERATIONS",
            ));
        }

        if self.num_threads == 0 {
            return Err(CoreError::config(
                "num_threads must be greater than 0",
                "BASKET_REC_ALS_NUM_THREADS",
            ));
        }

        if self.regularization <= 0.0 {
            return Err(CoreError::config(
                format!("regularization ({}) must be positive", self.regularization),
                "BASKET_REC_ALS_REGULARIZATION",
            ));
        }

        if self.alpha < 0.0 {
            return Err(CoreError::config(
                format!("alpha ({}) cannot be negative", self.alpha),
                "BASKET_REC_ALS_ALPHA",
            ));
        }

        Ok(())
    }
}

impl ConfigLoader for RecommenderConfig {
    fn from_env() -> CoreResult<Self> {
        let defaults = Bm25Config::default();
        Ok(Self {
            filter: FilterConfig::from_env()?,
            als: AlsConfig::from_env()?,
            weighting: parse_env_var("BASKET_REC_WEIGHTING", true)?,
            bm25: Bm25Config {
                k1: parse_env_var("BASKET_REC_BM25_K1", defaults.k1)?,
                b: parse_env_var("BASKET_REC_BM25_B", defaults.b)?,
            },
            sampling_seed: parse_optional_env_var("BASKET_REC_SAMPLING_SEED")?,
        })
    }

    fn validate(&self) -> CoreResult<()> {
        self.filter.validate()?;
        self.als.validate()?;

        if self.weighting {
            if !(0.0..=1.0).contains(&self.bm25.b) {
                return Err(CoreError::config(
                    format!("bm25 b ({}) must be within [0, 1]", self.bm25.b),
                    "BASKET_REC_BM25_B",
                ));
            }
            if self.bm25.k1 < 0.0 {
                return Err(CoreError::config(
                    format!("bm25 k1 ({}) cannot be negative", self.bm25.k1),
                    "BASKET_REC_BM25_K1",
                ));
            }
        }

        Ok(())
    }
}
