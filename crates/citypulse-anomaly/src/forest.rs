//! Isolation forest over 4-axis sensor feature rows.
//!
//! Anomalies are isolated closer to the root of randomly-split trees, so
//! the expected path length over an ensemble separates outliers from the
//! bulk of the data. Scores follow the standard formulation
//! `s(x) = 2^(-E[h(x)] / c(n))`; the outlier threshold is fitted from the
//! training scores at the configured contamination fraction.

use citypulse_core::{PulseError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Number of feature axes (noise, temp, aqi, crowd).
pub const FEATURES: usize = 4;

/// Isolation forest hyperparameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Subsample size per tree (capped at the dataset size)
    pub max_samples: usize,
    /// Expected fraction of outliers in the training data
    pub contamination: f64,
    /// RNG seed so fitting is reproducible
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Split {
        feature: usize,
        value: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        size: usize,
    },
}

impl TreeNode {
    fn path_length(&self, row: &[f64; FEATURES], depth: f64) -> f64 {
        match self {
            TreeNode::Leaf { size } => depth + average_path_length(*size),
            TreeNode::Split {
                feature,
                value,
                left,
                right,
            } => {
                if row[*feature] < *value {
                    left.path_length(row, depth + 1.0)
                } else {
                    right.path_length(row, depth + 1.0)
                }
            }
        }
    }
}

/// Isolation forest outlier model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    config: ForestConfig,
    trees: Vec<TreeNode>,
    /// Normalizer c(n) for the subsample size actually used
    path_norm: f64,
    /// Score threshold fitted at the (1 - contamination) training quantile
    threshold: f64,
    fitted: bool,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Result<Self> {
        if config.n_estimators == 0 {
            return Err(PulseError::InvalidParameter {
                name: "n_estimators".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0 < config.contamination && config.contamination < 0.5) {
            return Err(PulseError::InvalidParameter {
                name: "contamination".to_string(),
                reason: "must be in (0, 0.5)".to_string(),
            });
        }
        Ok(Self {
            config,
            trees: Vec::new(),
            path_norm: 1.0,
            threshold: 0.5,
            fitted: false,
        })
    }

    /// Fit the ensemble and the outlier threshold on training rows.
    pub fn fit(&mut self, rows: &[[f64; FEATURES]]) -> Result<()> {
        if rows.len() < 8 {
            return Err(PulseError::InsufficientData {
                required: 8,
                actual: rows.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let sample_size = self.config.max_samples.min(rows.len());
        let depth_limit = (sample_size as f64).log2().ceil() as usize;

        self.trees = (0..self.config.n_estimators)
            .map(|_| {
                let subsample: Vec<usize> =
                    rand::seq::index::sample(&mut rng, rows.len(), sample_size).into_vec();
                build_tree(rows, &subsample, 0, depth_limit, &mut rng)
            })
            .collect();
        self.path_norm = average_path_length(sample_size);

        // Threshold at the (1 - contamination) quantile of training scores.
        let mut scores: Vec<f64> = rows.iter().map(|r| self.raw_score(r)).collect();
        scores.sort_by(|a, b| a.total_cmp(b));
        let idx = ((1.0 - self.config.contamination) * scores.len() as f64) as usize;
        self.threshold = scores[idx.min(scores.len() - 1)];

        self.fitted = true;
        Ok(())
    }

    fn raw_score(&self, row: &[f64; FEATURES]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(row, 0.0)).sum();
        let mean_path = total / self.trees.len() as f64;
        2f64.powf(-mean_path / self.path_norm)
    }

    /// Anomaly score in (0, 1); higher is more anomalous.
    pub fn score(&self, row: &[f64; FEATURES]) -> Result<f64> {
        if !self.fitted {
            return Err(PulseError::InvalidParameter {
                name: "forest".to_string(),
                reason: "must be fitted before scoring".to_string(),
            });
        }
        Ok(self.raw_score(row))
    }

    /// Whether the row scores past the fitted outlier threshold.
    pub fn is_outlier(&self, row: &[f64; FEATURES]) -> Result<bool> {
        Ok(self.score(row)? > self.threshold)
    }

    /// Continuous anomaly magnitude from the decision margin, in [0, 1].
    pub fn magnitude(&self, row: &[f64; FEATURES]) -> Result<f64> {
        let score = self.score(row)?;
        let span = (1.0 - self.threshold).max(f64::EPSILON);
        Ok(((score - self.threshold) / span).clamp(0.0, 1.0))
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

fn build_tree(
    rows: &[[f64; FEATURES]],
    indices: &[usize],
    depth: usize,
    depth_limit: usize,
    rng: &mut StdRng,
) -> TreeNode {
    if indices.len() <= 1 || depth >= depth_limit {
        return TreeNode::Leaf {
            size: indices.len(),
        };
    }

    let feature = rng.gen_range(0..FEATURES);
    let (min, max) = indices.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &i| {
        let v = rows[i][feature];
        (lo.min(v), hi.max(v))
    });
    if max <= min {
        // Constant along the chosen axis; nothing left to isolate here
        return TreeNode::Leaf {
            size: indices.len(),
        };
    }

    let value = rng.gen_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| rows[i][feature] < value);

    TreeNode::Split {
        feature,
        value,
        left: Box::new(build_tree(rows, &left, depth + 1, depth_limit, rng)),
        right: Box::new(build_tree(rows, &right, depth + 1, depth_limit, rng)),
    }
}

/// Average unsuccessful-search path length c(n) in a binary search tree,
/// used both as the leaf-size correction and the score normalizer.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            // Euler-Mascheroni constant for the harmonic number approximation
            const GAMMA: f64 = 0.577_215_664_901_532_9;
            let n = n as f64;
            let harmonic = (n - 1.0).ln() + GAMMA;
            2.0 * harmonic - 2.0 * (n - 1.0) / n
        }
    }
}
