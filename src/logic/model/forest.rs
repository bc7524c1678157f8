//! Isolation Forest
//!
//! Ensemble of random isolation trees. Anomalies are isolated in fewer
//! splits, so a short average path length means "more anomalous".
//!
//! Score convention: `score_samples` returns `-(2^(-E[h(x)] / c(ψ)))`, a value
//! in `[-1, 0)` where lower is more anomalous. The decision offset is the
//! `contamination` percentile of the training scores.
//!
//! Fitting is fully deterministic for a given `random_state`.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{AnomalyModel, ModelError, ANOMALY_LABEL, NORMAL_LABEL};

/// Euler–Mascheroni constant, for the harmonic number approximation
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Sub-sample cap used by `MaxSamples::Auto`
const AUTO_MAX_SAMPLES: usize = 256;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxSamples {
    /// min(256, n_samples)
    Auto,
    /// Absolute count, capped at n_samples
    Count(usize),
    /// Fraction of n_samples
    Fraction(f64),
}

impl MaxSamples {
    fn resolve(&self, n_samples: usize) -> usize {
        let wanted = match *self {
            MaxSamples::Auto => AUTO_MAX_SAMPLES,
            MaxSamples::Count(count) => count,
            MaxSamples::Fraction(f) => (f * n_samples as f64) as usize,
        };
        wanted.clamp(1, n_samples)
    }
}

/// Hyperparameters, fixed at fit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// Expected fraction of anomalies in the fitting data, (0, 0.5]
    pub contamination: f64,
    pub max_samples: MaxSamples,
    /// Fraction of features drawn per tree, (0, 1]
    pub max_features: f64,
    pub random_state: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            contamination: 0.1,
            max_samples: MaxSamples::Auto,
            max_features: 1.0,
            random_state: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ModelError::InvalidParameter(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if !(self.max_features > 0.0 && self.max_features <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "max_features must be in (0, 1], got {}",
                self.max_features
            )));
        }
        match self.max_samples {
            MaxSamples::Count(0) => Err(ModelError::InvalidParameter(
                "max_samples must be at least 1".to_string(),
            )),
            MaxSamples::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(ModelError::InvalidParameter(
                format!("max_samples fraction must be in (0, 1], got {}", f),
            )),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// Arena-allocated isolation tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(
        x: ArrayView2<f64>,
        rows: Vec<usize>,
        features: &[usize],
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(x, rows, features, 0, max_depth, rng);
        tree
    }

    fn build(
        &mut self,
        x: ArrayView2<f64>,
        rows: Vec<usize>,
        features: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        if depth >= max_depth || rows.len() <= 1 {
            return self.push(Node::Leaf { size: rows.len() });
        }

        let mut candidates = features.to_vec();
        candidates.shuffle(rng);

        for feature in candidates {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = x[[r, feature]];
                (lo.min(v), hi.max(v))
            });
            if hi <= lo {
                continue; // constant on this node
            }

            let threshold = rng.gen_range(lo..hi);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.iter().copied().partition(|&r| x[[r, feature]] <= threshold);

            let id = self.push(Node::Leaf { size: 0 });
            let left = self.build(x, left_rows, features, depth + 1, max_depth, rng);
            let right = self.build(x, right_rows, features, depth + 1, max_depth, rng);
            self.nodes[id] = Node::Split { feature, threshold, left, right };
            return id;
        }

        self.push(Node::Leaf { size: rows.len() })
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { feature, threshold, left, right } => {
                    id = if sample[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points, c(n)
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 100]
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    config: ForestConfig,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    offset: f64,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            sample_size: 0,
            n_features: 0,
            offset: 0.0,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_estimators(&self) -> usize {
        self.config.n_estimators
    }

    pub fn contamination(&self) -> f64 {
        self.config.contamination
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Effective sub-sample size ψ used for each tree
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn score_one(&self, sample: ArrayView1<f64>) -> f64 {
        let mean_depth = self
            .trees
            .iter()
            .map(|tree| tree.path_length(sample))
            .sum::<f64>()
            / self.trees.len() as f64;

        let norm = average_path_length(self.sample_size);
        let ratio = if norm > 0.0 { mean_depth / norm } else { 0.0 };
        -(2f64.powf(-ratio))
    }

    fn check_input(&self, x: &ArrayView2<f64>) -> Result<(), ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        Ok(())
    }
}

impl AnomalyModel for IsolationForest {
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<(), ModelError> {
        self.config.validate()?;

        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(ModelError::EmptyInput);
        }

        let sample_size = self.config.max_samples.resolve(n_samples);
        let features_per_tree =
            ((self.config.max_features * n_features as f64) as usize).clamp(1, n_features);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(self.config.random_state);
        let trees = (0..self.config.n_estimators)
            .map(|_| {
                let rows = index::sample(&mut rng, n_samples, sample_size).into_vec();
                let features = if features_per_tree == n_features {
                    (0..n_features).collect::<Vec<_>>()
                } else {
                    index::sample(&mut rng, n_features, features_per_tree).into_vec()
                };
                IsolationTree::grow(x, rows, &features, max_depth, &mut rng)
            })
            .collect();

        let mut fitted = Self {
            config: self.config.clone(),
            trees,
            sample_size,
            n_features,
            offset: 0.0,
        };
        let train_scores = fitted.score_samples(x)?;
        fitted.offset = percentile(&train_scores.to_vec(), 100.0 * self.config.contamination);

        *self = fitted;
        Ok(())
    }

    fn score_samples(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        self.check_input(&x)?;
        Ok(x.rows().into_iter().map(|row| self.score_one(row)).collect())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<i32>, ModelError> {
        let scores = self.score_samples(x)?;
        Ok(scores.mapv(|s| {
            if s - self.offset < 0.0 { ANOMALY_LABEL } else { NORMAL_LABEL }
        }))
    }

    fn threshold(&self) -> f64 {
        self.offset
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
