//! Decision tree regressor (CART, squared-error impurity)

use super::Estimator;
use crate::error::{HousingError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node.
///
/// Nodes live in one flat vector with the root at index 0; a split refers to
/// its children by position, and children always come after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        impurity: f64,
    },
}

/// Best split found for a node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree nodes, root first
    nodes: Vec<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    /// Seed for the per-split feature subsets
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new regressor tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set the number of features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    #[allow(clippy::too_many_arguments)]
    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<TreeNode>,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let n_samples = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples.max(1) as f64;

        let node_idx = nodes.len();
        nodes.push(TreeNode::Leaf {
            value: mean,
            n_samples,
        });

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, indices);

        if should_stop {
            return node_idx;
        }

        let Some(best) = self.find_best_split(x, y, indices, mean, rng) else {
            return node_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
            return node_idx;
        }

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = self.build_node(x, y, &left_indices, depth + 1, nodes, importances, rng);
        let right = self.build_node(x, y, &right_indices, depth + 1, nodes, importances, rng);

        nodes[node_idx] = TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity: variance(y, indices, mean),
        };
        node_idx
    }

    /// Sweep each candidate feature in sorted order, tracking prefix sums of
    /// the centered target to evaluate every threshold in one pass.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        mean: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        let features: Vec<usize> = if n_try < n_features {
            sample(rng, n_features, n_try).into_vec()
        } else {
            (0..n_features).collect()
        };

        let n = indices.len() as f64;
        let parent_impurity = variance(y, indices, mean);
        let total_sum: f64 = indices.iter().map(|&i| y[i] - mean).sum();
        let total_sq: f64 = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum();

        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(indices.len());

        for feature_idx in features {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (x[[i, feature_idx]], y[i] - mean)));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for pos in 0..pairs.len() - 1 {
                let (value, target) = pairs[pos];
                left_sum += target;
                left_sq += target * target;

                let next_value = pairs[pos + 1].0;
                if value == next_value {
                    continue;
                }

                let left_count = pos + 1;
                let right_count = pairs.len() - left_count;
                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / left_count as f64;
                let right_sse = right_sq - right_sum * right_sum / right_count as f64;

                let gain = parent_impurity - (left_sse + right_sse) / n;
                if gain > best.map_or(0.0, |b| b.gain) {
                    let mut threshold = (value + next_value) / 2.0;
                    if threshold >= next_value {
                        threshold = value;
                    }
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((idx, level)) = stack.pop() {
            depth = depth.max(level);
            if let Some(TreeNode::Split { left, right, .. }) = self.nodes.get(idx) {
                for child in [*left, *right].into_iter().filter(|&c| c > idx) {
                    stack.push((child, level + 1));
                }
            }
        }
        depth
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Number of nodes, splits and leaves together
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn predict_sample(&self, sample: ArrayView1<f64>) -> Result<f64> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value, .. }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                }) => {
                    let value = sample.get(*feature_idx).ok_or_else(|| corrupt_node(idx))?;
                    let next = if *value <= *threshold { *left } else { *right };
                    if next <= idx {
                        return Err(corrupt_node(idx));
                    }
                    idx = next;
                }
                None => return Err(corrupt_node(idx)),
            }
        }
    }
}

fn corrupt_node(idx: usize) -> HousingError {
    HousingError::ComputationError(format!("decision tree node {} has an invalid child link", idx))
}

impl Estimator for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(HousingError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if n_samples == 0 {
            return Err(HousingError::InvalidParameter {
                name: "x".to_string(),
                value: "0 rows".to_string(),
                reason: "need at least one sample".to_string(),
            });
        }

        if self.min_samples_leaf == 0 || self.min_samples_split < 2 {
            return Err(HousingError::InvalidParameter {
                name: "min_samples_leaf / min_samples_split".to_string(),
                value: format!("{} / {}", self.min_samples_leaf, self.min_samples_split),
                reason: "need min_samples_leaf >= 1 and min_samples_split >= 2".to_string(),
            });
        }

        self.n_features = n_features;
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let mut importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        let mut nodes = Vec::new();
        self.build_node(x, y, &indices, 0, &mut nodes, &mut importances, &mut rng);
        self.nodes = nodes;

        // Normalize feature importances
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(HousingError::ModelNotFitted);
        }

        if x.ncols() != self.n_features {
            return Err(HousingError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        x.rows()
            .into_iter()
            .map(|row| self.predict_sample(row))
            .collect::<Result<Array1<f64>>>()
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }

    fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }
}

fn variance(y: &Array1<f64>, indices: &[usize], mean: f64) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>() / indices.len() as f64
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.first() {
        None => true,
        Some(&first) => indices.iter().all(|&i| (y[i] - y[first]).abs() < 1e-10),
    }
}
