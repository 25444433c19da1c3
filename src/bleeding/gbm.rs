//! Gradient-boosted regression trees for squared-error loss.
//!
//! Each round fits a depth-limited tree to the current residuals. Features
//! flagged +1 in `monotone` are constrained so the ensemble output never
//! decreases when that feature increases: a candidate split is rejected if
//! its left child would outweigh its right, and children inherit the
//! midpoint of their weights as a bound, so every deeper leaf respects it.

use serde::{Deserialize, Serialize};

use super::{FeatureVector, NUM_FEATURES};

/// Minimum gain a split must achieve.
const MIN_SPLIT_GAIN: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbmParams {
    pub n_rounds: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf weights.
    pub lambda: f64,
    /// Per-feature direction: +1 non-decreasing, -1 non-increasing, 0 free.
    pub monotone: [i8; NUM_FEATURES],
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_rounds: 150,
            max_depth: 4,
            learning_rate: 0.05,
            min_samples_leaf: 10,
            lambda: 1.0,
            // age, inr, anticoagulant, gi_bleed, high_bp, antiplatelet,
            // gender_female, weight, liver_disease
            monotone: [1, 1, 1, 1, 1, 1, 0, 0, 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single tree stored as a flat node array; the root is at index 0 and
/// children always sit at higher indices than their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn predict(&self, x: &FeatureVector) -> f64 {
        let mut idx = 0;
        // The structural check in `validate` guarantees termination; the
        // bound keeps a hand-edited artifact from spinning.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().unwrap_or(0.0);
                    idx = if v < *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
        0.0
    }

    /// Check indices point forward and features are in range.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("node {i}: non-finite leaf"));
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= NUM_FEATURES {
                        return Err(format!("node {i}: feature {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i}: non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i}: bad child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { .. } => {}
            }
        }
        Ok(())
    }
}

/// Additive tree ensemble. Leaf values already include shrinkage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn predict(&self, x: &FeatureVector) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    /// Fit on rows `x` with targets `y`. An empty input yields an ensemble
    /// that predicts 0.
    pub fn fit(x: &[FeatureVector], y: &[f64], params: &GbmParams) -> Self {
        let n = x.len().min(y.len());
        if n == 0 {
            return Self {
                base_score: 0.0,
                trees: Vec::new(),
            };
        }

        let base_score = y[..n].iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];
        let mut trees = Vec::with_capacity(params.n_rounds);

        for _ in 0..params.n_rounds {
            let residuals: Vec<f64> = (0..n).map(|i| y[i] - predictions[i]).collect();
            let mut builder = TreeBuilder {
                x: &x[..n],
                residuals: &residuals,
                params,
                nodes: Vec::new(),
            };
            builder.grow((0..n).collect(), 0, f64::NEG_INFINITY, f64::INFINITY);

            let mut tree = RegressionTree {
                nodes: builder.nodes,
            };
            for node in &mut tree.nodes {
                if let TreeNode::Leaf { value } = node {
                    *value *= params.learning_rate;
                }
            }
            for (i, p) in predictions.iter_mut().enumerate() {
                *p += tree.predict(&x[i]);
            }
            trees.push(tree);
        }

        Self { base_score, trees }
    }
}

struct TreeBuilder<'a> {
    x: &'a [FeatureVector],
    residuals: &'a [f64],
    params: &'a GbmParams,
    nodes: Vec<TreeNode>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_weight: f64,
    right_weight: f64,
}

impl TreeBuilder<'_> {
    /// Grow a subtree over `rows`; returns the index of its root node.
    fn grow(&mut self, rows: Vec<usize>, depth: usize, lower: f64, upper: f64) -> usize {
        let sum: f64 = rows.iter().map(|&i| self.residuals[i]).sum();
        let weight = self.leaf_weight(sum, rows.len(), lower, upper);

        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { value: weight });

        if depth >= self.params.max_depth || rows.len() < 2 * self.params.min_samples_leaf {
            return idx;
        }
        let parent_score = score(sum, rows.len(), weight, self.params.lambda);
        let Some(best) = self.best_split(&rows, lower, upper, parent_score) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.x[i][best.feature] < best.threshold);

        let mid = (best.left_weight + best.right_weight) / 2.0;
        let ((l_lo, l_hi), (r_lo, r_hi)) = match self.params.monotone[best.feature] {
            c if c > 0 => ((lower, mid), (mid, upper)),
            c if c < 0 => ((mid, upper), (lower, mid)),
            _ => ((lower, upper), (lower, upper)),
        };

        let left = self.grow(left_rows, depth + 1, l_lo, l_hi);
        let right = self.grow(right_rows, depth + 1, r_lo, r_hi);
        self.nodes[idx] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(
        &self,
        rows: &[usize],
        lower: f64,
        upper: f64,
        parent_score: f64,
    ) -> Option<Candidate> {
        let min_leaf = self.params.min_samples_leaf.max(1);
        let lambda = self.params.lambda;
        let total: f64 = rows.iter().map(|&i| self.residuals[i]).sum();
        let n = rows.len();
        let mut best: Option<Candidate> = None;

        let mut sorted = rows.to_vec();
        for feature in 0..NUM_FEATURES {
            sorted.sort_unstable_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += self.residuals[sorted[k - 1]];
                let lo_val = self.x[sorted[k - 1]][feature];
                let hi_val = self.x[sorted[k]][feature];
                if k < min_leaf || n - k < min_leaf || lo_val >= hi_val {
                    continue;
                }

                let right_sum = total - left_sum;
                let wl = self.leaf_weight(left_sum, k, lower, upper);
                let wr = self.leaf_weight(right_sum, n - k, lower, upper);
                let direction = self.params.monotone[feature];
                if (direction > 0 && wl > wr) || (direction < 0 && wl < wr) {
                    continue;
                }

                let gain = score(left_sum, k, wl, lambda) + score(right_sum, n - k, wr, lambda)
                    - parent_score;
                if gain > MIN_SPLIT_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Candidate {
                        feature,
                        threshold: (lo_val + hi_val) / 2.0,
                        gain,
                        left_weight: wl,
                        right_weight: wr,
                    });
                }
            }
        }
        best
    }

    fn leaf_weight(&self, sum: f64, count: usize, lower: f64, upper: f64) -> f64 {
        (sum / (count as f64 + self.params.lambda)).clamp(lower, upper)
    }
}

/// Loss reduction achieved by weight `w` on a node with residual sum `g`.
/// Equals `g² / (n + λ)` at the unconstrained optimum.
fn score(g: f64, count: usize, w: f64, lambda: f64) -> f64 {
    2.0 * g * w - (count as f64 + lambda) * w * w
}
