//! Regression trees over gradient/hessian statistics
//!
//! Trees are grown greedily on first- and second-order loss statistics:
//! leaf weight w* = -G / (H + lambda), split gain
//! 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)], accepted only
//! when it exceeds the complexity penalty gamma.

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Structural growth constraints for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowthParams {
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub reg_lambda: f64,
    pub gamma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum TreeNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn predict(&self, sample: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { weight } => *weight,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grow one tree over the given row and feature subsets.
pub(crate) fn grow_tree(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    rows: &[usize],
    features: &[usize],
    depth: usize,
    params: &GrowthParams,
) -> TreeNode {
    let g_sum: f64 = rows.iter().map(|&i| grad[i]).sum();
    let h_sum: f64 = rows.iter().map(|&i| hess[i]).sum();
    let leaf = TreeNode::Leaf {
        weight: -g_sum / (h_sum + params.reg_lambda),
    };

    if depth >= params.max_depth || rows.len() < 2 || h_sum < params.min_child_weight {
        return leaf;
    }

    // Candidate scan per feature is independent, so scan in parallel.
    let best = features
        .par_iter()
        .filter_map(|&f| best_split_for_feature(x, grad, hess, rows, f, params))
        .max_by(|a, b| {
            a.gain
                .partial_cmp(&b.gain)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    match best {
        Some(split) if split.gain > params.gamma => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&i| x[[i, split.feature]] <= split.threshold);

            if left_rows.is_empty() || right_rows.is_empty() {
                return leaf;
            }

            TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(grow_tree(x, grad, hess, &left_rows, features, depth + 1, params)),
                right: Box::new(grow_tree(x, grad, hess, &right_rows, features, depth + 1, params)),
            }
        }
        _ => leaf,
    }
}

fn best_split_for_feature(
    x: &Array2<f64>,
    grad: &Array1<f64>,
    hess: &Array1<f64>,
    rows: &[usize],
    feature: usize,
    params: &GrowthParams,
) -> Option<SplitCandidate> {
    let mut sorted: Vec<usize> = rows.to_vec();
    sorted.sort_by(|&a, &b| {
        x[[a, feature]]
            .partial_cmp(&x[[b, feature]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let g_total: f64 = sorted.iter().map(|&i| grad[i]).sum();
    let h_total: f64 = sorted.iter().map(|&i| hess[i]).sum();

    let lambda = params.reg_lambda;
    let parent_score = (g_total * g_total) / (h_total + lambda);

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for (pos, &idx) in sorted.iter().enumerate() {
        g_left += grad[idx];
        h_left += hess[idx];

        let Some(&next_idx) = sorted.get(pos + 1) else {
            break;
        };
        // Identical adjacent values cannot be separated by a threshold.
        if (x[[idx, feature]] - x[[next_idx, feature]]).abs() < 1e-12 {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        if h_left < params.min_child_weight || h_right < params.min_child_weight {
            continue;
        }

        let gain = 0.5
            * ((g_left * g_left) / (h_left + lambda) + (g_right * g_right) / (h_right + lambda)
                - parent_score);

        if best.as_ref().map_or(true, |b| gain > b.gain) {
            best = Some(SplitCandidate {
                feature,
                threshold: (x[[idx, feature]] + x[[next_idx, feature]]) / 2.0,
                gain,
            });
        }
    }

    best
}
