//! Regression tree (CART, squared error)
//!
//! Nodes live in a flat arena; node 0 is the root. Splits send
//! `x[feature] <= threshold` to the left child.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 15,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    params: TreeParams,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
        }
    }

    /// Grow the tree on the rows listed in `samples` (duplicates allowed).
    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>, samples: &[usize]) {
        self.nodes.clear();
        let mut idx = samples.to_vec();
        if idx.is_empty() {
            self.nodes.push(Node::Leaf { value: 0.0 });
            return;
        }
        self.grow(x, y, &mut idx, 0);
    }

    fn grow(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        idx: &mut [usize],
        depth: usize,
    ) -> usize {
        let n = idx.len();
        let sum: f64 = idx.iter().map(|&i| y[i]).sum();
        let value = sum / n as f64;

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        let p = &self.params;
        if depth >= p.max_depth || n < p.min_samples_split || n < 2 * p.min_samples_leaf.max(1) {
            return node_id;
        }

        let first = y[idx[0]];
        if idx.iter().all(|&i| y[i] == first) {
            return node_id;
        }

        let Some(best) = self.find_split(x, y, idx, sum) else {
            return node_id;
        };

        // Partition in place: left block first
        let mut boundary = 0;
        for k in 0..n {
            if x[[idx[k], best.feature]] <= best.threshold {
                idx.swap(k, boundary);
                boundary += 1;
            }
        }
        if boundary == 0 || boundary == n {
            return node_id;
        }

        let (left_idx, right_idx) = idx.split_at_mut(boundary);
        let left = self.grow(x, y, left_idx, depth + 1);
        let right = self.grow(x, y, right_idx, depth + 1);

        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }

    fn find_split(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        idx: &[usize],
        total: f64,
    ) -> Option<BestSplit> {
        let n = idx.len();
        let n_features = x.ncols();
        let min_leaf = self.params.min_samples_leaf.max(1);

        // Maximizing sum_l^2/n_l + sum_r^2/n_r minimizes the children's SSE
        let parent_score = total * total / n as f64;
        let mut best: Option<BestSplit> = None;
        let mut order = idx.to_vec();

        for f in 0..n_features {
            order.sort_by(|&a, &b| x[[a, f]].total_cmp(&x[[b, f]]));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += y[order[k - 1]];

                let lo = x[[order[k - 1], f]];
                let hi = x[[order[k], f]];
                if lo >= hi || k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;

                if score > parent_score + 1e-12 && best.as_ref().map_or(true, |b| score > b.score) {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid >= hi { lo } else { mid };
                    best = Some(BestSplit {
                        feature: f,
                        threshold,
                        score,
                    });
                }
            }
        }

        best
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match nodes.get(at) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}
