use super::OutlierModel;
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Node of an exported isolation tree. Samples with `x[feature] <= threshold`
/// descend left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForestNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        samples: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    pub nodes: Vec<ForestNode>,
}

impl IsolationTree {
    /// Edge count to the reached leaf plus the expected remaining depth of
    /// the samples that leaf absorbed during training.
    fn path_length(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        let mut depth = 0.0;

        loop {
            match &self.nodes[index] {
                ForestNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    depth += 1.0;
                }
                ForestNode::Leaf { samples } => return depth + average_path_length(*samples),
            }
        }
    }

    pub(crate) fn validate(&self, arity: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let ForestNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= arity {
                    return Err(format!(
                        "node {index} splits on feature {feature} but the model has {arity} features"
                    ));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {index} has a non-finite threshold"));
                }
                for child in [*left, *right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {index} points at invalid child {child}"));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Average unsuccessful-search path length in a binary search tree of `n`
/// samples; normalizes depths across sample sizes.
pub(crate) fn average_path_length(samples: u64) -> f64 {
    match samples {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Inference-only isolation forest loaded from an exported artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForestModel {
    pub(crate) trees: Vec<IsolationTree>,
    pub(crate) max_samples: u64,
    pub(crate) offset: f64,
    pub(crate) arity: usize,
    pub(crate) registry_fingerprint: Option<String>,
}

impl IsolationForestModel {
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Values in `[-1, 0)`; closer to `-1` is more anomalous.
    pub fn score_samples(&self, features: &[f64]) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.path_length(features))
            .sum();
        let mean_depth = total / self.trees.len() as f64;
        -(2f64.powf(-mean_depth / average_path_length(self.max_samples)))
    }
}

impl OutlierModel for IsolationForestModel {
    fn input_arity(&self) -> usize {
        self.arity
    }

    fn predict(&self, features: &[f64]) -> i8 {
        if self.decision_function(features) < 0.0 {
            -1
        } else {
            1
        }
    }

    fn decision_function(&self, features: &[f64]) -> f64 {
        self.score_samples(features) - self.offset
    }

    fn registry_fingerprint(&self) -> Option<&str> {
        self.registry_fingerprint.as_deref()
    }
}
