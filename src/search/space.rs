//! Hyperparameter search space

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Distribution to sample one hyperparameter from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamRange {
    /// Uniform integer in [low, high)
    Int { low: i64, high: i64 },
    /// Uniform float in [low, high)
    Float { low: f64, high: f64 },
}

/// A single named hyperparameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub range: ParamRange,
}

impl Parameter {
    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            range: ParamRange::Int { low, high },
        }
    }

    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            range: ParamRange::Float { low, high },
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match &self.range {
            ParamRange::Int { low, high } => ParamValue::Int(rng.gen_range(*low..*high)),
            ParamRange::Float { low, high } => {
                ParamValue::Float(rng.gen::<f64>() * (high - low) + low)
            }
        }
    }
}

/// Sampled hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) => Some(*v as i64),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v:.4}"),
        }
    }
}

/// One sampled configuration, keyed by parameter name. A BTreeMap keeps
/// reporting and serialization order stable.
pub type TrialParams = BTreeMap<String, ParamValue>;

/// Declarative set of hyperparameter distributions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.parameters.push(Parameter::int(name, low, high));
        self
    }

    pub fn float(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.parameters.push(Parameter::float(name, low, high));
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Sample one configuration; parameters are drawn in declaration
    /// order so a seeded RNG yields a reproducible sequence.
    pub fn sample(&self, rng: &mut impl Rng) -> TrialParams {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.sample(rng)))
            .collect()
    }
}

/// The boosting search space: seven dimensions balancing search breadth
/// against compute cost.
pub fn boosting_search_space() -> SearchSpace {
    SearchSpace::new()
        .int("n_estimators", 300, 1200)
        .int("max_depth", 3, 12)
        .float("learning_rate", 0.005, 0.05)
        .float("subsample", 0.6, 1.0)
        .float("colsample_bytree", 0.5, 0.9)
        .int("min_child_weight", 1, 8)
        .float("gamma", 0.0, 0.3)
}
