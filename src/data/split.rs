//! Stratified train/test splitting

use crate::error::{PhenoError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Disjoint row positions for one target's train and test sets.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Train/test splitter preserving per-group proportions.
#[derive(Debug, Clone)]
pub struct StratifiedSplitter {
    test_fraction: f64,
    seed: u64,
}

impl StratifiedSplitter {
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        Self {
            test_fraction,
            seed,
        }
    }

    /// Split row positions 0..groups.len() so that each group contributes
    /// to the test set in proportion to its size. A group with fewer than
    /// two members cannot be stratified and is a fatal data error.
    pub fn split(&self, groups: &[String]) -> Result<Split> {
        if !(0.0..1.0).contains(&self.test_fraction) || self.test_fraction == 0.0 {
            return Err(PhenoError::InvalidParameter {
                name: "test_fraction".to_string(),
                value: self.test_fraction.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }

        // BTreeMap keeps group iteration order stable across runs.
        let mut by_group: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (pos, name) in groups.iter().enumerate() {
            by_group.entry(name.as_str()).or_default().push(pos);
        }

        for (name, members) in &by_group {
            if members.len() < 2 {
                return Err(PhenoError::DataError(format!(
                    "group '{name}' has {} row(s); at least 2 are required to stratify",
                    members.len()
                )));
            }
        }

        let total = groups.len();
        let test_total = ((total as f64) * self.test_fraction).round() as usize;

        // Largest-remainder allocation of the test quota across groups.
        let mut base: BTreeMap<&str, usize> = BTreeMap::new();
        let mut remainders: Vec<(&str, f64)> = Vec::with_capacity(by_group.len());
        let mut allocated = 0;
        for (name, members) in &by_group {
            let exact = (members.len() as f64) * self.test_fraction;
            let floor = (exact.floor() as usize).min(members.len() - 1);
            base.insert(*name, floor);
            allocated += floor;
            remainders.push((*name, exact - exact.floor()));
        }
        remainders.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        for (name, _) in remainders {
            if allocated >= test_total {
                break;
            }
            let members = by_group[name].len();
            if let Some(count) = base.get_mut(name) {
                if *count < members - 1 {
                    *count += 1;
                    allocated += 1;
                }
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut train = Vec::with_capacity(total);
        let mut test = Vec::with_capacity(test_total);

        for (name, members) in &by_group {
            let mut shuffled = members.clone();
            shuffled.shuffle(&mut rng);
            let take = base[*name];
            test.extend_from_slice(&shuffled[..take]);
            train.extend_from_slice(&shuffled[take..]);
        }

        train.sort_unstable();
        test.sort_unstable();

        Ok(Split { train, test })
    }
}
