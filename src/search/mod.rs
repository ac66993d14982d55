//! Randomized hyperparameter search

pub mod cv;
pub mod random;
pub mod space;

pub use cv::{CvFold, KFold};
pub use random::{RandomizedSearch, SearchConfig, SearchOutcome, TrialRecord, TrialScore};
pub use space::{boosting_search_space, ParamRange, ParamValue, Parameter, SearchSpace, TrialParams};
