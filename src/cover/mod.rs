//! Exact minimum set cover over bitmasks

pub mod error;
pub mod greedy;
pub mod mask;
pub mod solver;

pub use error::CoverError;
pub use greedy::{greedy_cover, GreedyCover};
pub use mask::{build_masks, ItemIndex, Mask, MaskBuilder, MaskSet, MAX_ITEMS};
pub use solver::{CoverOutcome, ExactCoverSolver, SolverStatistics};
