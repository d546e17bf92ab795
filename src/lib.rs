//! Villager Enchantment Optimizer
//!
//! Finds the smallest group of trading villagers that still sells every
//! enchantment you need, using an exact minimum set cover search.

pub mod config;
pub mod cover;
pub mod market;
pub mod optimize;
pub mod utils;

pub use config::Settings;
pub use optimize::{OptimizationProblem, Plan};

use anyhow::Result;

/// Main entry point for optimizing a villager catalog
pub fn optimize_villagers(settings: Settings) -> Result<Plan> {
    let problem = OptimizationProblem::new(settings)?;
    let (plan, _) = problem.solve()?;
    Ok(plan)
}
